//! Background jobs run next to the subscriptions.

mod expiry_sweep;

pub use expiry_sweep::{run_expiry_sweeper, sweep_expired_accounts};

//! Domain collaborators invoked by the event handlers.

mod directory_client;
mod logic;

pub use directory_client::DirectoryClient;
pub use logic::{AccountLifecycle, AppLifecycle, OrgPropagation};

#[cfg(any(test, feature = "test-utils"))]
pub use logic::{MockAccountLifecycle, MockAppLifecycle, MockOrgPropagation};

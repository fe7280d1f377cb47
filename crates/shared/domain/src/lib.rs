//! Domain layer - Directory event payloads and the collaborator error boundary.
//!
//! This crate contains pure domain types with no infrastructure dependencies.
//! The event consumer decodes broker payloads into these types and forwards
//! them to the directory's domain services.

pub mod account;
pub mod constants;
pub mod error;
pub mod org;

pub use account::{AnonymousAccount, CreateAnonymousAccountEvent, DeleteAnonymousAccountsEvent};
pub use constants::*;
pub use error::{CodedError, ErrorClass, LogicError, LogicResult, RestError};
pub use org::{AppRenamedEvent, IdEvent, IdsEvent, OrgNameChangedEvent, OrgObjectType};

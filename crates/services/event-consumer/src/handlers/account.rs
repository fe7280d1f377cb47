//! Anonymous account handlers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use domain::{AnonymousAccount, CreateAnonymousAccountEvent, DeleteAnonymousAccountsEvent, LogicError, LogicResult};

use super::{drop_invalid, settle, EventHandler};
use crate::classify::should_retry;
use crate::client::AccountLifecycle;
use crate::validation::{
    is_valid_expiry, is_valid_limited_times, is_valid_password, now_nanos, parse_expiry, validate, Field,
    FieldKind, Schema, ValidationError,
};

const CREATE_SCHEMA: Schema = Schema::new(&[
    Field::required("id", FieldKind::String),
    Field::required("password", FieldKind::String),
    Field::required("limited_times", FieldKind::Integer),
    Field::required("expires_at", FieldKind::String),
    Field::optional("type", FieldKind::String),
    Field::optional("verify_mobile", FieldKind::Boolean),
]);

const DELETE_SCHEMA: Schema = Schema::new(&[Field::required("ids", FieldKind::StringArray)]);

/// Creates anonymous (share-link and document) accounts.
pub struct CreateAnonymousAccountHandler {
    accounts: Arc<dyn AccountLifecycle>,
}

impl CreateAnonymousAccountHandler {
    pub fn new(accounts: Arc<dyn AccountLifecycle>) -> Self {
        Self { accounts }
    }
}

/// Apply the checks the schema cannot express and build the domain request.
fn to_account(event: CreateAnonymousAccountEvent, now: i64) -> Result<AnonymousAccount, ValidationError> {
    validate(&event)?;

    if !is_valid_password(&event.password) {
        return Err(ValidationError::invalid("password does not meet the password policy"));
    }

    if !is_valid_limited_times(event.limited_times) {
        return Err(ValidationError::invalid(format!(
            "limited_times must be -1 or at least 1, got {}",
            event.limited_times
        )));
    }

    let expires_at = parse_expiry(&event.expires_at)?;
    if !is_valid_expiry(expires_at, now) {
        return Err(ValidationError::invalid(format!(
            "expires_at {} is in the past",
            event.expires_at
        )));
    }

    let verify_mobile = if event.is_share_link() {
        event
            .verify_mobile
            .ok_or(ValidationError::MissingField("verify_mobile"))?
    } else {
        event.verify_mobile.unwrap_or(false)
    };

    Ok(AnonymousAccount {
        id: event.id,
        password: event.password,
        limited_times: event.limited_times,
        expires_at,
        account_type: event.account_type,
        verify_mobile,
    })
}

#[async_trait]
impl EventHandler for CreateAnonymousAccountHandler {
    fn name(&self) -> &'static str {
        "create-anonymous-account"
    }

    async fn handle(&self, payload: &[u8]) -> LogicResult<()> {
        let event: CreateAnonymousAccountEvent = match CREATE_SCHEMA.decode(payload) {
            Ok(event) => event,
            Err(e) => return drop_invalid(self.name(), e),
        };

        let account = match to_account(event, now_nanos()) {
            Ok(account) => account,
            Err(e) => return drop_invalid(self.name(), e),
        };

        let id = account.id.clone();
        debug!(
            id = %id,
            open = account.is_open(),
            unlimited = account.is_unlimited(),
            never_expires = account.never_expires(),
            "Creating anonymous account"
        );
        let result = self.accounts.create_anonymous_account(account).await;
        if result.is_ok() {
            info!(id = %id, "Anonymous account created");
        }
        settle(self.name(), &id, result)
    }
}

/// Revokes a batch of anonymous accounts.
pub struct DeleteAnonymousAccountsHandler {
    accounts: Arc<dyn AccountLifecycle>,
}

impl DeleteAnonymousAccountsHandler {
    pub fn new(accounts: Arc<dyn AccountLifecycle>) -> Self {
        Self { accounts }
    }
}

#[async_trait]
impl EventHandler for DeleteAnonymousAccountsHandler {
    fn name(&self) -> &'static str {
        "delete-anonymous-accounts"
    }

    /// Each ID is deleted independently. The batch is redelivered if any
    /// deletion failed retryably; deleting an ID twice is harmless.
    async fn handle(&self, payload: &[u8]) -> LogicResult<()> {
        let event: DeleteAnonymousAccountsEvent = match DELETE_SCHEMA.decode_valid(payload) {
            Ok(event) => event,
            Err(e) => return drop_invalid(self.name(), e),
        };

        let mut failed: Vec<&str> = Vec::new();
        let mut redeliver: Option<LogicError> = None;

        for id in &event.ids {
            let Err(e) = self.accounts.delete_anonymous_account(id).await else {
                continue;
            };

            let retryable = should_retry(Some(&e));
            warn!(id = %id, error = %e, retryable, "Failed to delete anonymous account");
            failed.push(id);
            if retryable && redeliver.is_none() {
                redeliver = Some(e);
            }
        }

        if failed.is_empty() {
            info!(count = event.ids.len(), "Anonymous accounts deleted");
            return Ok(());
        }

        match redeliver {
            Some(e) => {
                warn!(failed_ids = ?failed, "Anonymous account deletion incomplete, requesting redelivery");
                Err(e)
            }
            None => {
                error!(failed_ids = ?failed, "Anonymous account deletion failed permanently for some IDs");
                Ok(())
            }
        }
    }
}

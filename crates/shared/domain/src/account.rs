//! Anonymous account event payloads and the domain request they map to.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::constants::{is_share_link_id, NO_EXPIRY, UNLIMITED_TIMES};
use crate::org::validate_ids;

/// Payload of an anonymous account creation event.
#[derive(Clone, Deserialize, Validate)]
pub struct CreateAnonymousAccountEvent {
    #[validate(length(min = 1, message = "id cannot be empty"))]
    pub id: String,
    /// Plain password, empty when the account has none
    pub password: String,
    /// Remaining uses, -1 for unlimited
    pub limited_times: i64,
    /// RFC 3339 expiry, empty for no expiry
    pub expires_at: String,
    #[serde(default, rename = "type")]
    pub account_type: Option<String>,
    /// Only meaningful for share-link accounts
    #[serde(default)]
    pub verify_mobile: Option<bool>,
}

impl CreateAnonymousAccountEvent {
    /// Check if the account is a share-link account
    pub fn is_share_link(&self) -> bool {
        is_share_link_id(&self.id)
    }
}

// Don't expose the password in debug output
impl std::fmt::Debug for CreateAnonymousAccountEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateAnonymousAccountEvent")
            .field("id", &self.id)
            .field("password", &"[REDACTED]")
            .field("limited_times", &self.limited_times)
            .field("expires_at", &self.expires_at)
            .field("account_type", &self.account_type)
            .field("verify_mobile", &self.verify_mobile)
            .finish()
    }
}

/// Payload of an anonymous account revocation event.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DeleteAnonymousAccountsEvent {
    #[validate(custom(function = "validate_ids"))]
    pub ids: Vec<String>,
}

/// Validated anonymous account, ready for the account service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymousAccount {
    pub id: String,
    pub password: String,
    pub limited_times: i64,
    /// Expiry as Unix nanoseconds, 0 for none
    pub expires_at: i64,
    pub account_type: Option<String>,
    pub verify_mobile: bool,
}

impl AnonymousAccount {
    /// Check if the account has no usage limit
    pub fn is_unlimited(&self) -> bool {
        self.limited_times == UNLIMITED_TIMES
    }

    /// Check if the account never expires
    pub fn never_expires(&self) -> bool {
        self.expires_at == NO_EXPIRY
    }

    /// Check if the account has no password
    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

impl std::fmt::Debug for AnonymousAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnonymousAccount")
            .field("id", &self.id)
            .field("password", &"[REDACTED]")
            .field("limited_times", &self.limited_times)
            .field("expires_at", &self.expires_at)
            .field("account_type", &self.account_type)
            .field("verify_mobile", &self.verify_mobile)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_event_deserialize() {
        let event: CreateAnonymousAccountEvent = serde_json::from_str(
            r#"{"id":"zzzz","password":"xxxxzzzzz","limited_times":10,"expires_at":"","type":"document"}"#,
        )
        .unwrap();

        assert_eq!(event.id, "zzzz");
        assert_eq!(event.limited_times, 10);
        assert_eq!(event.account_type.as_deref(), Some("document"));
        assert_eq!(event.verify_mobile, None);
        assert!(!event.is_share_link());
    }

    #[test]
    fn test_create_event_empty_id_fails_validation() {
        let event: CreateAnonymousAccountEvent = serde_json::from_str(
            r#"{"id":"","password":"","limited_times":-1,"expires_at":""}"#,
        )
        .unwrap();

        assert!(event.validate().is_err());
    }

    #[test]
    fn test_delete_event_rejects_empty_id() {
        let event: DeleteAnonymousAccountsEvent = serde_json::from_str(r#"{"ids":["zzz",""]}"#).unwrap();
        assert!(event.validate().is_err());

        let event: DeleteAnonymousAccountsEvent = serde_json::from_str(r#"{"ids":["zzz","zzz"]}"#).unwrap();
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_password() {
        let account = AnonymousAccount {
            id: "zzzz".to_string(),
            password: "secret-pass".to_string(),
            limited_times: UNLIMITED_TIMES,
            expires_at: NO_EXPIRY,
            account_type: None,
            verify_mobile: false,
        };

        let debug = format!("{:?}", account);
        assert!(!debug.contains("secret-pass"));
        assert!(account.is_unlimited());
        assert!(account.never_expires());
    }
}

//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// Anonymous Accounts
// =============================================================================

/// ID prefix reserved for share-link anonymous accounts
pub const SHARE_LINK_ID_PREFIX: &str = "sl";

/// `limited_times` value meaning the account can be used without limit
pub const UNLIMITED_TIMES: i64 = -1;

/// Smallest finite `limited_times` value
pub const MIN_LIMITED_TIMES: i64 = 1;

/// `expires_at` timestamp meaning the account never expires
pub const NO_EXPIRY: i64 = 0;

/// Allowed anonymous account password: 4-100 chars from a restricted charset
pub const PASSWORD_PATTERN: &str = r"^[a-zA-Z0-9~!%#$@\-_.]{4,100}$";

/// Check if an account ID denotes a share-link account
pub fn is_share_link_id(id: &str) -> bool {
    id.starts_with(SHARE_LINK_ID_PREFIX)
}

// =============================================================================
// Org Objects
// =============================================================================

pub const ORG_TYPE_USER: &str = "user";
pub const ORG_TYPE_DEPARTMENT: &str = "department";
pub const ORG_TYPE_GROUP: &str = "group";
pub const ORG_TYPE_CONTACTOR: &str = "contactor";

// =============================================================================
// Error Codes
// =============================================================================

/// Reason segments of dotted error codes that denote a transient fault
pub const TRANSIENT_REASONS: &[&str] = &["InternalServerError", "ServiceUnavailable"];

/// Numeric error codes carry their HTTP status class in the leading digit
pub const NUMERIC_CODE_CLASS_DIVISOR: i64 = 100_000_000;

/// Leading digit of numeric codes that denote a transient fault (5xx)
pub const NUMERIC_CODE_SERVER_CLASS: i64 = 5;

/// Check if a dotted error code reason denotes a transient fault
pub fn is_transient_reason(reason: &str) -> bool {
    TRANSIENT_REASONS.contains(&reason)
}

//! Payload validation shared by every event handler.
//!
//! Structural checks are driven by a declarative [`Schema`] (required and
//! optional fields with their JSON types); semantic checks that a schema
//! cannot express live in the helper functions below.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use validator::Validate;

use domain::{MIN_LIMITED_TIMES, NO_EXPIRY, PASSWORD_PATTERN, UNLIMITED_TIMES};

static PASSWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(PASSWORD_PATTERN).expect("password pattern is a valid regex"));

/// Why a payload was rejected. Every variant is permanent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: FieldKind,
    },

    #[error("{0}")]
    Invalid(String),
}

impl ValidationError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ValidationError::Invalid(msg.into())
    }
}

/// JSON type a field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    /// Whole number fitting in an i64; floats are rejected
    Integer,
    Boolean,
    StringArray,
}

impl FieldKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Integer => value.is_i64(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::StringArray => value
                .as_array()
                .map(|items| items.iter().all(Value::is_string))
                .unwrap_or(false),
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::String => write!(f, "a string"),
            FieldKind::Integer => write!(f, "an integer"),
            FieldKind::Boolean => write!(f, "a boolean"),
            FieldKind::StringArray => write!(f, "an array of strings"),
        }
    }
}

/// One field of a payload schema.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl Field {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// Declarative description of a JSON object payload.
///
/// Unknown fields are ignored. An optional field set to `null` counts as absent.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    fields: &'static [Field],
}

impl Schema {
    pub const fn new(fields: &'static [Field]) -> Self {
        Self { fields }
    }

    /// Check the payload shape and decode it into `T`.
    pub fn decode<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<T, ValidationError> {
        let value: Value = serde_json::from_slice(payload)
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;

        let object = value
            .as_object()
            .ok_or_else(|| ValidationError::Malformed("payload is not a JSON object".to_string()))?;
        self.check(object)?;

        serde_json::from_value(value).map_err(|e| ValidationError::Malformed(e.to_string()))
    }

    /// [`Schema::decode`] followed by the payload's derived `validator` rules.
    pub fn decode_valid<T: DeserializeOwned + Validate>(&self, payload: &[u8]) -> Result<T, ValidationError> {
        let decoded: T = self.decode(payload)?;
        validate(&decoded)?;
        Ok(decoded)
    }

    fn check(&self, object: &Map<String, Value>) -> Result<(), ValidationError> {
        for field in self.fields {
            match object.get(field.name) {
                None => {
                    if field.required {
                        return Err(ValidationError::MissingField(field.name));
                    }
                }
                Some(Value::Null) if !field.required => {}
                Some(value) => {
                    if !field.kind.matches(value) {
                        return Err(ValidationError::WrongType {
                            field: field.name,
                            expected: field.kind,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Run the payload's derived `validator` rules, keeping the first message.
pub fn validate<T: Validate>(value: &T) -> Result<(), ValidationError> {
    value.validate().map_err(|e| {
        let message = e
            .field_errors()
            .values()
            .next()
            .and_then(|errors| errors.first())
            .and_then(|error| error.message.as_ref())
            .map(|msg| msg.to_string())
            .unwrap_or_else(|| "Validation failed".to_string());
        ValidationError::Invalid(message)
    })
}

/// Check an anonymous account password: empty (no password) or 4-100 allowed chars.
pub fn is_valid_password(password: &str) -> bool {
    password.is_empty() || PASSWORD_RE.is_match(password)
}

/// Check a usage limit: -1 (unlimited) or at least 1.
pub fn is_valid_limited_times(limited_times: i64) -> bool {
    limited_times == UNLIMITED_TIMES || limited_times >= MIN_LIMITED_TIMES
}

/// Check an expiry against `now` (both Unix nanoseconds); 0 means no expiry.
pub fn is_valid_expiry(expires_at: i64, now: i64) -> bool {
    expires_at == NO_EXPIRY || expires_at >= now
}

/// Parse an RFC 3339 expiry into Unix nanoseconds. Empty means no expiry.
pub fn parse_expiry(expires_at: &str) -> Result<i64, ValidationError> {
    if expires_at.is_empty() {
        return Ok(NO_EXPIRY);
    }

    let parsed = DateTime::parse_from_rfc3339(expires_at)
        .map_err(|e| ValidationError::invalid(format!("expires_at {:?} is not RFC 3339: {}", expires_at, e)))?;

    parsed
        .with_timezone(&Utc)
        .timestamp_nanos_opt()
        .ok_or_else(|| ValidationError::invalid(format!("expires_at {:?} is out of range", expires_at)))
}

/// Current time as Unix nanoseconds.
pub fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        id: String,
        #[serde(default)]
        count: Option<i64>,
    }

    const SAMPLE: Schema = Schema::new(&[
        Field::required("id", FieldKind::String),
        Field::optional("count", FieldKind::Integer),
        Field::optional("tags", FieldKind::StringArray),
    ]);

    #[test]
    fn test_decode_valid() {
        let sample: Sample = SAMPLE.decode(br#"{"id":"a","count":3,"extra":true}"#).unwrap();
        assert_eq!(sample.id, "a");
        assert_eq!(sample.count, Some(3));
    }

    #[test]
    fn test_decode_optional_null_is_absent() {
        let sample: Sample = SAMPLE.decode(br#"{"id":"a","count":null}"#).unwrap();
        assert_eq!(sample.count, None);
    }

    #[test]
    fn test_decode_rejects_shape_errors() {
        assert!(matches!(
            SAMPLE.decode::<Sample>(b"not json"),
            Err(ValidationError::Malformed(_))
        ));
        assert!(matches!(
            SAMPLE.decode::<Sample>(br#"["id"]"#),
            Err(ValidationError::Malformed(_))
        ));
        assert_eq!(
            SAMPLE.decode::<Sample>(br#"{"count":1}"#).unwrap_err(),
            ValidationError::MissingField("id")
        );
        assert_eq!(
            SAMPLE.decode::<Sample>(br#"{"id":7}"#).unwrap_err(),
            ValidationError::WrongType {
                field: "id",
                expected: FieldKind::String
            }
        );
        assert!(matches!(
            SAMPLE.decode::<Sample>(br#"{"id":"a","count":1.5}"#),
            Err(ValidationError::WrongType { field: "count", .. })
        ));
        assert!(matches!(
            SAMPLE.decode::<Sample>(br#"{"id":"a","tags":["x",1]}"#),
            Err(ValidationError::WrongType { field: "tags", .. })
        ));
        assert!(matches!(
            SAMPLE.decode::<Sample>(br#"{"id":null}"#),
            Err(ValidationError::WrongType { field: "id", .. })
        ));
    }

    #[test]
    fn test_password_policy() {
        assert!(is_valid_password(""));
        assert!(is_valid_password("abcd"));
        assert!(is_valid_password("xxxxzzzzz"));
        assert!(is_valid_password("A1~!%#$@-_."));
        assert!(is_valid_password(&"a".repeat(100)));

        assert!(!is_valid_password("abc"));
        assert!(!is_valid_password(&"a".repeat(101)));
        assert!(!is_valid_password("pass word"));
        assert!(!is_valid_password("pass*word"));
        assert!(!is_valid_password("pässword"));
        assert!(!is_valid_password("abcd\n"));
    }

    #[test]
    fn test_limited_times() {
        assert!(is_valid_limited_times(-1));
        assert!(is_valid_limited_times(1));
        assert!(is_valid_limited_times(i64::MAX));

        assert!(!is_valid_limited_times(0));
        assert!(!is_valid_limited_times(-2));
        assert!(!is_valid_limited_times(i64::MIN));
    }

    #[test]
    fn test_expiry_window() {
        let now = 1_700_000_000_000_000_000;
        assert!(is_valid_expiry(0, now));
        assert!(is_valid_expiry(now, now));
        assert!(is_valid_expiry(now + 1, now));
        assert!(!is_valid_expiry(now - 1, now));
        assert!(!is_valid_expiry(1, now));
    }

    #[test]
    fn test_parse_expiry() {
        assert_eq!(parse_expiry("").unwrap(), 0);
        assert_eq!(parse_expiry("1970-01-01T00:00:01Z").unwrap(), 1_000_000_000);
        assert_eq!(
            parse_expiry("2030-10-02T15:00:00+08:00").unwrap(),
            parse_expiry("2030-10-02T07:00:00Z").unwrap()
        );
        assert!(parse_expiry("2030-10-02").is_err());
        assert!(parse_expiry("tomorrow").is_err());
        assert!(parse_expiry("2300-01-01T00:00:00Z").is_err());
    }
}

//! Retry classification of domain-call errors.
//!
//! The directory reports failures as a dotted-code [`RestError`], a numeric
//! [`CodedError`], or some opaque error. Only the first two say whether the
//! failure is permanent; everything unrecognised is treated as an
//! infrastructure fault and redelivered.

use std::error::Error;

use domain::{CodedError, ErrorClass, LogicError, RestError};

/// Classify an arbitrary error.
///
/// Walks the `source()` chain and uses the first known encoding found.
pub fn error_class(err: &(dyn Error + 'static)) -> ErrorClass {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(rest) = e.downcast_ref::<RestError>() {
            return rest.class();
        }
        if let Some(coded) = e.downcast_ref::<CodedError>() {
            return coded.class();
        }
        current = e.source();
    }

    ErrorClass::Internal
}

/// Decide whether a domain-call outcome should be redelivered.
pub fn should_retry(err: Option<&LogicError>) -> bool {
    match err {
        None => false,
        Some(e) => error_class(&**e).is_retryable(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("connection reset")]
    struct Opaque;

    #[derive(Debug, thiserror::Error)]
    #[error("account service failed")]
    struct Wrapped(#[source] CodedError);

    fn boxed<E: Error + Send + Sync + 'static>(err: E) -> LogicError {
        Box::new(err)
    }

    #[test]
    fn test_none_is_not_retried() {
        assert!(!should_retry(None));
    }

    #[test]
    fn test_dotted_codes() {
        for code in ["Public.InternalServerError", "Public.ServiceUnavailable"] {
            assert!(should_retry(Some(&boxed(RestError::new(code, "x")))), "{}", code);
        }
        for code in [
            "Public.BadRequest",
            "Public.NotFound",
            "Public.Conflict",
            "Public.Forbidden",
            "InternalServerErrorish.Nope",
        ] {
            assert!(!should_retry(Some(&boxed(RestError::new(code, "x")))), "{}", code);
        }
    }

    #[test]
    fn test_numeric_codes() {
        assert!(should_retry(Some(&boxed(CodedError::new(500_000_000, "x")))));
        assert!(should_retry(Some(&boxed(CodedError::new(503_012_001, "x")))));
        assert!(should_retry(Some(&boxed(CodedError::new(599_999_999, "x")))));
        assert!(!should_retry(Some(&boxed(CodedError::new(400_000_000, "x")))));
        assert!(!should_retry(Some(&boxed(CodedError::new(404_019_001, "x")))));
        assert!(!should_retry(Some(&boxed(CodedError::new(600_000_000, "x")))));
        assert!(!should_retry(Some(&boxed(CodedError::new(0, "x")))));
    }

    #[test]
    fn test_opaque_errors_are_retried() {
        assert!(should_retry(Some(&boxed(Opaque))));
        assert!(should_retry(Some(&LogicError::from("plain message"))));
        assert!(should_retry(Some(&boxed(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused"
        )))));
    }

    #[test]
    fn test_encoding_found_in_source_chain() {
        let err = boxed(Wrapped(CodedError::new(404_000_000, "gone")));
        assert_eq!(error_class(&*err), ErrorClass::External);
        assert!(!should_retry(Some(&err)));
    }

    #[test]
    fn test_classification_is_stable() {
        let err = boxed(RestError::new("Public.NotFound", "x"));
        let first = should_retry(Some(&err));
        for _ in 0..10 {
            assert_eq!(should_retry(Some(&err)), first);
        }
    }
}

use std::sync::Arc;

use chrono::{Datelike, TimeZone, Utc};
use domain::{CodedError, LogicError, RestError};
use tokio_test::{assert_err, assert_ok};

use super::*;
use crate::client::{MockAccountLifecycle, MockAppLifecycle, MockOrgPropagation};

fn not_found() -> LogicError {
    Box::new(RestError::new("Public.NotFound", "no such object"))
}

fn server_error() -> LogicError {
    Box::new(CodedError::new(500_000_000, "database down"))
}

fn unavailable() -> LogicError {
    Box::new(RestError::new("Public.ServiceUnavailable", "busy"))
}

fn case(handler: impl EventHandler + 'static, payload: &'static str) -> (Box<dyn EventHandler>, &'static str) {
    (Box::new(handler), payload)
}

/// `<next year>-10-02T15:00:00Z` and the same instant as Unix nanoseconds.
fn next_year_expiry() -> (String, i64) {
    let year = Utc::now().year() + 1;
    let instant = Utc.with_ymd_and_hms(year, 10, 2, 15, 0, 0).unwrap();
    (
        format!("{}-10-02T15:00:00Z", year),
        instant.timestamp_nanos_opt().unwrap(),
    )
}

fn create_payload() -> Vec<u8> {
    serde_json::json!({
        "id": "zzzz",
        "password": "xxxxzzzzz",
        "limited_times": 10,
        "expires_at": next_year_expiry().0,
        "type": "document",
    })
    .to_string()
    .into_bytes()
}

fn create_handler(mock: MockAccountLifecycle) -> CreateAnonymousAccountHandler {
    CreateAnonymousAccountHandler::new(Arc::new(mock))
}

#[tokio::test]
async fn test_create_anonymous_account_success() {
    let (_, expected_expiry) = next_year_expiry();

    let mut mock = MockAccountLifecycle::new();
    mock.expect_create_anonymous_account()
        .times(1)
        .withf(move |account| {
            account.id == "zzzz"
                && account.password == "xxxxzzzzz"
                && account.limited_times == 10
                && account.expires_at == expected_expiry
                && account.account_type.as_deref() == Some("document")
                && !account.verify_mobile
        })
        .returning(|_| Ok(()));

    assert_ok!(create_handler(mock).handle(&create_payload()).await);
}

#[tokio::test]
async fn test_create_anonymous_account_external_error_is_acked() {
    let mut mock = MockAccountLifecycle::new();
    mock.expect_create_anonymous_account()
        .times(1)
        .returning(|_| Err(not_found()));

    assert!(create_handler(mock).handle(&create_payload()).await.is_ok());
}

#[tokio::test]
async fn test_create_anonymous_account_internal_error_is_returned() {
    let mut mock = MockAccountLifecycle::new();
    mock.expect_create_anonymous_account()
        .times(1)
        .returning(|_| Err(server_error()));

    let err = assert_err!(create_handler(mock).handle(&create_payload()).await);
    assert_eq!(err.downcast_ref::<CodedError>().unwrap().code, 500_000_000);
}

#[tokio::test]
async fn test_create_share_link_without_verify_mobile_is_dropped() {
    let payload = serde_json::json!({
        "id": "sl-abc",
        "password": "",
        "limited_times": -1,
        "expires_at": "",
    })
    .to_string();

    // no expectation: any call would panic
    let handler = create_handler(MockAccountLifecycle::new());
    assert!(handler.handle(payload.as_bytes()).await.is_ok());
}

#[tokio::test]
async fn test_create_rejects_past_expiry() {
    let payload = serde_json::json!({
        "id": "zzzz",
        "password": "xxxxzzzzz",
        "limited_times": 10,
        "expires_at": "2001-01-01T00:00:00Z",
    })
    .to_string();

    let handler = create_handler(MockAccountLifecycle::new());
    assert!(handler.handle(payload.as_bytes()).await.is_ok());
}

#[tokio::test]
async fn test_delete_batch_permanent_failures_are_acked() {
    let mut mock = MockAccountLifecycle::new();
    mock.expect_delete_anonymous_account()
        .times(2)
        .withf(|id| id == "zzz")
        .returning(|_| Err(not_found()));

    let handler = DeleteAnonymousAccountsHandler::new(Arc::new(mock));
    assert_ok!(handler.handle(br#"{"ids":["zzz","zzz"]}"#).await);
}

#[tokio::test]
async fn test_delete_batch_retryable_failure_is_returned() {
    let mut mock = MockAccountLifecycle::new();
    mock.expect_delete_anonymous_account()
        .times(3)
        .returning(|id| match id {
            "b" => Err(server_error()),
            "c" => Err(not_found()),
            _ => Ok(()),
        });

    let handler = DeleteAnonymousAccountsHandler::new(Arc::new(mock));
    let err = assert_err!(handler.handle(br#"{"ids":["a","b","c"]}"#).await);
    assert!(err.downcast_ref::<CodedError>().is_some());
}

#[tokio::test]
async fn test_delete_empty_batch_is_acked() {
    let handler = DeleteAnonymousAccountsHandler::new(Arc::new(MockAccountLifecycle::new()));
    assert!(handler.handle(br#"{"ids":[]}"#).await.is_ok());
}

#[tokio::test]
async fn test_user_deleted_opaque_error_is_returned() {
    let mut mock = MockOrgPropagation::new();
    mock.expect_on_user_deleted()
        .times(1)
        .withf(|id| id == "xxxxx")
        .returning(|_| Err(LogicError::from("connection reset by peer")));

    let handler = UserDeletedHandler::new(Arc::new(mock));
    let err = handler.handle(br#"{"id":"xxxxx"}"#).await.unwrap_err();
    assert_eq!(err.to_string(), "connection reset by peer");
}

#[tokio::test]
async fn test_department_deleted_success() {
    let mut mock = MockOrgPropagation::new();
    mock.expect_on_department_deleted()
        .times(1)
        .withf(|id| id == "dept-1")
        .returning(|_| Ok(()));

    let handler = DepartmentDeletedHandler::new(Arc::new(mock));
    assert!(handler.handle(br#"{"id":"dept-1"}"#).await.is_ok());
}

#[tokio::test]
async fn test_org_manager_changed_passes_all_ids() {
    let mut mock = MockOrgPropagation::new();
    mock.expect_on_org_manager_changed()
        .times(1)
        .withf(|ids| ids == ["u1".to_string(), "u2".to_string()])
        .returning(|_| Ok(()));

    let handler = OrgManagerChangedHandler::new(Arc::new(mock));
    assert!(handler.handle(br#"{"ids":["u1","u2"]}"#).await.is_ok());
}

#[tokio::test]
async fn test_org_name_changed_user_is_propagated() {
    let mut mock = MockOrgPropagation::new();
    mock.expect_on_user_renamed()
        .times(1)
        .withf(|id, new_name| id == "u1" && new_name == "Alice")
        .returning(|_, _| Ok(()));

    let handler = OrgNameChangedHandler::new(Arc::new(mock));
    let payload = br#"{"id":"u1","new_name":"Alice","type":"user"}"#;
    assert!(handler.handle(payload).await.is_ok());
}

#[tokio::test]
async fn test_org_name_changed_other_types_are_ignored() {
    let handler = OrgNameChangedHandler::new(Arc::new(MockOrgPropagation::new()));

    for object_type in ["department", "group", "contactor", "something-new"] {
        let payload = serde_json::json!({"id": "o1", "new_name": "Sales", "type": object_type}).to_string();
        assert!(handler.handle(payload.as_bytes()).await.is_ok(), "{}", object_type);
    }
}

#[tokio::test]
async fn test_delete_app_success() {
    let mut mock = MockAppLifecycle::new();
    mock.expect_delete_app()
        .times(1)
        .withf(|id| id == "app-1")
        .returning(|_| Ok(()));

    let handler = DeleteAppHandler::new(Arc::new(mock));
    assert!(handler.handle(br#"{"id":"app-1"}"#).await.is_ok());
}

#[tokio::test]
async fn test_rename_app_retryable_error_is_returned() {
    let mut mock = MockAppLifecycle::new();
    mock.expect_rename_app()
        .times(1)
        .withf(|id, new_name| id == "app-1" && new_name == "Reports")
        .returning(|_, _| Err(unavailable()));

    let handler = RenameAppHandler::new(Arc::new(mock));
    let payload = br#"{"id":"app-1","new_name":"Reports"}"#;
    assert!(handler.handle(payload).await.is_err());
}

#[tokio::test]
async fn test_invalid_payloads_are_dropped_on_every_topic() {
    let accounts = Arc::new(MockAccountLifecycle::new());
    let apps = Arc::new(MockAppLifecycle::new());
    let org = Arc::new(MockOrgPropagation::new());

    let cases = vec![
        case(
            CreateAnonymousAccountHandler::new(accounts.clone()),
            r#"{"id":1,"password":"xxxxzzzzz","limited_times":10,"expires_at":""}"#,
        ),
        case(
            CreateAnonymousAccountHandler::new(accounts.clone()),
            r#"{"id":"zzzz","password":"xxxxzzzzz","limited_times":"10","expires_at":""}"#,
        ),
        case(
            CreateAnonymousAccountHandler::new(accounts.clone()),
            r#"{"id":"zzzz","password":"xxxxzzzzz","limited_times":1.5,"expires_at":""}"#,
        ),
        case(DeleteAnonymousAccountsHandler::new(accounts.clone()), r#"{"ids":"zzz"}"#),
        case(DeleteAppHandler::new(apps.clone()), r#"{"id":1}"#),
        case(RenameAppHandler::new(apps.clone()), r#"{"id":"app-1","new_name":2}"#),
        case(UserDeletedHandler::new(org.clone()), r#"{"id":true}"#),
        case(DepartmentDeletedHandler::new(org.clone()), r#"{"id":[]}"#),
        case(OrgManagerChangedHandler::new(org.clone()), r#"{"ids":[1,2]}"#),
        case(
            OrgNameChangedHandler::new(org.clone()),
            r#"{"id":"u1","new_name":"Alice","type":1}"#,
        ),
        case(DeleteAnonymousAccountsHandler::new(accounts.clone()), r#"{"ids":["zzz",""]}"#),
        case(OrgManagerChangedHandler::new(org.clone()), r#"{"ids":["",""]}"#),
        case(UserDeletedHandler::new(org.clone()), "not json"),
        case(UserDeletedHandler::new(org.clone()), r#"{"id":""}"#),
    ];

    for (handler, payload) in cases {
        assert!(
            handler.handle(payload.as_bytes()).await.is_ok(),
            "{} should drop {}",
            handler.name(),
            payload
        );
    }
}

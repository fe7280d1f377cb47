//! gRPC client for the directory's domain service.

use std::time::Duration;

use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};
use tracing::debug;

use common::{AppResult, GrpcClientConfig};
use domain::{AnonymousAccount, CodedError, LogicError, LogicResult, RestError};
use proto::directory::{CreateAnonymousAccountRequest, DeleteExpiredRequest, IdRequest, IdsRequest, RenameRequest};
use proto::DirectoryLogicClient;

use super::logic::{AccountLifecycle, AppLifecycle, OrgPropagation};

/// Metadata key the directory uses to report its precise error code.
const ERROR_CODE_METADATA: &str = "x-error-code";

/// gRPC client wrapper for the directory service.
#[derive(Clone)]
pub struct DirectoryClient {
    client: DirectoryLogicClient<Channel>,
}

impl DirectoryClient {
    /// Build a client whose connection is established on first use.
    ///
    /// The consumer must start even while the directory is down; calls made
    /// before it is reachable fail as unavailable and are redelivered.
    pub fn connect_lazy(config: &GrpcClientConfig) -> AppResult<Self> {
        debug!("Configuring directory client for {}", config.endpoint);
        let channel = Endpoint::from_shared(config.endpoint.clone())?
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .connect_lazy();

        Ok(Self {
            client: DirectoryLogicClient::new(channel),
        })
    }
}

#[async_trait]
impl AccountLifecycle for DirectoryClient {
    async fn create_anonymous_account(&self, account: AnonymousAccount) -> LogicResult<()> {
        let request = tonic::Request::new(CreateAnonymousAccountRequest {
            id: account.id,
            password: account.password,
            limited_times: account.limited_times,
            expires_at: account.expires_at,
            r#type: account.account_type,
            verify_mobile: account.verify_mobile,
        });

        let mut client = self.client.clone();
        client
            .create_anonymous_account(request)
            .await
            .map_err(status_to_error)?;
        Ok(())
    }

    async fn delete_anonymous_account(&self, id: &str) -> LogicResult<()> {
        let request = tonic::Request::new(IdRequest { id: id.to_string() });

        let mut client = self.client.clone();
        client
            .delete_anonymous_account(request)
            .await
            .map_err(status_to_error)?;
        Ok(())
    }

    async fn delete_expired_anonymous_accounts(&self, now: i64) -> LogicResult<u64> {
        let request = tonic::Request::new(DeleteExpiredRequest { now });

        let mut client = self.client.clone();
        let response = client
            .delete_expired_anonymous_accounts(request)
            .await
            .map_err(status_to_error)?;
        Ok(response.into_inner().deleted)
    }
}

#[async_trait]
impl AppLifecycle for DirectoryClient {
    async fn delete_app(&self, id: &str) -> LogicResult<()> {
        let request = tonic::Request::new(IdRequest { id: id.to_string() });

        let mut client = self.client.clone();
        client.delete_app(request).await.map_err(status_to_error)?;
        Ok(())
    }

    async fn rename_app(&self, id: &str, new_name: &str) -> LogicResult<()> {
        let request = tonic::Request::new(RenameRequest {
            id: id.to_string(),
            new_name: new_name.to_string(),
        });

        let mut client = self.client.clone();
        client.rename_app(request).await.map_err(status_to_error)?;
        Ok(())
    }
}

#[async_trait]
impl OrgPropagation for DirectoryClient {
    async fn on_user_deleted(&self, id: &str) -> LogicResult<()> {
        let request = tonic::Request::new(IdRequest { id: id.to_string() });

        let mut client = self.client.clone();
        client.on_user_deleted(request).await.map_err(status_to_error)?;
        Ok(())
    }

    async fn on_department_deleted(&self, id: &str) -> LogicResult<()> {
        let request = tonic::Request::new(IdRequest { id: id.to_string() });

        let mut client = self.client.clone();
        client
            .on_department_deleted(request)
            .await
            .map_err(status_to_error)?;
        Ok(())
    }

    async fn on_org_manager_changed(&self, ids: &[String]) -> LogicResult<()> {
        let request = tonic::Request::new(IdsRequest { ids: ids.to_vec() });

        let mut client = self.client.clone();
        client
            .on_org_manager_changed(request)
            .await
            .map_err(status_to_error)?;
        Ok(())
    }

    async fn on_user_renamed(&self, id: &str, new_name: &str) -> LogicResult<()> {
        let request = tonic::Request::new(RenameRequest {
            id: id.to_string(),
            new_name: new_name.to_string(),
        });

        let mut client = self.client.clone();
        client.on_user_renamed(request).await.map_err(status_to_error)?;
        Ok(())
    }
}

/// Convert a gRPC status into the directory's error encodings.
///
/// An explicit `x-error-code` wins: numeric codes become [`CodedError`],
/// anything else a dotted [`RestError`]. Without one the gRPC code is mapped
/// onto the equivalent `Public.*` REST code.
fn status_to_error(status: Status) -> LogicError {
    let explicit = status
        .metadata()
        .get(ERROR_CODE_METADATA)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string);

    match explicit {
        Some(code) => match code.parse::<i64>() {
            Ok(numeric) => Box::new(CodedError::new(numeric, status.message())),
            Err(_) => Box::new(RestError::new(code, status.message())),
        },
        None => Box::new(
            RestError::new(rest_code_for(status.code()), status.message())
                .with_detail(serde_json::json!({ "grpc_code": status.code() as i32 })),
        ),
    }
}

fn rest_code_for(code: Code) -> &'static str {
    match code {
        Code::InvalidArgument | Code::OutOfRange | Code::FailedPrecondition => "Public.BadRequest",
        Code::NotFound => "Public.NotFound",
        Code::AlreadyExists => "Public.Conflict",
        Code::PermissionDenied => "Public.Forbidden",
        Code::Unauthenticated => "Public.Unauthorized",
        Code::Unavailable | Code::ResourceExhausted | Code::DeadlineExceeded | Code::Aborted => {
            "Public.ServiceUnavailable"
        }
        _ => "Public.InternalServerError",
    }
}

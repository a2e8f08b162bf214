use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::refresh::{RefreshCoordinator, REFRESH_PATH};
use super::transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};
use super::Timeouts;
use crate::auth::CredentialStore;
use crate::config::Config;
use crate::error::Result;
use crate::session::Navigator;

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";

/// Auth endpoints never go through 401 interception; a failed login must
/// not trigger a refresh, and a failed refresh must not trigger another.
pub fn is_exempt(path: &str) -> bool {
    [LOGIN_PATH, REGISTER_PATH, REFRESH_PATH]
        .iter()
        .any(|p| path.contains(p))
}

/// Authenticated gateway to the bots API.
///
/// Every request carries the stored access token. A 401 on a protected
/// endpoint is recovered once through the `RefreshCoordinator`.
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    coordinator: RefreshCoordinator,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
        timeouts: Timeouts,
    ) -> Self {
        let coordinator = RefreshCoordinator::new(
            transport.clone(),
            store.clone(),
            navigator,
            timeouts.refresh,
        );
        Self {
            transport,
            store,
            coordinator,
            timeout: timeouts.request,
        }
    }

    /// Client over HTTP for the configured base URL
    pub fn from_config(
        config: &Config,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.api_base_url.as_str())?);
        Ok(Self::new(transport, store, navigator, config.timeouts()))
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Send `request`, replaying it once with a refreshed token on 401.
    pub async fn execute(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        request.bearer = self.store.access_token();
        let response = self.transport.send(&request, self.timeout).await?;

        if response.is_success() || !response.is_unauthorized() || is_exempt(&request.path) {
            return response.error_for_status();
        }
        if request.retried {
            debug!("{} {} rejected again after retry", request.method, request.path);
            return response.error_for_status();
        }

        let token = self.coordinator.fresh_token(request.bearer.as_deref()).await?;
        request.bearer = Some(token);
        request.retried = true;

        debug!("Replaying {} {} with refreshed token", request.method, request.path);
        self.transport
            .send(&request, self.timeout)
            .await?
            .error_for_status()
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(ApiRequest::get(path)).await?.json()
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.execute(ApiRequest::post(path, body)?).await?.json()
    }

    pub async fn put_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.execute(ApiRequest::put(path, body)?).await?.json()
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(ApiRequest::delete(path)).await?;
        Ok(())
    }
}

pub mod client;
pub mod refresh;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

use std::time::Duration;

pub use client::ApiClient;
pub use refresh::RefreshCoordinator;
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timeouts {
    /// Ordinary API calls
    pub request: Duration,
    /// The `/auth/refresh` exchange
    pub refresh: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request: DEFAULT_REQUEST_TIMEOUT,
            refresh: DEFAULT_REFRESH_TIMEOUT,
        }
    }
}

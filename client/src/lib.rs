//! Client for the grid bot API.
//!
//! `ApiClient` attaches the stored access token to every call and, when the
//! API answers 401, runs a single shared token refresh before replaying the
//! request. `AuthApi` and `BotsApi` are thin typed wrappers over it.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod stats;
pub mod types;

pub use api::{AuthApi, BotsApi};
pub use auth::{CookieJarStore, CredentialStore, MemoryStore};
pub use config::Config;
pub use error::{ApiError, Result};
pub use http::{ApiClient, RefreshCoordinator, Timeouts};
pub use session::{Navigator, RouteWatch};
pub use stats::StatsSummary;

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{ApiError, Result};
use crate::http::client::{LOGIN_PATH, REGISTER_PATH};
use crate::http::ApiClient;
use crate::session::View;
use crate::types::{Credentials, TokenData, User};

/// Login, registration and logout against `/auth/*`
pub struct AuthApi {
    client: Arc<ApiClient>,
}

impl AuthApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<User> {
        let tokens: TokenData = self.client.post_json(LOGIN_PATH, credentials).await?;
        self.start_session(&tokens)?;
        info!("Logged in as {}", credentials.username);
        Ok(session_user(credentials))
    }

    pub async fn register(&self, credentials: &Credentials) -> Result<User> {
        let tokens: TokenData = self.client.post_json(REGISTER_PATH, credentials).await?;
        self.start_session(&tokens)?;
        info!("Registered {}", credentials.username);
        Ok(session_user(credentials))
    }

    /// Drop both credentials. Purely local; the API has no logout endpoint.
    pub fn logout(&self) -> Result<()> {
        self.client.store().clear()?;
        info!("Logged out");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.store().has_tokens()
    }

    /// Gate for commands that need a session
    pub fn require_session(&self) -> Result<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(ApiError::NotAuthenticated)
        }
    }

    /// Route guard: protected views need a stored session, auth views never do.
    pub fn guard(&self, view: View) -> Result<()> {
        if view.is_protected() {
            self.require_session()
        } else {
            Ok(())
        }
    }

    /// Replace whatever session was stored with the new pair
    fn start_session(&self, tokens: &TokenData) -> Result<()> {
        let store = self.client.store();
        store
            .clear()
            .and_then(|()| store.save(tokens))
            .map_err(|e| {
                warn!("Failed to save tokens: {e}");
                ApiError::Storage(format!("Failed to save tokens: {e}"))
            })
    }
}

/// The token endpoints return no profile; the id stays empty until the API grows one.
fn session_user(credentials: &Credentials) -> User {
    User {
        id: String::new(),
        username: credentials.username.clone(),
    }
}

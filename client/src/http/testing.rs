//! In-memory stand-in for the remote API, shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::transport::{ApiRequest, ApiResponse, Transport};
use crate::error::Result;
use crate::types::TokenData;

enum RefreshBehavior {
    Issue(TokenData),
    Reject(u16),
}

pub(crate) struct FakeApi {
    valid_token: Mutex<String>,
    refresh: RefreshBehavior,
    login: Option<TokenData>,
    gate: Option<Notify>,
    reject_all: bool,
    routes: HashMap<String, serde_json::Value>,
    log: Mutex<Vec<ApiRequest>>,
    refresh_calls: AtomicUsize,
}

impl FakeApi {
    /// Protected routes accept `valid_token`; refresh is rejected until configured.
    pub fn new(valid_token: &str) -> Self {
        Self {
            valid_token: Mutex::new(valid_token.to_string()),
            refresh: RefreshBehavior::Reject(401),
            login: None,
            gate: None,
            reject_all: false,
            routes: HashMap::new(),
            log: Mutex::new(Vec::new()),
            refresh_calls: AtomicUsize::new(0),
        }
    }

    pub fn refreshing_to(mut self, access: &str, refresh: Option<&str>) -> Self {
        self.refresh = RefreshBehavior::Issue(TokenData::new(access, refresh));
        self
    }

    pub fn refresh_rejected(mut self, status: u16) -> Self {
        self.refresh = RefreshBehavior::Reject(status);
        self
    }

    pub fn accepting_login(mut self, access: &str, refresh: Option<&str>) -> Self {
        self.login = Some(TokenData::new(access, refresh));
        self
    }

    /// Hold every refresh exchange until `release_refresh` is called
    pub fn gated(mut self) -> Self {
        self.gate = Some(Notify::new());
        self
    }

    /// Protected routes answer 401 no matter the token
    pub fn rejecting_all(mut self) -> Self {
        self.reject_all = true;
        self
    }

    pub fn serving(mut self, path: &str, body: serde_json::Value) -> Self {
        self.routes.insert(path.to_string(), body);
        self
    }

    pub fn release_refresh(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.log.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }
}

fn message(status: u16, text: &str) -> ApiResponse {
    ApiResponse::new(status, serde_json::json!({ "message": text }).to_string())
}

#[async_trait]
impl Transport for FakeApi {
    async fn send(&self, request: &ApiRequest, _timeout: Duration) -> Result<ApiResponse> {
        self.log.lock().unwrap().push(request.clone());

        match request.path.as_str() {
            "/auth/refresh" => {
                self.refresh_calls.fetch_add(1, Ordering::SeqCst);
                if let Some(gate) = &self.gate {
                    gate.notified().await;
                }
                match &self.refresh {
                    RefreshBehavior::Issue(tokens) => {
                        *self.valid_token.lock().unwrap() = tokens.access_token.clone();
                        Ok(ApiResponse::new(200, serde_json::to_vec(tokens)?))
                    }
                    RefreshBehavior::Reject(status) => Ok(message(*status, "Invalid refresh token")),
                }
            }
            "/auth/login" | "/auth/register" => match &self.login {
                Some(tokens) => Ok(ApiResponse::new(200, serde_json::to_vec(tokens)?)),
                None => Ok(message(401, "Invalid credentials")),
            },
            path => {
                let valid = self.valid_token.lock().unwrap().clone();
                if self.reject_all || request.bearer.as_deref() != Some(valid.as_str()) {
                    return Ok(message(401, "Token expired"));
                }
                let body = self
                    .routes
                    .get(path)
                    .cloned()
                    .unwrap_or_else(|| serde_json::json!({ "path": path }));
                Ok(ApiResponse::new(200, body.to_string()))
            }
        }
    }
}

//! Single-flight access token refresh.
//!
//! The first request to hit a 401 becomes the leader and performs the one
//! `/auth/refresh` exchange. Requests that hit a 401 while it is in flight
//! park a oneshot sender in the queue and are woken, in arrival order, with
//! the leader's outcome.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use super::transport::{ApiRequest, Transport};
use crate::auth::CredentialStore;
use crate::error::{ApiError, Result};
use crate::session::Navigator;
use crate::types::{RefreshRequest, TokenData};

pub const REFRESH_PATH: &str = "/auth/refresh";

type Waiter = oneshot::Sender<Result<String>>;

#[derive(Default)]
struct State {
    refreshing: bool,
    waiters: VecDeque<Waiter>,
}

enum Role {
    /// Store already holds a newer token than the request was sent with
    Current(String),
    Follower(oneshot::Receiver<Result<String>>),
    Leader,
}

pub struct RefreshCoordinator {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
    timeout: Duration,
    state: Mutex<State>,
    exchanges: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            store,
            navigator,
            timeout,
            state: Mutex::new(State::default()),
            exchanges: AtomicU64::new(0),
        }
    }

    /// Obtain an access token to replay a request that was rejected with 401.
    ///
    /// `sent_with` is the token the rejected request carried. Joins an
    /// in-flight refresh if there is one, otherwise starts it.
    pub async fn fresh_token(&self, sent_with: Option<&str>) -> Result<String> {
        let role = {
            let mut state = self.lock();
            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                debug!("Refresh in flight, {} request(s) queued", state.waiters.len());
                Role::Follower(rx)
            } else {
                match self.store.access_token() {
                    Some(current) if sent_with != Some(current.as_str()) => Role::Current(current),
                    _ => {
                        state.refreshing = true;
                        Role::Leader
                    }
                }
            }
        };

        match role {
            Role::Current(token) => {
                debug!("Token already rotated since dispatch, skipping refresh");
                Ok(token)
            }
            Role::Follower(rx) => rx.await.unwrap_or(Err(ApiError::RefreshAborted)),
            Role::Leader => self.lead().await,
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().refreshing
    }

    /// Requests currently parked behind the in-flight refresh
    pub fn queued(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Refresh exchanges started since creation
    pub fn exchanges(&self) -> u64 {
        self.exchanges.load(Ordering::Relaxed)
    }

    async fn lead(&self) -> Result<String> {
        let mut flight = InFlight {
            coordinator: self,
            settled: false,
        };
        self.exchanges.fetch_add(1, Ordering::Relaxed);

        let outcome = self.exchange().await;

        if let Err(e) = &outcome {
            warn!("Token refresh failed: {e}");
            if let Err(clear_err) = self.store.clear() {
                error!("Failed to clear credentials after refresh failure: {clear_err}");
            }
        }

        flight.settle(&outcome);

        if outcome.is_err() {
            self.navigator.redirect_to_login();
        }
        outcome
    }

    async fn exchange(&self) -> Result<String> {
        let refresh_token = self.store.refresh_token().ok_or(ApiError::NoRefreshToken)?;

        info!("Refreshing tokens...");
        let request = ApiRequest::post(REFRESH_PATH, &RefreshRequest { refresh_token })?;
        let tokens: TokenData = self
            .transport
            .send(&request, self.timeout)
            .await?
            .error_for_status()?
            .json()?;

        self.store.save(&tokens)?;
        info!("Tokens refreshed successfully");
        Ok(tokens.access_token)
    }

    /// Clear the in-progress flag and drain the queue in one step, so no
    /// request can enqueue behind a refresh that has already settled.
    fn settle(&self, outcome: &Result<String>) {
        let waiters = {
            let mut state = self.lock();
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };

        if !waiters.is_empty() {
            debug!("Releasing {} queued request(s)", waiters.len());
        }
        for waiter in waiters {
            // Receiver gone means the caller stopped waiting
            let _ = waiter.send(outcome.clone());
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Settles the coordinator even if the leading future is dropped mid-exchange.
struct InFlight<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(&mut self, outcome: &Result<String>) {
        self.settled = true;
        self.coordinator.settle(outcome);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Token refresh dropped before completion");
            self.coordinator.settle(&Err(ApiError::RefreshAborted));
        }
    }
}

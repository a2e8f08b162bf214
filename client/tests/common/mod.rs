//! In-process mock of the bots API, served by axum on an ephemeral port.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use gridbot_client::http::transport::ReqwestTransport;
use gridbot_client::{ApiClient, CredentialStore, Navigator, Timeouts};

pub struct MockState {
    /// Access token currently accepted on protected routes
    pub valid_token: String,
    pub refresh_token: String,
    /// Pair handed out by the next successful refresh
    pub next_access: String,
    pub next_refresh: String,
    pub refresh_ok: bool,
    /// Whether protected routes accept the token a refresh hands out
    pub accept_refreshed: bool,
    pub refresh_delay: Duration,
    pub refresh_calls: usize,
    pub password: String,
    pub bots: Vec<Value>,
    /// (method, path, bearer) for every request that reached a protected route
    pub seen: Vec<(String, String, Option<String>)>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            valid_token: "T1".into(),
            refresh_token: "R1".into(),
            next_access: "T2".into(),
            next_refresh: "R2".into(),
            refresh_ok: true,
            accept_refreshed: true,
            refresh_delay: Duration::from_millis(150),
            refresh_calls: 0,
            password: "password".into(),
            bots: Vec::new(),
            seen: Vec::new(),
        }
    }
}

pub type Shared = Arc<Mutex<MockState>>;

pub struct MockApi {
    pub base_url: String,
    pub state: Shared,
}

impl MockApi {
    pub async fn start(state: MockState) -> Self {
        let state = Arc::new(Mutex::new(state));
        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(login))
            .route("/api/auth/refresh", post(refresh))
            .route("/api/bots", get(list_bots).post(create_bot).put(update_bot))
            .route("/api/bots/statistics", get(statistics))
            .route("/api/bots/:id", delete(delete_bot))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/api"),
            state,
        }
    }

    pub fn client(
        &self,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
        timeouts: Timeouts,
    ) -> ApiClient {
        let transport = Arc::new(ReqwestTransport::new(&self.base_url).unwrap());
        ApiClient::new(transport, store, navigator, timeouts)
    }

    /// Invalidate the current access token, as if it had expired
    pub fn expire_access_token(&self) {
        self.state.lock().unwrap().valid_token = "expired".into();
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.lock().unwrap().refresh_calls
    }

    /// (method, path) of every request that reached a protected route
    pub fn calls(&self) -> Vec<(String, String)> {
        self.state
            .lock()
            .unwrap()
            .seen
            .iter()
            .map(|(m, p, _)| (m.clone(), p.clone()))
            .collect()
    }

    pub fn bearers_for(&self, path: &str) -> Vec<Option<String>> {
        self.state
            .lock()
            .unwrap()
            .seen
            .iter()
            .filter(|(_, p, _)| p == path)
            .map(|(_, _, b)| b.clone())
            .collect()
    }
}

pub fn bot(id: &str, public: bool) -> Value {
    json!({
        "id": id,
        "name": format!("Grid {id}"),
        "status": "ACTIVE",
        "symbol": "BTCUSDT",
        "deposit": 1000.0,
        "profit_percentage": 0.5,
        "num_orders": 10,
        "grid_length": 5.0,
        "isPublic": public
    })
}

// ── Handlers ──

type Reply = (StatusCode, Json<Value>);

fn unauthorized(message: &str) -> Reply {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": message, "statusCode": 401 })),
    )
}

fn authorize(state: &Shared, headers: &HeaderMap, method: &str, path: &str) -> Result<(), Reply> {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    let mut s = state.lock().unwrap();
    s.seen.push((method.into(), path.into(), bearer.clone()));
    if bearer.as_deref() == Some(s.valid_token.as_str()) {
        Ok(())
    } else {
        Err(unauthorized("Token expired"))
    }
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let s = state.lock().unwrap();
    if body["password"] != s.password.as_str() {
        return unauthorized("Invalid credentials");
    }
    (
        StatusCode::OK,
        Json(json!({
            "access_token": s.valid_token,
            "refresh_token": s.refresh_token,
            "token_type": "Bearer"
        })),
    )
}

async fn refresh(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let delay = {
        let mut s = state.lock().unwrap();
        s.refresh_calls += 1;
        s.refresh_delay
    };
    tokio::time::sleep(delay).await;

    let mut s = state.lock().unwrap();
    if !s.refresh_ok || body["refresh_token"] != s.refresh_token.as_str() {
        return unauthorized("Invalid refresh token");
    }
    if s.accept_refreshed {
        s.valid_token = s.next_access.clone();
    }
    s.refresh_token = s.next_refresh.clone();
    (
        StatusCode::OK,
        Json(json!({
            "access_token": s.next_access,
            "refresh_token": s.refresh_token
        })),
    )
}

async fn list_bots(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    if let Err(reply) = authorize(&state, &headers, "GET", "/bots") {
        return reply;
    }
    let s = state.lock().unwrap();
    (StatusCode::OK, Json(Value::Array(s.bots.clone())))
}

async fn create_bot(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    if let Err(reply) = authorize(&state, &headers, "POST", "/bots") {
        return reply;
    }
    let mut s = state.lock().unwrap();
    let mut created = body;
    created["id"] = json!(format!("bot-{}", s.bots.len() + 1));
    created["status"] = json!("ACTIVE");
    created["isPublic"] = json!(false);
    s.bots.push(created.clone());
    (StatusCode::CREATED, Json(created))
}

async fn update_bot(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    if let Err(reply) = authorize(&state, &headers, "PUT", "/bots") {
        return reply;
    }
    let mut s = state.lock().unwrap();
    let Some(existing) = s.bots.iter_mut().find(|b| b["id"] == body["id"]) else {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "Bot not found" })));
    };
    if let (Some(target), Some(fields)) = (existing.as_object_mut(), body.as_object()) {
        for (k, v) in fields {
            target.insert(k.clone(), v.clone());
        }
    }
    (StatusCode::OK, Json(existing.clone()))
}

async fn delete_bot(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    let path = format!("/bots/{id}");
    if let Err(reply) = authorize(&state, &headers, "DELETE", &path) {
        return reply;
    }
    let mut s = state.lock().unwrap();
    let before = s.bots.len();
    s.bots.retain(|b| b["id"] != id.as_str());
    if s.bots.len() == before {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "Bot not found" })));
    }
    (StatusCode::OK, Json(json!({ "deleted": id })))
}

async fn statistics(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    if let Err(reply) = authorize(&state, &headers, "GET", "/bots/statistics") {
        return reply;
    }
    let s = state.lock().unwrap();
    let stats: Vec<Value> = s
        .bots
        .iter()
        .map(|b| {
            json!({
                "id": b["id"],
                "name": b["name"],
                "symbol": b["symbol"],
                "cycles_completed": 4,
                "deposit_usdt": b["deposit"],
                "profit_usdt": 12.5,
                "profit_percentage": 1.25
            })
        })
        .collect();
    (StatusCode::OK, Json(Value::Array(stats)))
}

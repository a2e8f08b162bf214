use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Auth ──

/// Body for `/auth/login` and `/auth/register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token pair returned by login, register and refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenData {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default = "bearer")]
    pub token_type: String,
}

fn bearer() -> String {
    "Bearer".to_string()
}

impl TokenData {
    pub fn new(access_token: &str, refresh_token: Option<&str>) -> Self {
        Self {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.map(str::to_string),
            token_type: bearer(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
}

/// Error body returned by the API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, rename = "statusCode")]
    pub status_code: Option<u16>,
}

// ── Bots ──

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum BotStatus {
    Active,
    Pause,
    Error,
}

impl fmt::Display for BotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotStatus::Active => write!(f, "ACTIVE"),
            BotStatus::Pause => write!(f, "PAUSE"),
            BotStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Grid bot configuration as stored by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bot {
    pub id: String,
    pub name: String,
    pub status: BotStatus,
    pub symbol: String, // trading pair, e.g. "BTCUSDT"
    #[serde(with = "rust_decimal::serde::float")]
    pub deposit: Decimal, // in the quote currency
    #[serde(with = "rust_decimal::serde::float")]
    pub profit_percentage: Decimal, // 0.5 = 0.5%
    pub num_orders: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub grid_length: Decimal, // % between first and last order
    #[serde(rename = "isPublic")]
    pub is_public: bool,
}

/// Fields accepted by `POST /bots`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotCreate {
    pub name: String,
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub deposit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub profit_percentage: Decimal,
    pub num_orders: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub grid_length: Decimal,
}

/// Partial update for `PUT /bots`; unset fields are left out of the body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotUpdate {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BotStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub deposit: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub profit_percentage: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_orders: Option<u32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub grid_length: Option<Decimal>,
    #[serde(default, rename = "isPublic", skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl BotUpdate {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    /// True when nothing besides the id would be sent
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.status.is_none()
            && self.symbol.is_none()
            && self.deposit.is_none()
            && self.profit_percentage.is_none()
            && self.num_orders.is_none()
            && self.grid_length.is_none()
            && self.is_public.is_none()
    }
}

/// Per-bot profitability snapshot from `GET /bots/statistics`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotStatistic {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub cycles_completed: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub deposit_usdt: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub profit_usdt: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub profit_percentage: Decimal, // profit / deposit * 100
}

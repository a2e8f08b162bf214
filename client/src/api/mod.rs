pub mod auth;
pub mod bots;

pub use auth::AuthApi;
pub use bots::{split_by_visibility, BotsApi};

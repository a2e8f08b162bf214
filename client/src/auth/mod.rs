pub mod cookie_jar;
pub mod store;

pub use cookie_jar::CookieJarStore;
pub use store::{CredentialStore, MemoryStore};

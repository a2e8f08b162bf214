use std::sync::{PoisonError, RwLock};

use crate::error::Result;
use crate::types::TokenData;

/// Where the access/refresh credential pair lives between requests.
///
/// Reads must tolerate absence: a missing token is `None`, never an error.
pub trait CredentialStore: Send + Sync {
    fn access_token(&self) -> Option<String>;

    fn refresh_token(&self) -> Option<String>;

    /// Store a freshly issued pair. A missing `refresh_token` keeps the
    /// one already stored.
    fn save(&self, tokens: &TokenData) -> Result<()>;

    /// Remove both credentials.
    fn clear(&self) -> Result<()>;

    fn has_tokens(&self) -> bool {
        self.access_token().is_some() || self.refresh_token().is_some()
    }
}

#[derive(Debug, Default, Clone)]
struct Pair {
    access: Option<String>,
    refresh: Option<String>,
}

/// In-process credential store
#[derive(Debug, Default)]
pub struct MemoryStore {
    pair: RwLock<Pair>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(access: Option<&str>, refresh: Option<&str>) -> Self {
        Self {
            pair: RwLock::new(Pair {
                access: access.map(str::to_string),
                refresh: refresh.map(str::to_string),
            }),
        }
    }

    fn read(&self) -> Pair {
        self.pair.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl CredentialStore for MemoryStore {
    fn access_token(&self) -> Option<String> {
        self.read().access
    }

    fn refresh_token(&self) -> Option<String> {
        self.read().refresh
    }

    fn save(&self, tokens: &TokenData) -> Result<()> {
        let mut pair = self.pair.write().unwrap_or_else(PoisonError::into_inner);
        pair.access = Some(tokens.access_token.clone());
        if let Some(refresh) = &tokens.refresh_token {
            pair.refresh = Some(refresh.clone());
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.pair.write().unwrap_or_else(PoisonError::into_inner) = Pair::default();
        Ok(())
    }
}

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use super::store::CredentialStore;
use crate::error::{ApiError, Result};
use crate::types::TokenData;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Every credential cookie is written and removed under this one path.
const COOKIE_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub same_site: SameSite,
    pub secure: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Jar {
    cookies: Vec<Cookie>,
}

impl Jar {
    fn get(&self, name: &str, domain: &str) -> Option<&Cookie> {
        self.cookies
            .iter()
            .find(|c| c.name == name && c.domain == domain && c.path == COOKIE_PATH)
    }

    fn remove(&mut self, name: &str, domain: &str) {
        self.cookies
            .retain(|c| !(c.name == name && c.domain == domain && c.path == COOKIE_PATH));
    }

    fn set(&mut self, cookie: Cookie) {
        self.remove(&cookie.name, &cookie.domain);
        self.cookies.push(cookie);
    }
}

/// File-backed credential store modelled on browser cookies.
///
/// Entries are scoped to the API origin's host, `path=/`, `SameSite=Strict`,
/// and marked secure when the API is served over https. The file is the
/// source of truth: every read and write goes back to disk, so several
/// stores (or processes) can share one jar and other origins' entries in it
/// are left alone.
pub struct CookieJarStore {
    path: PathBuf,
    domain: String,
    secure: bool,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl CookieJarStore {
    /// Open (or lazily create) the jar at `path` for the origin of `base_url`.
    pub fn open(path: impl Into<PathBuf>, base_url: &Url) -> Result<Self> {
        let path = path.into();
        let domain = base_url
            .host_str()
            .ok_or_else(|| ApiError::Storage(format!("Base URL has no host: {base_url}")))?
            .to_string();
        let secure = base_url.scheme() == "https";

        let jar = load_jar(&path)?;
        debug!("Cookie jar {} opened for {domain} ({} entries)", path.display(), jar.cookies.len());

        Ok(Self {
            path,
            domain,
            secure,
            write_lock: Mutex::new(()),
        })
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// This origin's credential cookies as currently on disk
    pub fn cookies(&self) -> Vec<Cookie> {
        self.snapshot()
            .cookies
            .into_iter()
            .filter(|c| c.domain == self.domain)
            .collect()
    }

    fn cookie(&self, name: &str, value: &str) -> Cookie {
        Cookie {
            name: name.to_string(),
            value: value.to_string(),
            domain: self.domain.clone(),
            path: COOKIE_PATH.to_string(),
            same_site: SameSite::Strict,
            secure: self.secure,
            created_at: Utc::now(),
        }
    }

    fn snapshot(&self) -> Jar {
        load_jar(&self.path).unwrap_or_else(|e| {
            warn!("Failed to read cookie jar: {e}");
            Jar::default()
        })
    }

    fn value(&self, name: &str) -> Option<String> {
        self.snapshot()
            .get(name, &self.domain)
            .map(|c| c.value.clone())
            .filter(|v| !v.is_empty())
    }

    /// Re-read the file, apply `change`, write it back.
    fn update(&self, change: impl FnOnce(&mut Jar)) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut jar = load_jar(&self.path)?;
        change(&mut jar);
        write_jar(&self.path, &jar)
    }
}

impl CredentialStore for CookieJarStore {
    fn access_token(&self) -> Option<String> {
        self.value(ACCESS_TOKEN_KEY)
    }

    fn refresh_token(&self) -> Option<String> {
        self.value(REFRESH_TOKEN_KEY)
    }

    fn save(&self, tokens: &TokenData) -> Result<()> {
        let access = self.cookie(ACCESS_TOKEN_KEY, &tokens.access_token);
        let refresh = tokens
            .refresh_token
            .as_deref()
            .map(|r| self.cookie(REFRESH_TOKEN_KEY, r));
        self.update(|jar| {
            jar.set(access);
            if let Some(refresh) = refresh {
                jar.set(refresh);
            }
        })
    }

    fn clear(&self) -> Result<()> {
        self.update(|jar| {
            jar.remove(ACCESS_TOKEN_KEY, &self.domain);
            jar.remove(REFRESH_TOKEN_KEY, &self.domain);
        })
    }
}

/// Read the jar; an unparsable file counts as empty and is replaced on the next write.
fn load_jar(path: &Path) -> Result<Jar> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Jar::default()),
        Err(e) => return Err(e.into()),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Jar::default());
    }
    match serde_json::from_slice(&bytes) {
        Ok(jar) => Ok(jar),
        Err(e) => {
            warn!("Ignoring corrupt cookie jar {}: {e}", path.display());
            Ok(Jar::default())
        }
    }
}

fn write_jar(path: &Path, jar: &Jar) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    // Write-then-rename so a crash never leaves a half-written jar
    let tmp = path.with_extension("tmp");
    match fs::remove_file(&tmp) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
        _ => {}
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(&tmp)?;
    file.write_all(&serde_json::to_vec_pretty(jar)?)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp, path)?;
    Ok(())
}

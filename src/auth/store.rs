//! Token storage.
//!
//! The refresh protocol only sees the [`TokenStore`] trait. The CLI persists
//! cookies to a file in the state directory; tests use [`MemoryTokenStore`].

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use super::cookie::{ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME, TokenCookie};

/// Cookie-like storage for the access and refresh tokens.
///
/// Store operations never fail: a missing or expired cookie reads as `None`.
pub trait TokenStore: Send + Sync {
    /// Current value of the cookie `key`, if set and not expired.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `token` under `key`, expiring `days` from now.
    /// A non-positive `days` deletes the cookie.
    fn set(&self, key: &str, token: &str, days: i64);

    fn clear(&self, key: &str) {
        self.set(key, "", -1);
    }

    /// `Cookie` header carrying the live token cookies, for credential-bearing requests.
    fn cookie_header(&self) -> Option<String> {
        let pairs: Vec<String> = [ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME]
            .into_iter()
            .filter_map(|name| self.get(name).map(|value| format!("{}={}", name, value)))
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }
}

/// Cookie jar shared by both store implementations.
#[derive(Debug, Default)]
struct CookieJar {
    cookies: BTreeMap<String, TokenCookie>,
}

impl CookieJar {
    fn get(&self, key: &str, now: DateTime<Utc>) -> Option<String> {
        self.cookies
            .get(key)
            .filter(|cookie| !cookie.is_expired_at(now))
            .map(|cookie| cookie.value.clone())
    }

    fn set(&mut self, key: &str, token: &str, days: i64, now: DateTime<Utc>) {
        let cookie = TokenCookie::new(key, token, days, now);
        if cookie.is_expired_at(now) {
            self.cookies.remove(key);
        } else {
            self.cookies.insert(key.to_string(), cookie);
        }
    }

    fn live_lines(&self, now: DateTime<Utc>) -> Vec<String> {
        self.cookies
            .values()
            .filter(|cookie| !cookie.is_expired_at(now))
            .map(TokenCookie::to_line)
            .collect()
    }
}

fn lock(jar: &Mutex<CookieJar>) -> MutexGuard<'_, CookieJar> {
    jar.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    jar: Mutex<CookieJar>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.jar).get(key, Utc::now())
    }

    fn set(&self, key: &str, token: &str, days: i64) {
        lock(&self.jar).set(key, token, days, Utc::now());
    }
}

/// Token store persisted as cookie lines in a text file.
///
/// The in-memory jar is authoritative; a failed write is logged and the
/// process carries on with the tokens it holds.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    jar: Mutex<CookieJar>,
}

impl FileTokenStore {
    /// Open the store at `path`, loading any live cookies already there.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut jar = CookieJar::default();
        let now = Utc::now();

        match std::fs::read_to_string(&path) {
            Ok(content) => {
                for line in content.lines().filter(|l| !l.trim().is_empty()) {
                    match TokenCookie::parse_line(line) {
                        Some(cookie) if !cookie.is_expired_at(now) => {
                            jar.cookies.insert(cookie.name.clone(), cookie);
                        }
                        Some(_) => {}
                        None => warn!(path = %path.display(), "Skipping malformed cookie line"),
                    }
                }
                debug!(path = %path.display(), count = jar.cookies.len(), "Loaded token cookies");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to read token cookies"),
        }

        Self {
            path,
            jar: Mutex::new(jar),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, jar: &CookieJar) {
        let mut content = jar.live_lines(Utc::now()).join("\n");
        if !content.is_empty() {
            content.push('\n');
        }

        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "Failed to create state directory");
                return;
            }
        }

        if let Err(e) = write_private(&self.path, content.as_bytes()) {
            warn!(path = %self.path.display(), error = %e, "Failed to write token cookies");
        }
    }
}

/// Write `content` to `path`, readable by the owner only on unix.
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    // `mode` only applies on creation; tighten files left by older runs.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(content)
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.jar).get(key, Utc::now())
    }

    fn set(&self, key: &str, token: &str, days: i64) {
        let mut jar = lock(&self.jar);
        jar.set(key, token, days, Utc::now());
        self.persist(&jar);
    }
}

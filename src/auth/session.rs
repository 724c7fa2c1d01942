//! Session expiry.
//!
//! A session starts `Active` and moves to `Expired` once, the first time a
//! refresh is rejected (or the access token's `exp` passes while watched). The
//! transition is a compare-and-swap, so the logout side effects run exactly
//! once no matter how many requests observe the failure at the same time.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use url::Url;

use super::cookie::{ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME};
use super::store::TokenStore;
use crate::jwt::decode_payload;
use crate::state::LocalState;

const ACTIVE: u8 = 0;
const EXPIRED: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Expired,
}

/// Where the user is sent once the session is over.
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self, login_url: &Url);
}

/// Redirect used by the command-line client: tells the operator how to sign in again.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptLogin;

impl LoginRedirect for PromptLogin {
    fn redirect_to_login(&self, login_url: &Url) {
        warn!(login_url = %login_url, "Session expired, sign in again");
        eprintln!("Session expired. Sign in again at {}", login_url);
    }
}

type Observer = Arc<dyn Fn() + Send + Sync>;

/// Owns the one-shot `Active -> Expired` transition and its side effects.
pub struct SessionManager {
    state: AtomicU8,
    tokens: Arc<dyn TokenStore>,
    local: Arc<LocalState>,
    observers: RwLock<Vec<Observer>>,
    redirect: Arc<dyn LoginRedirect>,
    login_url: Url,
}

impl SessionManager {
    pub fn new(
        tokens: Arc<dyn TokenStore>,
        local: Arc<LocalState>,
        redirect: Arc<dyn LoginRedirect>,
        login_url: Url,
    ) -> Self {
        Self {
            state: AtomicU8::new(ACTIVE),
            tokens,
            local,
            observers: RwLock::new(Vec::new()),
            redirect,
            login_url,
        }
    }

    pub fn state(&self) -> SessionState {
        match self.state.load(Ordering::Acquire) {
            ACTIVE => SessionState::Active,
            _ => SessionState::Expired,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.state() == SessionState::Expired
    }

    pub fn login_url(&self) -> &Url {
        &self.login_url
    }

    /// Register a callback run once when the session expires.
    pub fn on_expired(&self, observer: impl Fn() + Send + Sync + 'static) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(observer));
    }

    /// Expire the session.
    ///
    /// Only the call that performs the transition clears the tokens and local
    /// state, notifies observers and redirects to login; it returns `true`.
    /// Every later call is a no-op returning `false`.
    pub fn expire(&self) -> bool {
        if self
            .state
            .compare_exchange(ACTIVE, EXPIRED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        info!("Session expired, clearing credentials");

        self.tokens.clear(ACCESS_COOKIE_NAME);
        self.tokens.clear(REFRESH_COOKIE_NAME);
        self.local.clear();

        // Snapshot so an observer may register another without deadlocking
        let observers: Vec<Observer> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in observers {
            observer();
        }

        self.redirect.redirect_to_login(&self.login_url);
        true
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state())
            .field("login_url", &self.login_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Log the session out when `access_token` reaches its `exp` claim.
///
/// An already-expired token expires the session immediately and returns
/// `None`, as does a token whose payload cannot be decoded (without touching
/// the session). Otherwise a task sleeping until `exp` is returned; abort it
/// when the token is replaced.
pub fn spawn_expiry_watch(session: Arc<SessionManager>, access_token: &str) -> Option<JoinHandle<()>> {
    let payload = decode_payload(access_token)?;
    let remaining = payload.remaining_secs(chrono::Utc::now());

    if remaining <= 0 {
        session.expire();
        return None;
    }

    let delay = std::time::Duration::from_secs(remaining.unsigned_abs());
    Some(tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        session.expire();
    }))
}

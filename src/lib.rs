pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod jwt;
pub mod state;

use api::{AdminApi, ApiError};
use auth::{AuthClient, FetchError, FileTokenStore, LoginRedirect, PromptLogin, SessionManager};
use state::{AuthStore, LocalState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// File in the state directory holding the token cookies.
pub const COOKIE_FILE: &str = "cookies.txt";
/// File in the state directory holding the local state values.
pub const LOCAL_STATE_FILE: &str = "local-state.json";

pub struct ClientConfig {
    /// Base URL of the admin API (e.g., "https://api.example.com")
    pub api_url: Url,
    /// Base URL of the auth endpoints; refresh is `{auth_url}/auth/refresh`
    pub auth_url: Url,
    /// Directory for the cookie file and local state
    pub state_dir: PathBuf,
    /// Accounts allowed to sign in. Empty accepts any account
    pub admin_emails: Vec<String>,
    /// Per-request transport timeout
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn cookie_path(&self) -> PathBuf {
        self.state_dir.join(COOKIE_FILE)
    }

    pub fn local_state_path(&self) -> PathBuf {
        self.state_dir.join(LOCAL_STATE_FILE)
    }

    pub fn login_url(&self) -> Result<Url, url::ParseError> {
        api::login_url(&self.auth_url)
    }
}

/// Build the admin client with file-backed tokens and state, sending the
/// operator to the login page when the session ends.
pub fn open_client(config: &ClientConfig) -> Result<AdminApi, ApiError> {
    open_client_with(config, Arc::new(PromptLogin))
}

/// Same as [`open_client`] with a caller-chosen login redirect.
pub fn open_client_with(config: &ClientConfig, redirect: Arc<dyn LoginRedirect>) -> Result<AdminApi, ApiError> {
    let tokens = Arc::new(FileTokenStore::open(config.cookie_path()));
    let local = Arc::new(LocalState::open(config.local_state_path()));

    let session = Arc::new(SessionManager::new(
        tokens.clone(),
        local.clone(),
        redirect,
        config.login_url()?,
    ));

    let auth_store = Arc::new(AuthStore::new(local));
    auth_store.attach(&session);

    let http = reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(FetchError::from)?;

    let client = AuthClient::new(http, tokens, session, &config.auth_url)?;

    Ok(AdminApi::new(
        client,
        config.api_url.clone(),
        config.auth_url.clone(),
        auth_store,
        config.admin_emails.clone(),
    ))
}

//! Admin session authentication.
//!
//! Dual-token system as seen from the client: a short-lived access token sent
//! as a bearer credential and a long-lived refresh token exchanged for new
//! tokens when the API answers 401. A rejected refresh ends the session for
//! the whole process, exactly once.

mod cookie;
mod errors;
mod fetch;
mod session;
mod store;

pub use cookie::{
    ACCESS_COOKIE_NAME, DEFAULT_COOKIE_DAYS, REFRESH_COOKIE_NAME, TokenCookie, format_http_date,
};
pub use errors::FetchError;
pub use fetch::{
    ApiRequest, AuthClient, Credentials, FormPart, MultipartForm, REFRESH_PATH, RequestBody,
    join_path,
};
pub use session::{LoginRedirect, PromptLogin, SessionManager, SessionState, spawn_expiry_watch};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};

//! Authenticated fetch with transparent token refresh.
//!
//! Every admin API call goes through [`AuthClient::request`]:
//! - the stored access token is sent as a bearer credential
//! - a 401 triggers one refresh against the refresh endpoint
//! - on a successful refresh the new tokens are stored and the original
//!   request is retried exactly once
//! - on a rejected refresh the session is expired (once, process-wide) and
//!   the call fails with [`FetchError::TokenRefreshFailed`]

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use super::cookie::{ACCESS_COOKIE_NAME, DEFAULT_COOKIE_DAYS, REFRESH_COOKIE_NAME};
use super::errors::FetchError;
use super::session::SessionManager;
use super::store::TokenStore;

/// Path of the refresh endpoint below the auth base URL.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Whether stored cookies travel with the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Credentials {
    #[default]
    Include,
    Omit,
}

/// One part of a multipart form.
#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    pub data: Vec<u8>,
    pub file_name: Option<String>,
    pub mime: Option<String>,
}

/// Multipart form kept as plain parts so it can be rebuilt for a retry.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parts.push(FormPart {
            name: name.to_string(),
            data: value.into().into_bytes(),
            file_name: None,
            mime: None,
        });
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, data: Vec<u8>, mime: Option<&str>) -> Self {
        self.parts.push(FormPart {
            name: name.to_string(),
            data,
            file_name: Some(file_name.to_string()),
            mime: mime.map(str::to_string),
        });
        self
    }

    /// A part holding a JSON document typed `application/json`.
    pub fn json(mut self, name: &str, value: &serde_json::Value) -> Self {
        self.parts.push(FormPart {
            name: name.to_string(),
            data: value.to_string().into_bytes(),
            file_name: None,
            mime: Some("application/json".to_string()),
        });
        self
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    fn build(&self) -> Result<reqwest::multipart::Form, FetchError> {
        let mut form = reqwest::multipart::Form::new();
        for part in &self.parts {
            let mut built = reqwest::multipart::Part::bytes(part.data.clone());
            if let Some(file_name) = &part.file_name {
                built = built.file_name(file_name.clone());
            }
            if let Some(mime) = &part.mime {
                built = built.mime_str(mime).map_err(|source| FetchError::InvalidForm {
                    part: part.name.clone(),
                    source,
                })?;
            }
            form = form.part(part.name.clone(), built);
        }
        Ok(form)
    }
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Serialized as JSON; `Content-Type: application/json` unless the caller set one.
    Json(serde_json::Value),
    Bytes(Vec<u8>),
    Multipart(MultipartForm),
}

/// A request description that can be sent more than once.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
    pub credentials: Credentials,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            credentials: Credentials::Include,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    pub fn bytes(mut self, body: Vec<u8>) -> Self {
        self.body = RequestBody::Bytes(body);
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }
}

/// Body of a successful refresh. Either token may be absent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// Outcome of a refresh attempt that did not fail in transport.
enum RefreshOutcome {
    Renewed,
    Rejected(StatusCode),
}

/// HTTP client that keeps the admin session alive.
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    tokens: Arc<dyn TokenStore>,
    session: Arc<SessionManager>,
    refresh_url: Url,
}

impl AuthClient {
    /// `auth_url` is the auth base; the refresh endpoint is `{auth_url}/auth/refresh`.
    pub fn new(
        http: reqwest::Client,
        tokens: Arc<dyn TokenStore>,
        session: Arc<SessionManager>,
        auth_url: &Url,
    ) -> Result<Self, url::ParseError> {
        let refresh_url = join_path(auth_url, REFRESH_PATH)?;
        Ok(Self {
            http,
            tokens,
            session,
            refresh_url,
        })
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn refresh_url(&self) -> &Url {
        &self.refresh_url
    }

    /// Send `request` with the stored bearer token, refreshing and retrying once on 401.
    ///
    /// Any status other than 401 on the first attempt, and any status at all
    /// on the retry, is returned untouched.
    pub async fn request(&self, request: ApiRequest) -> Result<Response, FetchError> {
        let access_token = self.tokens.get(ACCESS_COOKIE_NAME);
        let response = self.send(&request, access_token.as_deref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(method = %request.method, url = %request.url, "Access token rejected, refreshing");

        match self.refresh().await? {
            RefreshOutcome::Renewed => {
                let access_token = self.tokens.get(ACCESS_COOKIE_NAME);
                self.send(&request, access_token.as_deref()).await
            }
            RefreshOutcome::Rejected(status) => {
                warn!(status = status.as_u16(), "Token refresh rejected");
                self.session.expire();
                Err(FetchError::TokenRefreshFailed)
            }
        }
    }

    /// Send `request` once with the stored bearer token. A 401 is returned
    /// like any other status and never touches the session.
    pub async fn request_once(&self, request: ApiRequest) -> Result<Response, FetchError> {
        let access_token = self.tokens.get(ACCESS_COOKIE_NAME);
        self.send(&request, access_token.as_deref()).await
    }

    async fn send(&self, request: &ApiRequest, access_token: Option<&str>) -> Result<Response, FetchError> {
        let headers = self.compose_headers(request, access_token)?;
        let builder = self
            .http
            .request(request.method.clone(), request.url.clone())
            .headers(headers);

        let builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.body(value.to_string()),
            RequestBody::Bytes(bytes) => builder.body(bytes.clone()),
            RequestBody::Multipart(form) => builder.multipart(form.build()?),
        };

        Ok(builder.send().await?)
    }

    /// Caller headers plus the bearer credential and cookies. Built fresh for
    /// every send so nothing leaks between the first attempt and the retry.
    fn compose_headers(&self, request: &ApiRequest, access_token: Option<&str>) -> Result<HeaderMap, FetchError> {
        let mut headers = request.headers.clone();

        if let Some(token) = access_token {
            headers.insert(AUTHORIZATION, bearer(token)?);
        }

        match &request.body {
            // The transport writes the multipart boundary into Content-Type
            RequestBody::Multipart(_) => {
                headers.remove(CONTENT_TYPE);
            }
            RequestBody::Json(_) if !headers.contains_key(CONTENT_TYPE) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            _ => {}
        }

        if request.credentials == Credentials::Include && !headers.contains_key(COOKIE) {
            if let Some(cookies) = self.tokens.cookie_header() {
                let value = HeaderValue::from_str(&cookies).map_err(|_| FetchError::InvalidHeader("cookie"))?;
                headers.insert(COOKIE, value);
            }
        }

        Ok(headers)
    }

    /// Exchange the refresh token for new tokens and store whichever came back.
    async fn refresh(&self) -> Result<RefreshOutcome, FetchError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.tokens.get(REFRESH_COOKIE_NAME) {
            headers.insert(AUTHORIZATION, bearer(&token)?);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(cookies) = self.tokens.cookie_header() {
            let value = HeaderValue::from_str(&cookies).map_err(|_| FetchError::InvalidHeader("cookie"))?;
            headers.insert(COOKIE, value);
        }

        let response = self
            .http
            .post(self.refresh_url.clone())
            .headers(headers)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Ok(RefreshOutcome::Rejected(status));
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(FetchError::InvalidRefreshResponse)?;

        // An empty token leaves the stored one unchanged.
        let access = body.access_token.as_deref().filter(|t| !t.is_empty());
        let refresh = body.refresh_token.as_deref().filter(|t| !t.is_empty());
        if let Some(token) = access {
            self.tokens.set(ACCESS_COOKIE_NAME, token, DEFAULT_COOKIE_DAYS);
        }
        if let Some(token) = refresh {
            self.tokens.set(REFRESH_COOKIE_NAME, token, DEFAULT_COOKIE_DAYS);
        }

        debug!(access = access.is_some(), refresh = refresh.is_some(), "Tokens refreshed");

        Ok(RefreshOutcome::Renewed)
    }
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("refresh_url", &self.refresh_url.as_str())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

fn bearer(token: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| FetchError::InvalidHeader("authorization"))
}

/// Append `path` to `base`, keeping any path prefix `base` already has.
pub fn join_path(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::LoginRedirect;
    use crate::auth::store::MemoryTokenStore;
    use crate::state::LocalState;

    struct NoRedirect;

    impl LoginRedirect for NoRedirect {
        fn redirect_to_login(&self, _login_url: &Url) {}
    }

    fn client(tokens: Arc<MemoryTokenStore>) -> AuthClient {
        let login = Url::parse("http://localhost/login").unwrap();
        let session = Arc::new(SessionManager::new(
            tokens.clone(),
            Arc::new(LocalState::in_memory()),
            Arc::new(NoRedirect),
            login,
        ));
        AuthClient::new(
            reqwest::Client::new(),
            tokens,
            session,
            &Url::parse("http://localhost/api").unwrap(),
        )
        .unwrap()
    }

    fn url() -> Url {
        Url::parse("http://localhost/admin/users/suspended").unwrap()
    }

    #[test]
    fn test_refresh_url_keeps_prefix() {
        let client = client(Arc::new(MemoryTokenStore::new()));
        assert_eq!(client.refresh_url().as_str(), "http://localhost/api/auth/refresh");
    }

    #[test]
    fn test_join_path() {
        let base = Url::parse("https://api.example.com/v1/").unwrap();
        assert_eq!(
            join_path(&base, "/admin/products").unwrap().as_str(),
            "https://api.example.com/v1/admin/products"
        );
    }

    #[test]
    fn test_bearer_overrides_caller_authorization() {
        let client = client(Arc::new(MemoryTokenStore::new()));
        let request = ApiRequest::get(url())
            .header(AUTHORIZATION, HeaderValue::from_static("Basic abc"))
            .header(HeaderName::from_static("x-trace"), HeaderValue::from_static("1"));

        let headers = client.compose_headers(&request, Some("tokA")).unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer tokA");
        assert_eq!(headers["x-trace"], "1");
    }

    #[test]
    fn test_no_token_keeps_caller_headers() {
        let client = client(Arc::new(MemoryTokenStore::new()));
        let request = ApiRequest::get(url()).header(AUTHORIZATION, HeaderValue::from_static("Basic abc"));

        let headers = client.compose_headers(&request, None).unwrap();
        assert_eq!(headers[AUTHORIZATION], "Basic abc");
        assert!(!headers.contains_key(COOKIE));
    }

    #[test]
    fn test_multipart_drops_content_type() {
        let client = client(Arc::new(MemoryTokenStore::new()));
        let form = MultipartForm::new().text("name", "smile");
        let request = ApiRequest::new(Method::POST, url())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .multipart(form);

        let headers = client.compose_headers(&request, Some("tokA")).unwrap();
        assert!(!headers.contains_key(CONTENT_TYPE));
    }

    #[test]
    fn test_json_defaults_content_type() {
        let client = client(Arc::new(MemoryTokenStore::new()));
        let request = ApiRequest::new(Method::POST, url()).json(serde_json::json!({ "word": "x" }));
        let headers = client.compose_headers(&request, None).unwrap();
        assert_eq!(headers[CONTENT_TYPE], "application/json");

        let request = request.header(CONTENT_TYPE, HeaderValue::from_static("application/merge-patch+json"));
        let headers = client.compose_headers(&request, None).unwrap();
        assert_eq!(headers[CONTENT_TYPE], "application/merge-patch+json");
    }

    #[test]
    fn test_credentials_include_attaches_cookies() {
        let tokens = Arc::new(MemoryTokenStore::new());
        tokens.set(ACCESS_COOKIE_NAME, "tokA", DEFAULT_COOKIE_DAYS);
        let client = client(tokens);

        let headers = client.compose_headers(&ApiRequest::get(url()), Some("tokA")).unwrap();
        assert_eq!(headers[COOKIE], "accessToken=tokA");

        let omitted = ApiRequest::get(url()).credentials(Credentials::Omit);
        let headers = client.compose_headers(&omitted, Some("tokA")).unwrap();
        assert!(!headers.contains_key(COOKIE));
    }

    #[test]
    fn test_invalid_token_header_is_error() {
        let client = client(Arc::new(MemoryTokenStore::new()));
        let result = client.compose_headers(&ApiRequest::get(url()), Some("bad\ntoken"));
        assert!(matches!(result, Err(FetchError::InvalidHeader("authorization"))));
    }

    #[test]
    fn test_form_rejects_bad_mime() {
        let form = MultipartForm::new().file("file", "a.png", vec![1, 2, 3], Some("not a mime"));
        assert!(matches!(form.build(), Err(FetchError::InvalidForm { .. })));
    }
}

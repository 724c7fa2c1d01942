#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use jsonwebtoken::{EncodingKey, Header, encode};
use mindmate_admin::api::AdminApi;
use mindmate_admin::auth::{
    ACCESS_COOKIE_NAME, AuthClient, DEFAULT_COOKIE_DAYS, LoginRedirect, MemoryTokenStore,
    REFRESH_COOKIE_NAME, SessionManager, TokenStore,
};
use mindmate_admin::state::{AuthStore, LocalState};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

/// Path prefix the mock serves the auth endpoints under.
pub const AUTH_PREFIX: &str = "/api";

/// How the mock answers `POST /api/auth/refresh`.
#[derive(Clone, Debug)]
pub enum RefreshBehavior {
    /// 200 with this JSON body; an `accessToken` in it becomes valid.
    Respond(Value),
    /// 200 with a body that is not JSON.
    Garbage,
    Reject(StatusCode),
}

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn bearer(&self) -> Option<&str> {
        self.header("authorization")?.strip_prefix("Bearer ")
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body is not JSON")
    }
}

struct MockState {
    requests: Mutex<Vec<RecordedRequest>>,
    valid_tokens: Mutex<HashSet<String>>,
    refresh: Mutex<RefreshBehavior>,
    routes: Mutex<HashMap<(Method, String), (StatusCode, Value)>>,
}

/// In-process backend standing in for both the admin API and the auth server.
pub struct MockBackend {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(MockState {
            requests: Mutex::new(Vec::new()),
            valid_tokens: Mutex::new(HashSet::new()),
            refresh: Mutex::new(RefreshBehavior::Reject(StatusCode::UNAUTHORIZED)),
            routes: Mutex::new(HashMap::new()),
        });

        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get local address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self { addr, state }
    }

    pub fn api_url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).unwrap()
    }

    pub fn auth_url(&self) -> Url {
        Url::parse(&format!("http://{}{}", self.addr, AUTH_PREFIX)).unwrap()
    }

    pub fn accept_token(&self, token: &str) {
        self.state.valid_tokens.lock().unwrap().insert(token.to_string());
    }

    pub fn on_refresh(&self, behavior: RefreshBehavior) {
        *self.state.refresh.lock().unwrap() = behavior;
    }

    /// Answer `method path` with `status` and `body` (for authorized callers).
    pub fn route(&self, method: Method, path: &str, status: StatusCode, body: Value) {
        self.state
            .routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), (status, body));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }

    pub fn refresh_calls(&self) -> usize {
        self.requests_to(&format!("{}/auth/refresh", AUTH_PREFIX)).len()
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let recorded = RecordedRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    };
    state.requests.lock().unwrap().push(recorded.clone());

    let path = recorded.path.as_str();

    if path == format!("{}/auth/refresh", AUTH_PREFIX) {
        let behavior = state.refresh.lock().unwrap().clone();
        return match behavior {
            RefreshBehavior::Respond(body) => {
                if let Some(token) = body.get("accessToken").and_then(Value::as_str) {
                    state.valid_tokens.lock().unwrap().insert(token.to_string());
                }
                Json(body).into_response()
            }
            RefreshBehavior::Garbage => (
                [(header::CONTENT_TYPE, "application/json")],
                "<html>not json</html>",
            )
                .into_response(),
            RefreshBehavior::Reject(status) => {
                (status, Json(json!({ "error": "invalid refresh token" }))).into_response()
            }
        };
    }

    let authorized = recorded
        .bearer()
        .is_some_and(|token| state.valid_tokens.lock().unwrap().contains(token));
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" }))).into_response();
    }

    let route = state
        .routes
        .lock()
        .unwrap()
        .get(&(method, path.to_string()))
        .cloned();
    match route {
        Some((status, body)) => (status, Json(body)).into_response(),
        None => StatusCode::OK.into_response(),
    }
}

/// Login redirect that only counts how often it fired.
#[derive(Default)]
pub struct CountingRedirect {
    count: AtomicUsize,
}

impl CountingRedirect {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl LoginRedirect for CountingRedirect {
    fn redirect_to_login(&self, _login_url: &Url) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Everything a test needs to drive and inspect one client.
pub struct TestClient {
    pub api: AdminApi,
    pub tokens: Arc<MemoryTokenStore>,
    pub local: Arc<LocalState>,
    pub session: Arc<SessionManager>,
    pub redirect: Arc<CountingRedirect>,
}

impl TestClient {
    pub fn new(backend: &MockBackend) -> Self {
        Self::with_admins(backend, Vec::new())
    }

    pub fn with_admins(backend: &MockBackend, admin_emails: Vec<String>) -> Self {
        let tokens = Arc::new(MemoryTokenStore::new());
        let local = Arc::new(LocalState::in_memory());
        let redirect = Arc::new(CountingRedirect::default());
        let login_url = Url::parse(&format!("{}/oauth2/authorize/google", backend.auth_url())).unwrap();

        let session = Arc::new(SessionManager::new(
            tokens.clone(),
            local.clone(),
            redirect.clone(),
            login_url,
        ));
        let auth_store = Arc::new(AuthStore::new(local.clone()));
        auth_store.attach(&session);

        let client = AuthClient::new(
            reqwest::Client::new(),
            tokens.clone(),
            session.clone(),
            &backend.auth_url(),
        )
        .unwrap();

        let api = AdminApi::new(
            client,
            backend.api_url(),
            backend.auth_url(),
            auth_store,
            admin_emails,
        );

        Self {
            api,
            tokens,
            local,
            session,
            redirect,
        }
    }

    /// Store both tokens as a signed-in browser would have them.
    pub fn sign_in(&self, access: &str, refresh: &str) {
        self.tokens.set(ACCESS_COOKIE_NAME, access, DEFAULT_COOKIE_DAYS);
        self.tokens.set(REFRESH_COOKIE_NAME, refresh, DEFAULT_COOKIE_DAYS);
    }

    pub fn access_token(&self) -> Option<String> {
        self.tokens.get(ACCESS_COOKIE_NAME)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.tokens.get(REFRESH_COOKIE_NAME)
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    sub: &'a str,
    exp: i64,
    iat: i64,
    role: &'a str,
}

/// Mint an HS256 access token expiring `ttl_secs` from now.
pub fn mint_token(sub: &str, ttl_secs: i64) -> String {
    let now = unix_now();
    let claims = Claims {
        sub,
        exp: now + ttl_secs,
        iat: now,
        role: "ADMIN",
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test-jwt-secret"))
        .expect("Failed to encode token")
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// Fresh directory under the system temp dir.
pub fn temp_dir() -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("mindmate-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

//! Typed admin API.
//!
//! One module per dashboard area. Every call goes through
//! [`AuthClient`](crate::auth::AuthClient), so none of them deal with 401s or
//! token refresh themselves.

mod emoticons;
mod error;
mod filtering;
mod magazines;
mod matchings;
mod notifications;
mod products;
mod reviews;
mod session;
mod users;

use reqwest::{Method, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::sync::Arc;
use url::Url;

use crate::auth::{ApiRequest, AuthClient, join_path};
use crate::state::AuthStore;

pub use emoticons::{Emoticon, EmoticonRequest, EmoticonUpload};
pub use error::ApiError;
pub use filtering::FilteringWord;
pub use magazines::{CategoryCount, Magazine, MagazineContent, PendingMagazine};
pub use matchings::{Matching, MatchingCategory};
pub use notifications::Announcement;
pub use products::{PaymentProduct, ProductForm, PromotionPeriod};
pub use reviews::{Review, ReviewFilter};
pub use session::{LoginCallback, LoginOutcome, login_url};
pub use users::SuspendedUser;

/// Default page size used by the dashboard's paged tables.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Paged response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub number: u32,
}

impl<T> Page<T> {
    /// Whether another page follows this one.
    pub fn has_next(&self) -> bool {
        self.number.saturating_add(1) < self.total_pages
    }
}

/// Admin API client.
#[derive(Debug, Clone)]
pub struct AdminApi {
    client: AuthClient,
    api_url: Url,
    auth_url: Url,
    auth_store: Arc<AuthStore>,
    admin_emails: Vec<String>,
}

impl AdminApi {
    pub fn new(
        client: AuthClient,
        api_url: Url,
        auth_url: Url,
        auth_store: Arc<AuthStore>,
        admin_emails: Vec<String>,
    ) -> Self {
        Self {
            client,
            api_url,
            auth_url,
            auth_store,
            admin_emails,
        }
    }

    pub fn client(&self) -> &AuthClient {
        &self.client
    }

    pub fn auth_store(&self) -> &Arc<AuthStore> {
        &self.auth_store
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(join_path(&self.api_url, path)?)
    }

    fn endpoint_with_query(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self.endpoint(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Send through the auth client and turn non-2xx into [`ApiError::Status`].
    async fn send(&self, request: ApiRequest) -> Result<Response, ApiError> {
        let response = self.client.request(request).await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error::status_error(response).await)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.send(ApiRequest::get(url)).await?;
        response.json().await.map_err(ApiError::Decode)
    }

    async fn send_empty(&self, method: Method, url: Url) -> Result<(), ApiError> {
        self.send(ApiRequest::new(method, url)).await?;
        Ok(())
    }

    async fn send_json<B: Serialize>(&self, method: Method, url: Url, body: &B) -> Result<(), ApiError> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::invalid_input(e.to_string()))?;
        self.send(ApiRequest::new(method, url).json(body)).await?;
        Ok(())
    }
}

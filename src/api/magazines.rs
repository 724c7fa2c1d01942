//! Magazine moderation and statistics.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{AdminApi, ApiError, Page};

/// One block of a magazine body (text, image or emoticon).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagazineContent {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub emoticon_url: Option<String>,
    pub emoticon_name: Option<String>,
    pub content_order: i32,
}

/// A published magazine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Magazine {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub contents: Vec<MagazineContent>,
    pub author_name: String,
    pub author_id: i64,
    #[serde(default)]
    pub like_count: u64,
    pub status: String,
    pub category: String,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A magazine waiting for approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMagazine {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub category: String,
    pub created_at: String,
    #[serde(default)]
    pub content: String,
}

/// Magazine count for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: String,
    /// Older servers send this as `count`.
    #[serde(alias = "count")]
    pub magazine_count: u64,
}

impl AdminApi {
    /// GET `/magazines`, unwrapping the page envelope.
    pub async fn magazines(&self) -> Result<Vec<Magazine>, ApiError> {
        let page: Page<Magazine> = self.get_json(self.endpoint("/magazines")?).await?;
        Ok(page.content)
    }

    /// GET `/magazines/{id}`
    pub async fn magazine(&self, id: i64) -> Result<Magazine, ApiError> {
        self.get_json(self.endpoint(&format!("/magazines/{}", id))?).await
    }

    /// DELETE `/magazines/{id}`
    pub async fn delete_magazine(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/magazines/{}", id))?;
        self.send_empty(Method::DELETE, url).await
    }

    /// GET `/admin/magazine/stats/category`
    pub async fn magazine_category_stats(&self) -> Result<Vec<CategoryCount>, ApiError> {
        self.get_json(self.endpoint("/admin/magazine/stats/category")?).await
    }

    /// GET `/admin/magazine/pending?page&size`
    pub async fn pending_magazines(&self, page: u32, size: u32) -> Result<Page<PendingMagazine>, ApiError> {
        let url = self.endpoint_with_query(
            "/admin/magazine/pending",
            &[("page", page.to_string()), ("size", size.to_string())],
        )?;
        self.get_json(url).await
    }

    /// POST `/admin/magazine/{id}/accept`
    pub async fn accept_magazine(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/admin/magazine/{}/accept", id))?;
        self.send_empty(Method::POST, url).await
    }

    /// POST `/admin/magazine/{id}/reject`
    pub async fn reject_magazine(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/admin/magazine/{}/reject", id))?;
        self.send_empty(Method::POST, url).await
    }
}

//! Matching posts by category.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{AdminApi, ApiError, Page};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchingCategory {
    Academic,
    Career,
    Relationship,
    Financial,
    Employment,
    Other,
}

impl MatchingCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchingCategory::Academic => "ACADEMIC",
            MatchingCategory::Career => "CAREER",
            MatchingCategory::Relationship => "RELATIONSHIP",
            MatchingCategory::Financial => "FINANCIAL",
            MatchingCategory::Employment => "EMPLOYMENT",
            MatchingCategory::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matching {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: MatchingCategory,
    pub status: String,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    pub owner_id: i64,
    pub owner_name: String,
    #[serde(default)]
    pub owner_profile_image: Option<String>,
}

impl AdminApi {
    /// GET `/admin/matchings?page&size&matchingCategory`
    pub async fn matchings(
        &self,
        category: MatchingCategory,
        page: u32,
        size: u32,
    ) -> Result<Page<Matching>, ApiError> {
        let url = self.endpoint_with_query(
            "/admin/matchings",
            &[
                ("page", page.to_string()),
                ("size", size.to_string()),
                ("matchingCategory", category.as_str().to_string()),
            ],
        )?;
        self.get_json(url).await
    }

    /// PATCH `/admin/matchings/{id}` rejects the matching.
    pub async fn reject_matching(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/admin/matchings/{}", id))?;
        self.send_empty(Method::PATCH, url).await
    }
}

//! Review moderation.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{AdminApi, ApiError, Page};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub user: String,
    pub content: String,
    pub rating: u8,
    #[serde(default)]
    pub reported: bool,
    pub created_at: String,
}

/// Optional filters for the review listing. Unset filters are not sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewFilter {
    pub min_rating: Option<u8>,
    pub max_rating: Option<u8>,
    /// Only reported reviews. `false` means no filter, not "unreported only".
    pub reported: bool,
}

impl ReviewFilter {
    fn query(&self, page: u32, size: u32) -> Result<Vec<(&'static str, String)>, ApiError> {
        if let (Some(min), Some(max)) = (self.min_rating, self.max_rating) {
            if min > max {
                return Err(ApiError::invalid_input(format!(
                    "minimum rating {} is above maximum rating {}",
                    min, max
                )));
            }
        }

        let mut query = Vec::new();
        if let Some(min) = self.min_rating {
            query.push(("minRating", min.to_string()));
        }
        if let Some(max) = self.max_rating {
            query.push(("maxRating", max.to_string()));
        }
        if self.reported {
            query.push(("reported", "true".to_string()));
        }
        query.push(("page", page.to_string()));
        query.push(("size", size.to_string()));
        Ok(query)
    }
}

impl AdminApi {
    /// GET `/admin/reviews` with the filter's query parameters.
    pub async fn reviews(&self, filter: &ReviewFilter, page: u32, size: u32) -> Result<Page<Review>, ApiError> {
        let query = filter.query(page, size)?;
        let url = self.endpoint_with_query("/admin/reviews", &query)?;
        self.get_json(url).await
    }

    /// DELETE `/admin/reviews/{id}`
    pub async fn delete_review(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/admin/reviews/{}", id))?;
        self.send_empty(Method::DELETE, url).await
    }
}

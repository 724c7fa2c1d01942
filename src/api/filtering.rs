//! Filtering (banned) words.
//!
//! The server caches the active word list; every mutation is followed by a
//! cache reload so the change takes effect immediately.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{AdminApi, ApiError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteringWord {
    pub id: i64,
    pub word: String,
    pub active: bool,
    pub created_at: String,
}

#[derive(Serialize)]
struct WordBody<'a> {
    word: &'a str,
}

/// Blank words are refused; others are sent exactly as given.
fn word_body(word: &str) -> Result<WordBody<'_>, ApiError> {
    if word.trim().is_empty() {
        return Err(ApiError::invalid_input("filtering word must not be blank"));
    }
    Ok(WordBody { word })
}

impl AdminApi {
    /// GET `/admin/filtering/words`
    pub async fn filtering_words(&self) -> Result<Vec<FilteringWord>, ApiError> {
        self.get_json(self.endpoint("/admin/filtering/words")?).await
    }

    /// POST `/admin/filtering/words/refresh` reloads the server's word cache.
    pub async fn refresh_filtering_words(&self) -> Result<(), ApiError> {
        let url = self.endpoint("/admin/filtering/words/refresh")?;
        self.send_empty(Method::POST, url).await
    }

    pub async fn add_filtering_word(&self, word: &str) -> Result<(), ApiError> {
        let body = word_body(word)?;
        self.send_json(Method::POST, self.endpoint("/admin/filtering/words")?, &body)
            .await?;
        self.refresh_filtering_words().await
    }

    pub async fn update_filtering_word(&self, id: i64, word: &str) -> Result<(), ApiError> {
        let body = word_body(word)?;
        let url = self.endpoint(&format!("/admin/filtering/words/{}", id))?;
        self.send_json(Method::PUT, url, &body).await?;
        self.refresh_filtering_words().await
    }

    pub async fn delete_filtering_word(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/admin/filtering/words/{}", id))?;
        self.send_empty(Method::DELETE, url).await?;
        self.refresh_filtering_words().await
    }

    pub async fn activate_filtering_word(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/admin/filtering/words/{}/activate", id))?;
        self.send_empty(Method::PUT, url).await?;
        self.refresh_filtering_words().await
    }

    pub async fn deactivate_filtering_word(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/admin/filtering/words/{}/deactivate", id))?;
        self.send_empty(Method::PUT, url).await?;
        self.refresh_filtering_words().await
    }
}

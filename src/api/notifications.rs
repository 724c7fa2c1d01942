//! Announcement push notifications.

use reqwest::Method;
use serde::Serialize;

use super::{AdminApi, ApiError};

/// Push a notification pointing at an existing announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub title: String,
    pub announcement_id: String,
}

impl AdminApi {
    /// POST `/admin/notifications/announcement`
    pub async fn send_announcement(&self, announcement: &Announcement) -> Result<(), ApiError> {
        if announcement.title.trim().is_empty() {
            return Err(ApiError::invalid_input("announcement title is required"));
        }
        if announcement.announcement_id.trim().is_empty() {
            return Err(ApiError::invalid_input("announcement id is required"));
        }

        let url = self.endpoint("/admin/notifications/announcement")?;
        self.send_json(Method::POST, url, announcement).await
    }
}

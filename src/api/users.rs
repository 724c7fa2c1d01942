//! Member moderation: suspended users and the report queue.

use serde::{Deserialize, Serialize};

use super::{AdminApi, ApiError};

/// A suspended member as listed on the users and reports screens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspendedUser {
    pub user_id: String,
    pub email: String,
    pub nickname: String,
    #[serde(default)]
    pub suspension_reason: Option<String>,
    #[serde(default)]
    pub report_count: u32,
    #[serde(default)]
    pub suspension_end_time: Option<String>,
}

impl AdminApi {
    /// GET `/admin/users/suspended`
    pub async fn suspended_users(&self) -> Result<Vec<SuspendedUser>, ApiError> {
        self.get_json(self.endpoint("/admin/users/suspended")?).await
    }

    /// The reports screen lists the same feed, in server order.
    pub async fn reported_users(&self) -> Result<Vec<SuspendedUser>, ApiError> {
        self.suspended_users().await
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{deserialize_id, deserialize_optional_id};

/// Metadata sent to the tracking service once an image is hosted.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotSubmission {
    pub time_log_id: String,
    pub image_url: String,
    pub timestamp: DateTime<Utc>,
    pub has_permission: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Screenshot {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub time_log_id: Option<String>,
    pub image_url: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub has_permission: Option<bool>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::recipe::ImageResponse;
use crate::models::shared::{clamp_limit, lenient_number};
use crate::models::user::UserSummary;

#[derive(Debug, Default, Deserialize)]
pub struct CommentListQuery {
    #[serde(rename = "comments-page", default, deserialize_with = "lenient_number")]
    pub page: Option<u64>,
    #[serde(rename = "comments-limit", default, deserialize_with = "lenient_number")]
    pub limit: Option<u64>,
}

impl CommentListQuery {
    pub fn page(&self) -> u64 {
        Ord::max(self.page.unwrap_or(1), 1)
    }

    pub fn limit(&self) -> u64 {
        clamp_limit(self.limit)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub text: String,
    pub rating: i32,
    pub recipe_id: Uuid,
    pub user: UserSummary,
    pub images: Vec<ImageResponse>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentGroups {
    /// The caller's own comments, newest first. Empty for anonymous callers.
    pub user_comments: Vec<CommentResponse>,
    pub other_comments: Vec<CommentResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentMeta {
    pub count: u64,
    pub comments_page: u64,
    pub comments_limit: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub comments: CommentGroups,
    pub meta: CommentMeta,
}

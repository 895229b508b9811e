use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::user;
use crate::utils::urls::avatar_url;

/// Account fields safe to return to the account owner.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn new(user: user::Model, public_url: &str) -> Self {
        Self {
            id: user.id,
            avatar_url: user.avatar_url.map(|a| avatar_url(public_url, &a)),
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

/// Author block embedded in recipes and comments.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

impl UserSummary {
    pub fn new(user: &user::Model, public_url: &str) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.as_deref().map(|a| avatar_url(public_url, a)),
        }
    }
}

/// Public profile with relationship counts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserSummary,
    pub followers_count: u64,
    pub following_count: u64,
    pub recipes_count: u64,
    /// Only present on the current user's own profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread_messages: Option<u64>,
}

/// A user listed as somebody's follower or followee.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUser {
    #[serde(flatten)]
    pub user: UserSummary,
    pub followers_count: u64,
    pub following_count: u64,
}

#[derive(Debug, Serialize)]
pub struct FollowerEntry {
    pub id: Uuid,
    pub follower: FollowUser,
}

#[derive(Debug, Serialize)]
pub struct FollowingEntry {
    pub id: Uuid,
    pub following: FollowUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateInfoResponse {
    pub is_following: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    pub password: Option<String>,
}

use chrono::{DateTime, Utc};
use sea_orm::Order;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::shared::{clamp_limit, lenient_number};
use crate::models::tag::TagResponse;
use crate::models::user::UserSummary;

/// Query parameters of `GET /recipes`.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    #[serde(default, deserialize_with = "lenient_number")]
    pub page: Option<u64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub limit: Option<u64>,
    pub search: Option<String>,
    /// `title`, `text`, `ingredients` or `All` (default).
    #[serde(rename = "search-by")]
    pub search_by: Option<String>,
    /// Comma-separated tag ids, or `All` (default).
    pub tags: Option<String>,
    /// `date` (default), `likes` or `views`.
    pub sort: Option<String>,
    /// `asc` or `desc` (default).
    #[serde(rename = "sort-order")]
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBy {
    Title,
    Text,
    Ingredients,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Date,
    Likes,
    Views,
}

impl RecipeListQuery {
    pub fn page(&self) -> u64 {
        Ord::max(self.page.unwrap_or(1), 1)
    }

    pub fn limit(&self) -> u64 {
        clamp_limit(self.limit)
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn search_by(&self) -> Result<SearchBy, AppError> {
        match self.search_by.as_deref().unwrap_or("All") {
            "title" => Ok(SearchBy::Title),
            "text" => Ok(SearchBy::Text),
            "ingredients" => Ok(SearchBy::Ingredients),
            "All" | "all" => Ok(SearchBy::All),
            _ => Err(AppError::Validation(
                "search-by must be one of: title, text, ingredients, All".into(),
            )),
        }
    }

    pub fn sort_by(&self) -> Result<SortBy, AppError> {
        match self.sort.as_deref().unwrap_or("date") {
            "date" => Ok(SortBy::Date),
            "likes" => Ok(SortBy::Likes),
            "views" => Ok(SortBy::Views),
            _ => Err(AppError::Validation(
                "sort must be one of: date, likes, views".into(),
            )),
        }
    }

    pub fn order(&self) -> Result<Order, AppError> {
        match self.sort_order.as_deref().unwrap_or("desc") {
            "desc" => Ok(Order::Desc),
            "asc" => Ok(Order::Asc),
            _ => Err(AppError::Validation(
                "sort-order must be one of: asc, desc".into(),
            )),
        }
    }

    /// `None` when every tag is accepted. Ids that do not parse are skipped.
    pub fn tag_ids(&self) -> Option<Vec<Uuid>> {
        match self.tags.as_deref().map(str::trim) {
            None | Some("") | Some("All") | Some("all") => None,
            Some(list) => Some(
                list.split(',')
                    .filter_map(|id| Uuid::parse_str(id.trim()).ok())
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub id: Uuid,
    pub image_url: String,
}

/// Recipe as shown in lists.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeCard {
    pub id: Uuid,
    pub title: String,
    pub ingredients: String,
    pub main_image_url: Option<String>,
    pub tags: Vec<TagResponse>,
    pub created_at: DateTime<Utc>,
    pub likes_count: u64,
    pub views: u64,
}

/// Full recipe with author, gallery and tags.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDetail {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub ingredients: String,
    pub main_image_url: Option<String>,
    pub author_id: Uuid,
    pub author: UserSummary,
    pub images: Vec<ImageResponse>,
    pub tags: Vec<TagResponse>,
    pub likes_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

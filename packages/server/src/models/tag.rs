use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{recipe_tag, recipe_tag_category};
use crate::error::AppError;
use crate::models::shared::non_blank;

/// Body of every tag and tag-category write.
#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: Option<String>,
}

impl NameRequest {
    pub fn name(&self) -> Result<&str, AppError> {
        non_blank(&self.name).ok_or_else(AppError::all_fields_required)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TagResponse {
    pub id: Uuid,
    pub name: String,
}

impl From<recipe_tag::Model> for TagResponse {
    fn from(tag: recipe_tag::Model) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDetail {
    pub id: Uuid,
    pub name: String,
    pub tag_category_id: Uuid,
}

impl From<recipe_tag::Model> for TagDetail {
    fn from(tag: recipe_tag::Model) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            tag_category_id: tag.tag_category_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
}

impl From<recipe_tag_category::Model> for CategoryResponse {
    fn from(category: recipe_tag_category::Model) -> Self {
        Self {
            id: category.id,
            name: category.name,
        }
    }
}

/// A category with all of its tags.
#[derive(Debug, Serialize)]
pub struct CategoryWithTags {
    pub id: Uuid,
    pub name: String,
    pub tags: Vec<TagResponse>,
}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 PHC string.
    #[serde(skip_serializing)]
    pub password: String,

    /// Stored file name under the avatars folder.
    pub avatar_url: Option<String>,

    #[sea_orm(default_value = false)]
    pub is_admin: bool,

    #[sea_orm(unique)]
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,

    #[sea_orm(has_many)]
    pub recipes: HasMany<super::recipe::Entity>,

    #[sea_orm(has_many)]
    pub comments: HasMany<super::recipe_comment::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

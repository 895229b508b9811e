use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Directed edge: `follower_id` follows `following_id`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "follows")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub follower_id: Uuid,
    #[sea_orm(belongs_to, relation_enum = "Follower", from = "follower_id", to = "id")]
    pub follower: HasOne<super::user::Entity>,

    pub following_id: Uuid,
    #[sea_orm(belongs_to, relation_enum = "Following", from = "following_id", to = "id")]
    pub following: HasOne<super::user::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

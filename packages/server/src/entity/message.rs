use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "message")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub text: String,
    #[sea_orm(default_value = false)]
    pub read: bool,

    pub sender_id: Uuid,
    #[sea_orm(belongs_to, relation_enum = "Sender", from = "sender_id", to = "id")]
    pub sender: HasOne<super::user::Entity>,

    pub receiver_id: Uuid,
    #[sea_orm(belongs_to, relation_enum = "Receiver", from = "receiver_id", to = "id")]
    pub receiver: HasOne<super::user::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Discord snowflake. Natural key for the login upsert.
    #[sea_orm(unique)]
    pub discord_id: String,
    pub username: String,
    pub discriminator: Option<String>,
    pub avatar: Option<String>,

    #[sea_orm(has_many)]
    pub prefabs: HasMany<super::prefab::Entity>,

    pub created_at: DateTimeUtc,
    /// Refreshed on every successful OAuth login.
    pub last_login: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}

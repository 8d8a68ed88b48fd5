use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::user;

/// Discord OAuth redirect target for the frontend to send the user to.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginUrlResponse {
    pub url: String,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct CallbackQuery {
    /// Authorization code handed back by Discord.
    pub code: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub discord_id: String,
    pub username: String,
    pub discriminator: Option<String>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<user::Model> for UserResponse {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            discord_id: m.discord_id,
            username: m.username,
            discriminator: m.discriminator,
            avatar: m.avatar,
            created_at: m.created_at,
            last_login: m.last_login,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: &'static str,
    pub user: UserResponse,
}

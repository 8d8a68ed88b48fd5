use axum::{Json, extract::Query, extract::State};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use tracing::instrument;
use uuid::Uuid;

use crate::discord::DiscordProfile;
use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::models::auth::{CallbackQuery, LoginResponse, LoginUrlResponse, UserResponse};
use crate::state::AppState;
use crate::utils::jwt;

#[utoipa::path(
    get,
    path = "/login",
    tag = "Auth",
    operation_id = "discordLogin",
    summary = "Get the Discord authorization URL",
    responses(
        (status = 200, description = "Redirect target", body = LoginUrlResponse),
    ),
)]
pub async fn discord_login(State(state): State<AppState>) -> Json<LoginUrlResponse> {
    Json(LoginUrlResponse {
        url: state.discord.authorize_url(),
    })
}

/// Upsert-on-login keyed by the Discord snowflake.
///
/// A single INSERT .. ON CONFLICT statement: the unique constraint on
/// `discord_id` arbitrates concurrent first logins, so both callers land on
/// the same row instead of racing a read-then-write.
pub async fn upsert_login(
    db: &DatabaseConnection,
    profile: &DiscordProfile,
) -> Result<user::Model, AppError> {
    let now = Utc::now();
    let model = user::ActiveModel {
        id: Set(Uuid::now_v7()),
        discord_id: Set(profile.id.clone()),
        username: Set(profile.username.clone()),
        discriminator: Set(profile.discriminator.clone()),
        avatar: Set(profile.avatar.clone()),
        created_at: Set(now),
        last_login: Set(Some(now)),
    };

    let user = user::Entity::insert(model)
        .on_conflict(
            OnConflict::column(user::Column::DiscordId)
                .update_columns([
                    user::Column::Username,
                    user::Column::Discriminator,
                    user::Column::Avatar,
                    user::Column::LastLogin,
                ])
                .to_owned(),
        )
        .exec_with_returning(db)
        .await?;

    Ok(user)
}

#[utoipa::path(
    get,
    path = "/callback",
    tag = "Auth",
    operation_id = "discordCallback",
    summary = "Complete the Discord OAuth flow",
    description = "Exchanges the authorization code, fetches the Discord profile, upserts the user (first login creates it, later logins refresh `last_login`), and returns a bearer token.",
    params(CallbackQuery),
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 502, description = "Discord unreachable or rejected the code (UPSTREAM_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn discord_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<LoginResponse>, AppError> {
    let access_token = state.discord.exchange_code(&query.code).await?;
    let profile = state.discord.fetch_profile(&access_token).await?;

    let user = upsert_login(&state.db, &profile).await?;

    let token = jwt::sign(user.id, &user.discord_id, &state.config.auth.jwt_secret)
        .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "bearer",
        user: UserResponse::from(user),
    }))
}

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::{EntityTrait, PaginatorTrait, QueryOrder};
use tracing::instrument;
use uuid::Uuid;

use crate::entity::prefab;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::prefab::*;
use crate::search::SearchPage;
use crate::state::AppState;

fn parse_prefab_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::Validation("Invalid prefab id".into()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Prefabs",
    operation_id = "createPrefab",
    summary = "Submit a new prefab",
    description = "Persists the prefab to the canonical store, then fans out into the search index and relationship graph. A derived-store failure still returns 201; the affected stages are listed in `pending_propagation`.",
    request_body = CreatePrefabRequest,
    responses(
        (status = 201, description = "Prefab created", body = CreatePrefabResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_prefab(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePrefabRequest>,
) -> Result<impl IntoResponse, AppError> {
    let receipt = state.writer.create(payload, auth_user.user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePrefabResponse {
            id: receipt.prefab.id,
            pending_propagation: receipt.propagation.pending().to_vec(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Prefabs",
    operation_id = "listPrefabs",
    summary = "List prefabs",
    description = "Returns prefabs from the canonical store, newest first, paginated.",
    params(PrefabListQuery),
    responses(
        (status = 200, description = "Page of prefabs", body = PrefabListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_prefabs(
    State(state): State<AppState>,
    Query(query): Query<PrefabListQuery>,
) -> Result<Json<PrefabListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let paginator = prefab::Entity::find()
        .order_by_desc(prefab::Column::CreatedAt)
        .paginate(&state.db, per_page);

    let total = paginator.num_items().await?;
    let total_pages = total.div_ceil(per_page);
    let data = paginator
        .fetch_page(page - 1)
        .await?
        .into_iter()
        .map(PrefabResponse::from)
        .collect();

    Ok(Json(PrefabListResponse {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

#[utoipa::path(
    get,
    path = "/search",
    tag = "Prefabs",
    operation_id = "searchPrefabs",
    summary = "Full-text and faceted prefab search",
    description = "Matches the term across name, creator username, description and content (weighted in that order) and applies the facet filters as exact-match conjunctions. Results are ranked by relevance; `total` counts all matches regardless of paging.",
    params(PrefabSearchQuery),
    responses(
        (status = 200, description = "Ranked matches", body = SearchPage),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 502, description = "Search backend unavailable (UPSTREAM_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(q = %query.q))]
pub async fn search_prefabs(
    State(state): State<AppState>,
    Query(query): Query<PrefabSearchQuery>,
) -> Result<Json<SearchPage>, AppError> {
    let request = query.into_request()?;
    let page = state.search.query(&request).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Prefabs",
    operation_id = "getPrefab",
    summary = "Get a prefab by ID",
    params(("id" = String, Path, description = "Prefab ID")),
    responses(
        (status = 200, description = "Prefab details", body = PrefabResponse),
        (status = 400, description = "Malformed id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Prefab not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id = %id))]
pub async fn get_prefab(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PrefabResponse>, AppError> {
    let prefab_id = parse_prefab_id(&id)?;

    let model = prefab::Entity::find_by_id(prefab_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Prefab not found".into()))?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Prefabs",
    operation_id = "updatePrefab",
    summary = "Partially update a prefab",
    description = "Sparse PATCH semantics: only supplied fields change. Restricted to the creator; a non-creator gets the same 404 as a missing prefab. The search document is rebuilt wholesale and stale graph edges are dropped.",
    params(("id" = String, Path, description = "Prefab ID")),
    request_body = UpdatePrefabRequest,
    responses(
        (status = 200, description = "Prefab updated", body = UpdatePrefabResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Not found or not the creator (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id = %id))]
pub async fn update_prefab(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdatePrefabRequest>,
) -> Result<Json<UpdatePrefabResponse>, AppError> {
    let prefab_id = parse_prefab_id(&id)?;

    let receipt = state
        .writer
        .update(prefab_id, payload, auth_user.user_id)
        .await?;

    Ok(Json(UpdatePrefabResponse {
        prefab: receipt.prefab.into(),
        pending_propagation: receipt.propagation.pending().to_vec(),
    }))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Prefabs",
    operation_id = "deletePrefab",
    summary = "Delete a prefab",
    description = "Hard-removes the prefab from the canonical store (creator only), then best-effort removes the search document and graph node.",
    params(("id" = String, Path, description = "Prefab ID")),
    responses(
        (status = 204, description = "Prefab deleted"),
        (status = 400, description = "Malformed id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Not found or not the creator (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id = %id))]
pub async fn delete_prefab(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let prefab_id = parse_prefab_id(&id)?;

    state.writer.delete(prefab_id, auth_user.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

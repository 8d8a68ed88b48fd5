use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::prefab;
use crate::error::AppError;
use crate::graph::{EdgeSpec, Relation};

/// Creator identity embedded in a search document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreatorRef {
    pub id: String,
    pub username: String,
}

/// Denormalized, disposable projection of a prefab for the full-text index.
///
/// Always rebuilt wholesale from the canonical record plus the creator's
/// current username; never patched incrementally, so the index cannot drift
/// field-by-field from the canonical store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SearchDocument {
    pub id: String,
    pub name: String,
    pub description: String,
    pub content: String,
    pub use_cases: Vec<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub licence_type: String,
    pub is_free: bool,
    pub creator: CreatorRef,
    pub created_at: DateTime<Utc>,
}

fn string_values(value: &serde_json::Value) -> Vec<String> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

/// Project a persisted prefab row into its search document.
///
/// Pure. Rejects a row without a persisted identifier and a blank creator
/// username, since the resulting document would be unaddressable or
/// unattributable.
pub fn build_search_document(
    prefab: &prefab::Model,
    creator_username: &str,
) -> Result<SearchDocument, AppError> {
    if prefab.id.is_nil() {
        return Err(AppError::Validation(
            "Prefab has no persisted identifier".into(),
        ));
    }
    let username = creator_username.trim();
    if username.is_empty() {
        return Err(AppError::Validation(
            "Creator username must not be empty".into(),
        ));
    }

    Ok(SearchDocument {
        id: prefab.id.to_string(),
        name: prefab.name.clone(),
        description: prefab.description.clone(),
        content: prefab.content.clone(),
        use_cases: string_values(&prefab.use_cases),
        categories: string_values(&prefab.categories),
        tags: string_values(&prefab.tags),
        licence_type: prefab.licence_type.clone(),
        is_free: prefab.is_free,
        creator: CreatorRef {
            id: prefab.creator_id.to_string(),
            username: username.to_string(),
        },
        created_at: prefab.created_at,
    })
}

/// Build the edge set linking a prefab to its use cases, categories and
/// tags. Pure and deterministic; ordering is irrelevant because every edge
/// is applied with merge semantics.
pub fn build_relationship_edges(
    prefab_id: Uuid,
    use_cases: &[String],
    categories: &[String],
    tags: &[String],
) -> Vec<EdgeSpec> {
    let id = prefab_id.to_string();
    let mut edges = Vec::with_capacity(use_cases.len() + categories.len() + tags.len());
    for (relation, names) in [
        (Relation::UsedFor, use_cases),
        (Relation::InCategory, categories),
        (Relation::HasTag, tags),
    ] {
        edges.extend(names.iter().map(|name| EdgeSpec {
            prefab_id: id.clone(),
            relation,
            target: name.clone(),
        }));
    }
    edges
}

/// Edge set for a prefab row as currently persisted.
pub fn edges_for(prefab: &prefab::Model) -> Vec<EdgeSpec> {
    build_relationship_edges(
        prefab.id,
        &string_values(&prefab.use_cases),
        &string_values(&prefab.categories),
        &string_values(&prefab.tags),
    )
}

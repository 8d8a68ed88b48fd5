use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::entity::prefab::{self, Category, ExternalLink, LicenceType, UseCase};
use crate::error::AppError;
use crate::search::SearchRequest;
use crate::writer::PropagationStage;

pub use super::shared::Pagination;

pub const MAX_NAME_CHARS: usize = 120;
pub const MAX_DESCRIPTION_CHARS: usize = 400;
pub const MAX_CONTENT_CHARS: usize = 4000;
pub const MAX_USE_CASES: usize = 2;
pub const MAX_CATEGORIES: usize = 8;
pub const MAX_TAGS: usize = 10;
pub const MAX_TAG_CHARS: usize = 32;
pub const MAX_EXTERNAL_LINKS: usize = 10;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreatePrefabRequest {
    pub name: String,
    pub description: String,
    pub content: String,
    pub use_cases: Vec<UseCase>,
    pub categories: Vec<Category>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub external_links: Vec<ExternalLink>,
    pub licence_type: LicenceType,
    pub is_free: bool,
}

/// Sparse patch: absent fields keep their stored value.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdatePrefabRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub use_cases: Option<Vec<UseCase>>,
    pub categories: Option<Vec<Category>>,
    pub tags: Option<Vec<String>>,
    pub external_links: Option<Vec<ExternalLink>>,
    pub licence_type: Option<LicenceType>,
    pub is_free: Option<bool>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PrefabResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub content: String,
    pub use_cases: Vec<UseCase>,
    pub categories: Vec<Category>,
    pub tags: Vec<String>,
    pub external_links: Vec<ExternalLink>,
    pub licence_type: String,
    pub is_free: bool,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

fn from_json<T: DeserializeOwned + Default>(value: serde_json::Value) -> T {
    serde_json::from_value(value).unwrap_or_default()
}

impl From<prefab::Model> for PrefabResponse {
    fn from(m: prefab::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            content: m.content,
            use_cases: from_json(m.use_cases),
            categories: from_json(m.categories),
            tags: from_json(m.tags),
            external_links: from_json(m.external_links),
            licence_type: m.licence_type,
            is_free: m.is_free,
            creator_id: m.creator_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Create response: the canonical identifier plus any derived-store stages
/// that failed and await reconciliation.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CreatePrefabResponse {
    pub id: Uuid,
    /// Empty on a fully consistent write; otherwise the prefab exists but
    /// is not yet discoverable or linked through the listed stages.
    pub pending_propagation: Vec<PropagationStage>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UpdatePrefabResponse {
    #[serde(flatten)]
    pub prefab: PrefabResponse,
    pub pending_propagation: Vec<PropagationStage>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct PrefabListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PrefabListResponse {
    pub data: Vec<PrefabResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct PrefabSearchQuery {
    /// Full-text term matched across name, creator, description and content.
    pub q: String,
    /// Comma-separated use-case filter, e.g. `Avatars,Osc`.
    pub use_cases: Option<String>,
    /// Comma-separated category filter.
    pub categories: Option<String>,
    pub is_free: Option<bool>,
    pub licence_type: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl PrefabSearchQuery {
    pub fn into_request(self) -> Result<SearchRequest, AppError> {
        let text = self.q.trim().to_string();
        if text.is_empty() {
            return Err(AppError::Validation("Search term must not be empty".into()));
        }

        Ok(SearchRequest {
            text,
            use_cases: split_csv(self.use_cases),
            categories: split_csv(self.categories),
            is_free: self.is_free,
            licence_type: self.licence_type,
            limit: self.limit.unwrap_or(20).clamp(1, 100),
            offset: self.offset.unwrap_or(0),
        })
    }
}

fn split_csv(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn validate_name(name: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::Validation(format!(
            "Name must be 1-{MAX_NAME_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), AppError> {
    if description.trim().is_empty() || description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(AppError::Validation(format!(
            "Description must be 1-{MAX_DESCRIPTION_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<(), AppError> {
    if content.trim().is_empty() || content.chars().count() > MAX_CONTENT_CHARS {
        return Err(AppError::Validation(format!(
            "Content must be 1-{MAX_CONTENT_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_use_cases(use_cases: &[UseCase]) -> Result<(), AppError> {
    if use_cases.is_empty() || use_cases.len() > MAX_USE_CASES {
        return Err(AppError::Validation(format!(
            "Between 1 and {MAX_USE_CASES} use cases required"
        )));
    }
    if use_cases.iter().collect::<HashSet<_>>().len() != use_cases.len() {
        return Err(AppError::Validation("Duplicate use case".into()));
    }
    Ok(())
}

fn validate_categories(categories: &[Category]) -> Result<(), AppError> {
    if categories.is_empty() || categories.len() > MAX_CATEGORIES {
        return Err(AppError::Validation(format!(
            "Between 1 and {MAX_CATEGORIES} categories required"
        )));
    }
    if categories.iter().collect::<HashSet<_>>().len() != categories.len() {
        return Err(AppError::Validation("Duplicate category".into()));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<(), AppError> {
    if tags.len() > MAX_TAGS {
        return Err(AppError::Validation(format!("At most {MAX_TAGS} tags allowed")));
    }
    let mut seen = HashSet::new();
    for tag in tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() || trimmed.chars().count() > MAX_TAG_CHARS {
            return Err(AppError::Validation(format!(
                "Tags must be 1-{MAX_TAG_CHARS} characters"
            )));
        }
        if !seen.insert(trimmed.to_lowercase()) {
            return Err(AppError::Validation(format!("Duplicate tag '{trimmed}'")));
        }
    }
    Ok(())
}

fn validate_external_links(links: &[ExternalLink]) -> Result<(), AppError> {
    if links.len() > MAX_EXTERNAL_LINKS {
        return Err(AppError::Validation(format!(
            "At most {MAX_EXTERNAL_LINKS} external links allowed"
        )));
    }
    for link in links {
        let parsed = Url::parse(&link.url)
            .map_err(|_| AppError::Validation(format!("Invalid external link URL '{}'", link.url)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::Validation(format!(
                "External link URL must be absolute http(s), got '{}'",
                link.url
            )));
        }
    }
    Ok(())
}

pub fn validate_create_prefab(req: &CreatePrefabRequest) -> Result<(), AppError> {
    validate_name(&req.name)?;
    validate_description(&req.description)?;
    validate_content(&req.content)?;
    validate_use_cases(&req.use_cases)?;
    validate_categories(&req.categories)?;
    validate_tags(&req.tags)?;
    validate_external_links(&req.external_links)?;
    Ok(())
}

pub fn validate_update_prefab(req: &UpdatePrefabRequest) -> Result<(), AppError> {
    if *req == UpdatePrefabRequest::default() {
        return Err(AppError::Validation("No fields provided for update".into()));
    }
    if let Some(ref name) = req.name {
        validate_name(name)?;
    }
    if let Some(ref description) = req.description {
        validate_description(description)?;
    }
    if let Some(ref content) = req.content {
        validate_content(content)?;
    }
    if let Some(ref use_cases) = req.use_cases {
        validate_use_cases(use_cases)?;
    }
    if let Some(ref categories) = req.categories {
        validate_categories(categories)?;
    }
    if let Some(ref tags) = req.tags {
        validate_tags(tags)?;
    }
    if let Some(ref links) = req.external_links {
        validate_external_links(links)?;
    }
    Ok(())
}

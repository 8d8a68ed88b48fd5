use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Where a prefab is meant to be dropped in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
pub enum UseCase {
    Worlds,
    Avatars,
    Osc,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
pub enum Category {
    #[serde(rename = "3D Models")]
    Models3d,
    Animations,
    Materials,
    Audio,
    #[serde(rename = "Visual Effects")]
    VisualEffects,
    Particles,
    Tooling,
    Lighting,
    #[serde(rename = "UI")]
    Ui,
    Udon,
    Shaders,
}

/// Storefronts and repositories a prefab can link out to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
pub enum LinkType {
    Gumroad,
    Booth,
    Jinxy,
    Github,
    Gitlab,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum LicenceType {
    #[serde(rename = "Open Source")]
    OpenSource,
    Proprietary,
    Custom,
}

impl LicenceType {
    pub fn as_str(self) -> &'static str {
        match self {
            LicenceType::OpenSource => "Open Source",
            LicenceType::Proprietary => "Proprietary",
            LicenceType::Custom => "Custom",
        }
    }
}

/// A typed outbound link. The URL must be absolute http(s).
/// Stored as part of a JSON array on the prefab row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ExternalLink {
    #[serde(rename = "type")]
    pub link_type: LinkType,
    pub url: String,
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "prefab")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,
    pub description: String,
    /// Long-form body, in Markdown.
    pub content: String,

    /// JSON array of UseCase values, at most two.
    #[sea_orm(column_type = "JsonBinary")]
    pub use_cases: serde_json::Value,
    /// JSON array of Category values.
    #[sea_orm(column_type = "JsonBinary")]
    pub categories: serde_json::Value,
    /// JSON array of free-form tag strings.
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: serde_json::Value,
    /// JSON array of {type, url} objects.
    #[sea_orm(column_type = "JsonBinary")]
    pub external_links: serde_json::Value,

    /// One of: Open Source, Proprietary, Custom.
    pub licence_type: String,
    pub is_free: bool,

    /// Immutable after creation; every mutating statement filters on it.
    pub creator_id: Uuid,
    #[sea_orm(belongs_to, from = "creator_id", to = "id")]
    pub creator: HasOne<super::user::Entity>,

    pub created_at: DateTimeUtc,
    /// NULL until the first partial update.
    pub updated_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}

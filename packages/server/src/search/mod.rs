mod opensearch;

pub use opensearch::OpenSearchGateway;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::projection::SearchDocument;

/// Errors from the secondary full-text store.
#[derive(Debug, thiserror::Error)]
pub enum SearchIndexError {
    #[error("search backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("search backend returned {status}: {body}")]
    Backend { status: u16, body: String },
    #[error("unexpected search response shape: {0}")]
    Decode(String),
}

/// Full-text fields and their relative weights, highest first.
pub const WEIGHTED_FIELDS: [&str; 4] =
    ["name^4", "creator.username^3", "description^2", "content"];

/// A fully-parsed faceted query issued by the read path.
///
/// Facet filters are exact-match conjunctions; the text term is matched
/// across the weighted fields and ranked by the engine.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub text: String,
    pub use_cases: Vec<String>,
    pub categories: Vec<String>,
    pub is_free: Option<bool>,
    pub licence_type: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SearchHit {
    /// Relevance score assigned by the engine.
    pub score: f64,
    #[serde(flatten)]
    pub document: SearchDocument,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SearchPage {
    /// Total matches across the whole index, independent of the page window.
    pub total: u64,
    pub results: Vec<SearchHit>,
}

#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Replace whatever document currently sits at `id`.
    async fn upsert(&self, id: &str, document: &SearchDocument) -> Result<(), SearchIndexError>;

    /// Remove the document at `id`. An absent id is not an error.
    async fn delete(&self, id: &str) -> Result<(), SearchIndexError>;

    async fn query(&self, request: &SearchRequest) -> Result<SearchPage, SearchIndexError>;
}

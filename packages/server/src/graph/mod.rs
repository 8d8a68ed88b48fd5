mod neo4j;

pub use neo4j::Neo4jGateway;

use async_trait::async_trait;

/// Errors from the relationship graph store.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("graph backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("graph backend returned {status}: {body}")]
    Backend { status: u16, body: String },
    #[error("cypher statement failed: {0}")]
    Statement(String),
}

/// Relationship kinds radiating from a prefab node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    UsedFor,
    InCategory,
    HasTag,
}

impl Relation {
    pub const ALL: [Relation; 3] = [Relation::UsedFor, Relation::InCategory, Relation::HasTag];

    /// Edge type as written into the graph.
    pub fn rel_type(self) -> &'static str {
        match self {
            Relation::UsedFor => "USED_FOR",
            Relation::InCategory => "IN_CATEGORY",
            Relation::HasTag => "HAS_TAG",
        }
    }

    /// Label of the node on the far side of the edge.
    pub fn node_label(self) -> &'static str {
        match self {
            Relation::UsedFor => "UseCase",
            Relation::InCategory => "Category",
            Relation::HasTag => "Tag",
        }
    }
}

/// One prefab-to-taxonomy edge. Applying the same edge twice must leave the
/// graph exactly as one application would.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeSpec {
    pub prefab_id: String,
    pub relation: Relation,
    pub target: String,
}

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Merge endpoint nodes and the edges between them. Repeat-safe.
    async fn apply_edges(&self, edges: &[EdgeSpec]) -> Result<(), GraphError>;

    /// Merge `edges`, then drop every other edge radiating from `prefab_id`.
    /// Used on update so removed tags/categories do not linger in the graph.
    async fn replace_edges(&self, prefab_id: &str, edges: &[EdgeSpec]) -> Result<(), GraphError>;

    /// Detach and delete the prefab node together with all its edges.
    async fn remove_prefab(&self, prefab_id: &str) -> Result<(), GraphError>;
}

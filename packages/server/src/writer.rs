use std::sync::Arc;

use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Serialize;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::entity::{prefab, user};
use crate::error::AppError;
use crate::graph::GraphStore;
use crate::models::prefab::{
    CreatePrefabRequest, UpdatePrefabRequest, validate_create_prefab, validate_update_prefab,
};
use crate::projection::{build_search_document, edges_for};
use crate::search::SearchIndex;

/// Derived-store stages that can fail independently of the canonical write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PropagationStage {
    SearchIndex,
    Graph,
}

/// Outcome of the best-effort fan-out into the derived stores.
///
/// Empty means the prefab is fully discoverable and linked; any entry marks
/// a degraded success whose stage awaits an external reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct PropagationReport {
    pending: Vec<PropagationStage>,
}

impl PropagationReport {
    fn record(&mut self, stage: PropagationStage, prefab_id: Uuid, error: impl std::fmt::Display) {
        warn!(%prefab_id, ?stage, %error, "propagation failed, awaiting reconciliation");
        self.pending.push(stage);
    }

    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> &[PropagationStage] {
        &self.pending
    }
}

/// A canonical write that succeeded, plus its propagation outcome.
#[derive(Debug)]
pub struct WriteReceipt {
    pub prefab: prefab::Model,
    pub propagation: PropagationReport,
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}

/// Orchestrates prefab create/update/delete across the canonical store, the
/// search index and the relationship graph.
///
/// No transaction spans the three stores. The canonical store always commits
/// first, under a filter that resolves ownership and existence in a single
/// atomic statement, and is never rolled back afterwards; the derived stores
/// are then updated best-effort. A derived-store failure is logged, reported
/// in the receipt, and never turned into a request error.
#[derive(Clone)]
pub struct PrefabWriter {
    db: DatabaseConnection,
    search: Arc<dyn SearchIndex>,
    graph: Arc<dyn GraphStore>,
}

impl PrefabWriter {
    pub fn new(
        db: DatabaseConnection,
        search: Arc<dyn SearchIndex>,
        graph: Arc<dyn GraphStore>,
    ) -> Self {
        Self { db, search, graph }
    }

    #[instrument(skip(self, payload), fields(creator_id = %creator_id))]
    pub async fn create(
        &self,
        payload: CreatePrefabRequest,
        creator_id: Uuid,
    ) -> Result<WriteReceipt, AppError> {
        validate_create_prefab(&payload)?;

        let new_prefab = prefab::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(payload.name.trim().to_string()),
            description: Set(payload.description),
            content: Set(payload.content),
            use_cases: Set(to_json(&payload.use_cases)?),
            categories: Set(to_json(&payload.categories)?),
            tags: Set(to_json(&payload.tags)?),
            external_links: Set(to_json(&payload.external_links)?),
            licence_type: Set(payload.licence_type.as_str().to_string()),
            is_free: Set(payload.is_free),
            creator_id: Set(creator_id),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        // Commit point: from here the prefab exists even if every later
        // step fails.
        let model = new_prefab.insert(&self.db).await?;

        let username = self.creator_username(creator_id).await?;
        let propagation = self.propagate_upsert(model.clone(), username, false).await;

        Ok(WriteReceipt {
            prefab: model,
            propagation,
        })
    }

    #[instrument(skip(self, patch), fields(prefab_id = %prefab_id, caller = %caller_id))]
    pub async fn update(
        &self,
        prefab_id: Uuid,
        patch: UpdatePrefabRequest,
        caller_id: Uuid,
    ) -> Result<WriteReceipt, AppError> {
        validate_update_prefab(&patch)?;

        // The id+creator filter resolves existence and ownership in the same
        // atomic statement as the write, so there is no window for a
        // check-then-act race and non-owners cannot distinguish "absent"
        // from "not yours".
        let mut update = prefab::Entity::update_many()
            .filter(prefab::Column::Id.eq(prefab_id))
            .filter(prefab::Column::CreatorId.eq(caller_id));

        if let Some(ref name) = patch.name {
            update = update.col_expr(prefab::Column::Name, Expr::value(name.trim().to_string()));
        }
        if let Some(description) = patch.description {
            update = update.col_expr(prefab::Column::Description, Expr::value(description));
        }
        if let Some(content) = patch.content {
            update = update.col_expr(prefab::Column::Content, Expr::value(content));
        }
        if let Some(ref use_cases) = patch.use_cases {
            update = update.col_expr(prefab::Column::UseCases, Expr::value(to_json(use_cases)?));
        }
        if let Some(ref categories) = patch.categories {
            update = update.col_expr(prefab::Column::Categories, Expr::value(to_json(categories)?));
        }
        if let Some(ref tags) = patch.tags {
            update = update.col_expr(prefab::Column::Tags, Expr::value(to_json(tags)?));
        }
        if let Some(ref links) = patch.external_links {
            update = update.col_expr(prefab::Column::ExternalLinks, Expr::value(to_json(links)?));
        }
        if let Some(licence_type) = patch.licence_type {
            update = update.col_expr(
                prefab::Column::LicenceType,
                Expr::value(licence_type.as_str()),
            );
        }
        if let Some(is_free) = patch.is_free {
            update = update.col_expr(prefab::Column::IsFree, Expr::value(is_free));
        }
        update = update.col_expr(prefab::Column::UpdatedAt, Expr::value(Utc::now()));

        let updated = update.exec_with_returning(&self.db).await?;
        // At most one row: the filter covers the full primary key.
        let model = updated
            .into_iter()
            .next()
            .ok_or(AppError::NotFoundOrForbidden)?;

        let username = self.creator_username(model.creator_id).await?;
        let propagation = self.propagate_upsert(model.clone(), username, true).await;

        Ok(WriteReceipt {
            prefab: model,
            propagation,
        })
    }

    #[instrument(skip(self), fields(prefab_id = %prefab_id, caller = %caller_id))]
    pub async fn delete(
        &self,
        prefab_id: Uuid,
        caller_id: Uuid,
    ) -> Result<PropagationReport, AppError> {
        let result = prefab::Entity::delete_many()
            .filter(prefab::Column::Id.eq(prefab_id))
            .filter(prefab::Column::CreatorId.eq(caller_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFoundOrForbidden);
        }

        Ok(self.propagate_delete(prefab_id).await)
    }

    async fn creator_username(&self, creator_id: Uuid) -> Result<String, AppError> {
        let creator = user::Entity::find_by_id(creator_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Creator not found".into()))?;
        Ok(creator.username)
    }

    /// Push the search document and graph edges for `model`.
    ///
    /// Runs in a spawned task whose handle is awaited: if the calling
    /// request future is dropped after the canonical commit, the fan-out
    /// still runs to completion. `replace` selects edge replacement
    /// (update) over plain merge (create).
    async fn propagate_upsert(
        &self,
        model: prefab::Model,
        creator_username: String,
        replace: bool,
    ) -> PropagationReport {
        let search = Arc::clone(&self.search);
        let graph = Arc::clone(&self.graph);
        let prefab_id = model.id;

        let handle = tokio::spawn(async move {
            let mut report = PropagationReport::default();

            match build_search_document(&model, &creator_username) {
                Ok(document) => {
                    if let Err(error) = search.upsert(&document.id, &document).await {
                        report.record(PropagationStage::SearchIndex, prefab_id, error);
                    }
                }
                Err(error) => {
                    report.record(PropagationStage::SearchIndex, prefab_id, error);
                }
            }

            let edges = edges_for(&model);
            let result = if replace {
                graph.replace_edges(&prefab_id.to_string(), &edges).await
            } else {
                graph.apply_edges(&edges).await
            };
            if let Err(error) = result {
                report.record(PropagationStage::Graph, prefab_id, error);
            }

            report
        });

        match handle.await {
            Ok(report) => report,
            Err(join_error) => Self::all_pending(prefab_id, join_error),
        }
    }

    async fn propagate_delete(&self, prefab_id: Uuid) -> PropagationReport {
        let search = Arc::clone(&self.search);
        let graph = Arc::clone(&self.graph);

        let handle = tokio::spawn(async move {
            let mut report = PropagationReport::default();
            let id = prefab_id.to_string();

            if let Err(error) = search.delete(&id).await {
                report.record(PropagationStage::SearchIndex, prefab_id, error);
            }
            if let Err(error) = graph.remove_prefab(&id).await {
                report.record(PropagationStage::Graph, prefab_id, error);
            }

            report
        });

        match handle.await {
            Ok(report) => report,
            Err(join_error) => Self::all_pending(prefab_id, join_error),
        }
    }

    /// The propagation task itself died; nothing was confirmed, so report
    /// every stage as pending.
    fn all_pending(prefab_id: Uuid, error: impl std::fmt::Display) -> PropagationReport {
        let mut report = PropagationReport::default();
        report.record(PropagationStage::SearchIndex, prefab_id, &error);
        report.record(PropagationStage::Graph, prefab_id, &error);
        report
    }
}

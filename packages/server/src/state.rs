use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::discord::DiscordClient;
use crate::graph::GraphStore;
use crate::search::SearchIndex;
use crate::writer::PrefabWriter;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub search: Arc<dyn SearchIndex>,
    pub graph: Arc<dyn GraphStore>,
    pub discord: Arc<DiscordClient>,
    pub writer: PrefabWriter,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        search: Arc<dyn SearchIndex>,
        graph: Arc<dyn GraphStore>,
        discord: Arc<DiscordClient>,
        config: AppConfig,
    ) -> Self {
        let writer = PrefabWriter::new(db.clone(), Arc::clone(&search), Arc::clone(&graph));
        Self {
            db,
            search,
            graph,
            discord,
            writer,
            config,
        }
    }
}

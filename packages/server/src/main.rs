use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{Level, info, warn};

use server::config::AppConfig;
use server::database::init_db;
use server::discord::DiscordClient;
use server::graph::Neo4jGateway;
use server::search::OpenSearchGateway;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    let db = init_db(&config.database.url).await?;

    let search = OpenSearchGateway::new(&config.search.url, &config.search.index);
    // The canonical store is authoritative; a down search cluster at boot
    // only delays discoverability, it does not block serving.
    if let Err(error) = search.ensure_index().await {
        warn!(%error, "search index mapping not ensured, continuing");
    }

    let graph = Neo4jGateway::new(
        &config.graph.url,
        &config.graph.database,
        &config.graph.username,
        &config.graph.password,
    );

    let discord = DiscordClient::new(config.discord.clone());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = AppState::new(
        db,
        Arc::new(search),
        Arc::new(graph),
        Arc::new(discord),
        config,
    );
    let app = server::build_router(state);

    info!("Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth/discord", auth_routes())
        .nest("/users", user_routes())
        .nest("/prefabs", prefab_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::discord_login))
        .routes(routes!(handlers::auth::discord_callback))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::user::me))
}

fn prefab_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::prefab::list_prefabs,
            handlers::prefab::create_prefab
        ))
        .routes(routes!(handlers::prefab::search_prefabs))
        .routes(routes!(
            handlers::prefab::get_prefab,
            handlers::prefab::update_prefab,
            handlers::prefab::delete_prefab
        ))
}

mod auxiliary;
mod chat;
mod configs;
mod error;
mod problems;
mod prompts;

use crate::{application::Application, config::AppConfigAdminApi, jwt_auth::JwtAuthLayer};

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tracing::info;

pub fn routes(config_admin_api: &AppConfigAdminApi) -> Router<Application> {
    let mut api_routes = Router::new()
        .route("/health", get(auxiliary::health))
        .route("/key", get(auxiliary::public_key))
        .route("/configs", get(configs::list).post(configs::create))
        .route("/configs/active", get(configs::active))
        .route("/configs/select", post(configs::select))
        .route("/configs/{id}", axum::routing::put(configs::update).delete(configs::remove))
        .route("/problems", get(problems::list).post(problems::create))
        .route(
            "/problems/{id}",
            get(problems::show).put(problems::update).delete(problems::remove),
        )
        .route("/prompts", get(prompts::list).post(prompts::append))
        .route("/prompts/current", get(prompts::current))
        .route("/chat/diagnose", post(chat::diagnose));

    // JWT Auth
    if let Some(auth_config) = &config_admin_api.jwt_auth {
        api_routes = api_routes.layer(JwtAuthLayer::new(auth_config));
        info!("JWT authentication enabled");
    }
    // CORS
    if let Some(cors_config) = &config_admin_api.cors {
        let header_origin: Vec<_> = cors_config
            .allowed_origins
            .iter()
            .map(|o| o.parse().expect("invalid origin"))
            .collect();
        let cors_layer = CorsLayer::new().allow_origin(header_origin).allow_credentials(true);
        api_routes = api_routes.layer(cors_layer);
        info!("CORS setting applied");
    }

    Router::new().nest("/api", api_routes)
}

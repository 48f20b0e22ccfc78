//! Summitdesk API composition root.

#![forbid(unsafe_code)]

mod config;
mod dto;
mod error;
mod handlers;
mod middleware;
mod sessions;
mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use summitdesk_application::{
    DataStoreClient, LeaderboardConfig, LeaderboardService, NameResolver, NametagService,
    PlayerService,
};
use summitdesk_core::AppError;
use summitdesk_infrastructure::{
    DataStoreSnapshotStore, InMemoryLeaderboardCache, RobloxDataStoreClient, RobloxDataStoreConfig,
    RobloxUsersClient,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ApiConfig;
use crate::sessions::SessionStore;
use crate::state::AppState;

/// Datastore that holds the persisted leaderboard snapshot.
const CACHE_DATASTORE_NAME: &str = "LeaderboardCache";

/// Datastore that holds per-player nametag prefixes.
const NAMETAG_DATASTORE_NAME: &str = "NameTagPrefix_Custom_v1";

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    config::init_tracing();

    let api_config = ApiConfig::load()?;
    let leaderboard_config = LeaderboardConfig::default();

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    let player_datastore: Arc<dyn DataStoreClient> = Arc::new(RobloxDataStoreClient::new(
        http.clone(),
        RobloxDataStoreConfig {
            api_key: api_config.roblox_api_key.clone(),
            universe_id: api_config.universe_id.clone(),
            datastore_name: api_config.datastore_name.clone(),
            scope: api_config.datastore_scope.clone(),
        },
    ));
    let cache_datastore: Arc<dyn DataStoreClient> = Arc::new(RobloxDataStoreClient::new(
        http.clone(),
        RobloxDataStoreConfig {
            api_key: api_config.roblox_api_key.clone(),
            universe_id: api_config.universe_id.clone(),
            datastore_name: CACHE_DATASTORE_NAME.to_owned(),
            scope: api_config.datastore_scope.clone(),
        },
    ));
    let nametag_datastore: Arc<dyn DataStoreClient> = Arc::new(RobloxDataStoreClient::new(
        http.clone(),
        RobloxDataStoreConfig {
            api_key: api_config.roblox_api_key.clone(),
            universe_id: api_config.universe_id.clone(),
            datastore_name: NAMETAG_DATASTORE_NAME.to_owned(),
            scope: api_config.datastore_scope.clone(),
        },
    ));
    let names: Arc<dyn NameResolver> = Arc::new(RobloxUsersClient::new(
        http,
        leaderboard_config.max_retries,
        leaderboard_config.retry_base_delay,
    ));

    let cache = Arc::new(InMemoryLeaderboardCache::new(leaderboard_config.ttl));
    let snapshot_store = Arc::new(DataStoreSnapshotStore::new(
        Arc::clone(&cache_datastore),
        leaderboard_config.max_retries,
        leaderboard_config.retry_base_delay,
    ));

    let app_state = AppState {
        leaderboard_service: LeaderboardService::new(
            Arc::clone(&player_datastore),
            Arc::clone(&names),
            cache,
            snapshot_store,
            leaderboard_config,
        ),
        player_service: PlayerService::new(player_datastore, Arc::clone(&names)),
        nametag_service: NametagService::new(nametag_datastore, names),
        sessions: Arc::new(SessionStore::new()),
        admin_password: api_config.admin_password.clone(),
    };

    let protected_routes = Router::new()
        .route(
            "/api/leaderboard",
            get(handlers::leaderboard::leaderboard_handler),
        )
        .route("/api/players", get(handlers::players::list_players_handler))
        .route(
            "/api/players/{player}",
            get(handlers::players::get_player_handler)
                .put(handlers::players::save_player_handler)
                .delete(handlers::players::delete_player_handler),
        )
        .route(
            "/api/nametag/{player}",
            get(handlers::nametags::get_nametag_handler)
                .post(handlers::nametags::save_nametag_handler)
                .put(handlers::nametags::save_nametag_handler)
                .delete(handlers::nametags::delete_nametag_handler),
        )
        .route("/auth/session", get(handlers::auth::session_handler))
        .route("/auth/logout", post(handlers::auth::logout_handler))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&api_config.frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/login", post(handlers::auth::login_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state);

    let address = api_config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "summitdesk-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

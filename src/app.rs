use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::Store;
use crate::handlers;
use crate::middleware::jwt_auth_middleware;
use crate::services::{KittenCatalog, RatingLedger, UserService};

/// Shared handles for every request. All fields are cheap clones over one pool.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Store,
    pub users: UserService,
    pub tokens: TokenService,
    pub catalog: KittenCatalog,
    pub ledger: RatingLedger,
}

impl AppState {
    pub fn new(config: AppConfig, store: Store) -> Self {
        let catalog = KittenCatalog::new(store.clone());
        Self {
            tokens: TokenService::new(store.clone(), &config.security),
            users: UserService::new(store.clone(), config.security.password_rounds),
            ledger: RatingLedger::new(store.clone(), catalog.clone()),
            catalog,
            config: Arc::new(config),
            store,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(auth_routes())
        .merge(kitten_routes())
        .merge(rating_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected API
        .merge(protected)
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(cors_layer(&state.config))
                .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes)),
        )
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/api/register", post(auth::register_post))
        .route("/api/login", post(auth::login_post))
        .route("/api/token/refresh", post(auth::refresh_post))
}

fn auth_routes() -> Router<AppState> {
    use handlers::protected::auth;

    Router::new()
        .route("/api/logout", post(auth::logout_post))
        .route("/api/auth/whoami", get(auth::whoami_get))
}

fn kitten_routes() -> Router<AppState> {
    use handlers::protected::kittens;

    Router::new()
        .route(
            "/api/kittens",
            get(kittens::kittens_get).post(kittens::kittens_post),
        )
        .route("/api/kittens/colors", get(kittens::colors_get))
        .route("/api/kittens/breeds", get(kittens::breeds_get))
        .route(
            "/api/kittens/:id",
            get(kittens::kitten_get)
                .put(kittens::kitten_put)
                .patch(kittens::kitten_patch)
                .delete(kittens::kitten_delete),
        )
}

fn rating_routes() -> Router<AppState> {
    use handlers::protected::ratings;

    Router::new().route(
        "/api/kittens/:id/ratings",
        get(ratings::ratings_get)
            .post(ratings::rating_post)
            .put(ratings::rating_put)
            .delete(ratings::rating_delete),
    )
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Kitten API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Kitten listings with per-user ratings",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/api/register, /api/login, /api/token/refresh (public)",
                "session": "/api/logout, /api/auth/whoami (protected)",
                "kittens": "/api/kittens[/:id], /api/kittens/colors, /api/kittens/breeds (protected)",
                "ratings": "/api/kittens/:id/ratings (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}

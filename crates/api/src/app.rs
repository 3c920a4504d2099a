use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::warn;

use persistence::changes::ChangeFeed;

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, require_user_auth};
use crate::routes::{assistant, auth, health, hubs, medications, navigation, profiles, sync};
use crate::services::assistant::{
    CareLineCache, CompletionApi, DisabledCompletionApi, GeminiClient,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub changes: ChangeFeed,
    pub assistant: Arc<dyn CompletionApi>,
    pub care_line: Arc<CareLineCache>,
}

/// Builds the completion provider from config. A disabled or misconfigured
/// assistant degrades to a provider that refuses, not a startup failure.
fn build_assistant(config: &Config) -> Arc<dyn CompletionApi> {
    if !config.assistant.enabled {
        return Arc::new(DisabledCompletionApi);
    }
    match GeminiClient::new(&config.assistant) {
        Ok(client) => Arc::new(client),
        Err(err) => {
            warn!(error = %err, "Failed to build completion client, assistant disabled");
            Arc::new(DisabledCompletionApi)
        }
    }
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        pool,
        assistant: build_assistant(&config),
        config: config.clone(),
        changes: ChangeFeed::new(),
        care_line: Arc::new(CareLineCache::new()),
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Production: only allow specified origins
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Protected routes (require a valid user access token)
    let protected_routes = Router::new()
        // Profile (v1)
        .route("/api/v1/profile", get(profiles::get_profile))
        .route("/api/v1/profile", put(profiles::update_profile))
        // Hub membership (v1)
        .route("/api/v1/hubs", post(hubs::create_hub))
        .route("/api/v1/hubs/join", post(hubs::join_hub))
        .route("/api/v1/hubs/current", get(hubs::current_hub))
        .route(
            "/api/v1/hubs/:hub_id/requests/:user_id/approve",
            post(hubs::approve_request),
        )
        .route(
            "/api/v1/hubs/:hub_id/requests/:user_id/decline",
            post(hubs::decline_request),
        )
        .route("/api/v1/hubs/:hub_id/cancel", post(hubs::cancel_request))
        .route("/api/v1/hubs/:hub_id/leave", post(hubs::leave_hub))
        // Medication board (v1)
        .route(
            "/api/v1/hubs/:hub_id/medications",
            get(medications::list_medications),
        )
        .route(
            "/api/v1/hubs/:hub_id/medications",
            post(medications::create_medication),
        )
        .route(
            "/api/v1/medications/:id",
            put(medications::update_medication),
        )
        .route(
            "/api/v1/medications/:id",
            delete(medications::delete_medication),
        )
        .route(
            "/api/v1/medications/:id/toggle-taken",
            post(medications::toggle_taken),
        )
        // Assistant (v1)
        .route("/api/v1/assistant/chat", post(assistant::chat))
        .route("/api/v1/assistant/extract", post(assistant::extract))
        .route("/api/v1/assistant/care-line", get(assistant::care_line))
        // Live sync (v1)
        .route("/api/v1/sync/events", get(sync::events))
        // Navigation (v1)
        .route("/api/v1/navigation/route", post(navigation::route))
        // Verification requests need a logged-in account
        .route(
            "/api/v1/auth/request-verification",
            post(auth::request_verification),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    // Auth routes (no token required)
    let auth_routes = Router::new()
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/forgot-password", post(auth::forgot_password))
        .route("/api/v1/auth/reset-password", post(auth::reset_password))
        .route("/api/v1/auth/verify-email", post(auth::verify_email));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    // Merge all routes
    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(protected_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware)) // Prometheus metrics
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let config = Config::load_for_test(&[("database.url", "postgres://localhost/test")])
            .expect("test config should load");
        // Lazy pool: these routes never reach the database
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/test")
            .expect("lazy pool");
        create_app(config, pool)
    }

    #[tokio::test]
    async fn test_liveness_probe_responds() {
        let app = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health/live")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_route_rejects_missing_token() {
        let app = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/profile")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/nonsense")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

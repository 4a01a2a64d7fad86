/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use taskboard_api::{app::AppState, config::Config};
/// use taskboard_shared::realtime::RealtimeHub;
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let hub = Arc::new(RealtimeHub::new(config.realtime.channel_capacity));
/// let state = AppState::new(pool, config, hub);
/// let app = taskboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{
        access::{authorize_project_access, authorize_tenant_access},
        security::SecurityHeadersLayer,
    },
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use taskboard_shared::{auth::middleware, realtime::RealtimeHub};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler through Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub realtime: Arc<RealtimeHub>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, realtime: Arc<RealtimeHub>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            realtime,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                                   (public)
/// └── /api
///     ├── /auth
///     │   ├── POST /register                         (public)
///     │   ├── POST /login                            (public)
///     │   └── GET  /profile
///     ├── GET|POST /tenants
///     ├── /tenants/:tenant_id                        [tenant access]
///     │   ├── GET  /
///     │   ├── GET|POST /users                        (POST: admin only)
///     │   ├── GET|POST /projects
///     │   └── /projects/:project_id                  [project scope]
///     │       ├── GET /
///     │       ├── GET|POST /statuses
///     │       ├── GET|POST /tasks
///     │       └── GET|PUT|DELETE /tasks/:task_id
///     └── GET /ws                                    (token in header or ?token=)
/// ```
///
/// # Middleware Stack
///
/// Outermost first: security headers, CORS, request tracing, then per
/// route JWT authentication, tenant access and project scope.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_auth_routes = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login));

    let project_routes = Router::new()
        .route("/", get(routes::projects::get_project))
        .route(
            "/statuses",
            get(routes::statuses::list_statuses).post(routes::statuses::create_status),
        )
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/:task_id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route_layer(from_fn_with_state(state.clone(), authorize_project_access));

    let tenant_routes = Router::new()
        .route("/", get(routes::tenants::get_tenant))
        .route(
            "/users",
            get(routes::tenants::list_members).post(routes::tenants::add_user_to_tenant),
        )
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .nest("/projects/:project_id", project_routes)
        .route_layer(from_fn_with_state(state.clone(), authorize_tenant_access));

    let protected_routes = Router::new()
        .route("/auth/profile", get(routes::auth::profile))
        .route(
            "/tenants",
            get(routes::tenants::list_tenants).post(routes::tenants::create_tenant),
        )
        .nest("/tenants/:tenant_id", tenant_routes)
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    let api_routes = Router::new()
        .merge(public_auth_routes)
        .route("/ws", get(routes::realtime::ws_handler))
        .merge(protected_routes);

    let cors = if state.config.cors_permissive() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Validates the bearer token and injects [`AuthContext`](middleware::AuthContext)
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = middleware::bearer_token(req.headers())?;
    let auth_context = middleware::authenticate(token, state.jwt_secret())?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

async fn not_found() -> impl IntoResponse {
    (
        axum::http::StatusCode::NOT_FOUND,
        Json(json!({
            "error": "not_found",
            "message": "Resource not found",
        })),
    )
}

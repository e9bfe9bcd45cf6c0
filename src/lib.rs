use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod access;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod seed;
pub mod session;

// Routing split by access requirement (Public, Members).
pub mod routes;
use error::ApiError;
use routes::{members, public};
use session::Session;

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{RepositoryState, SqliteRepository};
pub use session::SessionStore;

/// ApiDoc
///
/// Generates the OpenAPI document served at `/api-docs/openapi.json` from the
/// `#[utoipa::path]` annotations on the handlers and the `ToSchema` models.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::clear_session, handlers::get_articles, handlers::get_article,
        handlers::login, handlers::logout, handlers::check_session,
        handlers::get_member_only_articles, handlers::get_member_only_article,
    ),
    components(
        schemas(
            models::Article, models::User, models::LoginRequest,
            models::MessageResponse, models::ErrorResponse,
        )
    ),
    tags(
        (name = "article-gate", description = "Articles with member-only content and metered anonymous views")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container for the application's services and configuration,
/// cloned into every request.
#[derive(Clone)]
pub struct AppState {
    /// Persistence: articles and users.
    pub repo: RepositoryState,
    /// Server-side session slots keyed by the id inside the session cookie.
    pub sessions: SessionStore,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let extractors (notably `Session`) pull just the component they need.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(app_state: &AppState) -> SessionStore {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// members_gate
///
/// Guards the members router: anonymous sessions are answered with
/// `401 {"message": "Unauthorized"}` before the handler runs.
async fn members_gate(session: Session, request: Request, next: Next) -> Result<Response, ApiError> {
    access::require_member(&session.data)?;
    Ok(next.run(request).await)
}

/// create_router
///
/// Assembles the routing structure, applies the members gate and the global
/// observability/cookie layers, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            members::members_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), members_gate)),
        )
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: one span per request, tagged with the request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id))
                // 3d. Cookie jar for the `Session` extractor.
                .layer(CookieManagerLayer::new()),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the `TraceLayer` span so every log line of a request carries its
/// method, URI and `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}

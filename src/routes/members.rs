use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Members Router Module
///
/// Routes for logged-in sessions. `create_router` wraps this router in the
/// members gate, which answers anonymous sessions with
/// `401 {"message": "Unauthorized"}` before any article lookup happens.
pub fn members_routes() -> Router<AppState> {
    Router::new()
        // GET /members_only_articles
        .route(
            "/members_only_articles",
            get(handlers::get_member_only_articles),
        )
        // GET /members_only_articles/{id}
        // Public articles are reported as 404 here even though they exist.
        .route(
            "/members_only_articles/{id}",
            get(handlers::get_member_only_article),
        )
}

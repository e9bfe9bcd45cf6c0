use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Public Router Module
///
/// Endpoints reachable without logging in: session management, login itself,
/// and the metered article views.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // DELETE /clear
        // Forgets both the user and the anonymous pageview count.
        .route("/clear", delete(handlers::clear_session))
        // GET /articles
        // Lists every article; not metered.
        .route("/articles", get(handlers::get_articles))
        // GET /articles/{id}
        // Anonymous sessions may view three articles; the 4th and later get a 401.
        .route("/articles/{id}", get(handlers::get_article))
        // POST /login
        // Binds the named user to the session.
        .route("/login", post(handlers::login))
        // DELETE /logout
        // Drops the user, keeps the pageview count.
        .route("/logout", delete(handlers::logout))
        // GET /check_session
        // Resolves the logged-in user; 401 with an empty body otherwise.
        .route("/check_session", get(handlers::check_session))
}

use crate::{
    AppState, access,
    error::ApiError,
    models::{Article, ErrorResponse, LoginRequest, MessageResponse, User},
    session::Session,
};
use axum::{
    Json,
    extract::{FromRequestParts, Path, State},
    http::{StatusCode, request::Parts},
};

/// ArticleId
///
/// The `{id}` path segment of an article route. A segment that is not an `i64`
/// cannot name any article, so it is answered with the same 404 as an unknown id.
pub struct ArticleId(pub i64);

impl<S> FromRequestParts<S> for ArticleId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(%rejection, "unparseable article id");
                ApiError::NotFound
            })?;
        Ok(ArticleId(id))
    }
}

// --- Session Management ---

/// clear_session
///
/// [Public Route] Wipes the session: both the logged-in user and the anonymous
/// pageview count.
#[utoipa::path(
    delete,
    path = "/clear",
    responses((status = 204, description = "Session cleared"))
)]
pub async fn clear_session(mut session: Session) -> Result<StatusCode, ApiError> {
    access::clear_all(&mut session.data);
    session.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Articles ---

/// get_articles
///
/// [Public Route] Lists every article. Listing does not count against the
/// anonymous pageview budget.
#[utoipa::path(
    get,
    path = "/articles",
    responses((status = 200, description = "All articles", body = [Article]))
)]
pub async fn get_articles(State(state): State<AppState>) -> Result<Json<Vec<Article>>, ApiError> {
    let articles = state.repo.get_articles().await?;
    Ok(Json(articles))
}

/// get_article
///
/// [Public Route] Shows one article. Anonymous sessions are metered: the counter
/// is committed even when the view is refused. Logged-in views commit too, which
/// keeps the session alive.
#[utoipa::path(
    get,
    path = "/articles/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Found", body = Article),
        (status = 401, description = "Pageview limit reached", body = MessageResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn get_article(
    State(state): State<AppState>,
    mut session: Session,
    ArticleId(id): ArticleId,
) -> Result<Json<Article>, ApiError> {
    let article = state.repo.get_article(id).await?.ok_or(ApiError::NotFound)?;

    let verdict = access::evaluate_public_article_access(&mut session.data, &article);
    session.commit().await?;
    verdict?;

    Ok(Json(article))
}

// --- Authentication ---

/// login
///
/// [Public Route] Logs in by username alone. Unknown usernames get a 401 with
/// an empty body and the session is not touched.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = User),
        (status = 401, description = "Unknown username")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    mut session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<User>, StatusCode> {
    let user = access::authenticate(state.repo.as_ref(), &payload.username, &mut session.data)
        .await
        .map_err(ApiError::without_body)?;

    session
        .commit()
        .await
        .map_err(|e| ApiError::from(e).without_body())?;

    tracing::info!(user_id = user.id, "user logged in");
    Ok(Json(user))
}

/// logout
///
/// [Public Route] Drops the logged-in user but keeps the anonymous pageview count.
#[utoipa::path(
    delete,
    path = "/logout",
    responses((status = 204, description = "Logged out"))
)]
pub async fn logout(mut session: Session) -> Result<StatusCode, ApiError> {
    access::logout(&mut session.data);
    session.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// check_session
///
/// [Public Route] Returns the logged-in user, or 401 with an empty body when the
/// session is anonymous or points at a user that no longer exists. An active
/// session is committed, which extends it.
#[utoipa::path(
    get,
    path = "/check_session",
    responses(
        (status = 200, description = "Active session", body = User),
        (status = 401, description = "No active session")
    )
)]
pub async fn check_session(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<User>, StatusCode> {
    let user = access::check_active_session(state.repo.as_ref(), &session.data)
        .await
        .map_err(ApiError::without_body)?;

    session
        .commit()
        .await
        .map_err(|e| ApiError::from(e).without_body())?;

    Ok(Json(user))
}

// --- Members-Only Articles ---

/// get_member_only_articles
///
/// [Members Route] Lists articles flagged `is_member_only`.
#[utoipa::path(
    get,
    path = "/members_only_articles",
    responses(
        (status = 200, description = "Member-only articles", body = [Article]),
        (status = 401, description = "Not logged in", body = MessageResponse)
    )
)]
pub async fn get_member_only_articles(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Article>>, ApiError> {
    access::require_member(&session.data)?;
    let articles = state.repo.get_member_only_articles().await?;
    session.commit().await?;
    Ok(Json(articles))
}

/// get_member_only_article
///
/// [Members Route] Shows one member-only article. An id that exists but is public
/// is reported as not found.
#[utoipa::path(
    get,
    path = "/members_only_articles/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Found", body = Article),
        (status = 401, description = "Not logged in", body = MessageResponse),
        (status = 404, description = "Not a member-only article", body = ErrorResponse)
    )
)]
pub async fn get_member_only_article(
    State(state): State<AppState>,
    session: Session,
    ArticleId(id): ArticleId,
) -> Result<Json<Article>, ApiError> {
    let article =
        access::evaluate_member_only_access(&session.data, state.repo.as_ref(), id).await?;
    session.commit().await?;
    Ok(Json(article))
}

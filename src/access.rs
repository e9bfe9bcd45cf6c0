//! Authorization & access policy.
//!
//! Every decision is a function of the session context handed in plus at most one
//! repository lookup. Nothing here touches cookies or the session store; callers
//! commit the mutated `SessionData` themselves.

use crate::{
    error::ApiError,
    models::{Article, User},
    repository::Repository,
    session::SessionData,
};

/// Number of articles an anonymous session may view.
pub const MAX_ANONYMOUS_PAGE_VIEWS: u32 = 3;

/// evaluate_public_article_access
///
/// Logged-in sessions always pass and their counter is untouched. Anonymous
/// sessions count the attempt first and are denied once the count exceeds the
/// limit, so the 4th view is the first refused. The counter keeps climbing on
/// denied attempts.
///
/// Taking the resolved `Article` means the caller has already answered 404 for
/// unknown ids.
pub fn evaluate_public_article_access(
    session: &mut SessionData,
    _article: &Article,
) -> Result<(), ApiError> {
    if session.user_id.is_some() {
        return Ok(());
    }

    session.page_views = session.page_views.saturating_add(1);
    if session.page_views > MAX_ANONYMOUS_PAGE_VIEWS {
        tracing::info!(page_views = session.page_views, "anonymous pageview limit reached");
        return Err(ApiError::MaxViewsExceeded);
    }
    Ok(())
}

/// Returns the session's user id, or `Unauthorized` for anonymous sessions.
pub fn require_member(session: &SessionData) -> Result<i64, ApiError> {
    session.user_id.ok_or(ApiError::Unauthorized)
}

/// evaluate_member_only_access
///
/// The session is checked before the article is looked up, so anonymous callers
/// cannot probe which ids exist. A public article is `NotFound` here.
pub async fn evaluate_member_only_access(
    session: &SessionData,
    repo: &dyn Repository,
    article_id: i64,
) -> Result<Article, ApiError> {
    require_member(session)?;
    repo.get_member_only_article(article_id)
        .await?
        .ok_or(ApiError::NotFound)
}

/// authenticate
///
/// Binds the first user named `username` to the session. On failure the session
/// is left as it was.
pub async fn authenticate(
    repo: &dyn Repository,
    username: &str,
    session: &mut SessionData,
) -> Result<User, ApiError> {
    let Some(user) = repo.find_user_by_username(username).await? else {
        tracing::debug!(username, "login rejected: unknown username");
        return Err(ApiError::Unauthorized);
    };

    session.user_id = Some(user.id);
    Ok(user)
}

/// check_active_session
///
/// Resolves the session's user. A `user_id` pointing at a deleted user is
/// `Unauthorized` but stays in the session.
pub async fn check_active_session(
    repo: &dyn Repository,
    session: &SessionData,
) -> Result<User, ApiError> {
    let user_id = require_member(session)?;
    repo.get_user(user_id).await?.ok_or_else(|| {
        tracing::debug!(user_id, "session refers to a missing user");
        ApiError::Unauthorized
    })
}

/// Forgets both the user and the anonymous pageview count.
pub fn clear_all(session: &mut SessionData) {
    session.user_id = None;
    session.page_views = 0;
}

/// Forgets the user only. Anonymous counting resumes from the previous count.
pub fn logout(session: &mut SessionData) {
    session.user_id = None;
}

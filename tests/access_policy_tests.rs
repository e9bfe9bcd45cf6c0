use async_trait::async_trait;
use article_gate::{
    access::{self, MAX_ANONYMOUS_PAGE_VIEWS},
    error::{ApiError, RepositoryError},
    models::{Article, User},
    repository::Repository,
    session::SessionData,
};
use std::sync::atomic::{AtomicUsize, Ordering};

// --- MOCK REPOSITORY IMPLEMENTATION ---

// Serves canned users/articles and counts article lookups so tests can assert
// that anonymous callers never reach the store.
#[derive(Default)]
struct MockRepoControl {
    users: Vec<User>,
    articles: Vec<Article>,
    fail: bool,
    article_lookups: AtomicUsize,
}

impl MockRepoControl {
    fn check(&self) -> Result<(), RepositoryError> {
        if self.fail {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for MockRepoControl {
    async fn get_articles(&self) -> Result<Vec<Article>, RepositoryError> {
        self.check()?;
        Ok(self.articles.clone())
    }
    async fn get_article(&self, id: i64) -> Result<Option<Article>, RepositoryError> {
        self.article_lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.articles.iter().find(|a| a.id == id).cloned())
    }
    async fn get_member_only_articles(&self) -> Result<Vec<Article>, RepositoryError> {
        self.check()?;
        Ok(self
            .articles
            .iter()
            .filter(|a| a.is_member_only)
            .cloned()
            .collect())
    }
    async fn get_member_only_article(&self, id: i64) -> Result<Option<Article>, RepositoryError> {
        self.article_lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .articles
            .iter()
            .find(|a| a.id == id && a.is_member_only)
            .cloned())
    }
    async fn get_user(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        self.check()?;
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }
    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, RepositoryError> {
        self.check()?;
        Ok(self.users.iter().find(|u| u.username == username).cloned())
    }
}

// --- TEST UTILITIES ---

fn user(id: i64, username: &str) -> User {
    User {
        id,
        username: username.to_string(),
    }
}

fn article(id: i64, is_member_only: bool) -> Article {
    Article {
        id,
        title: format!("Article {id}"),
        is_member_only,
        ..Article::default()
    }
}

fn seeded_repo() -> MockRepoControl {
    MockRepoControl {
        users: vec![user(1, "alice"), user(2, "bob"), user(3, "alice")],
        articles: vec![article(1, false), article(2, true), article(5, false)],
        ..MockRepoControl::default()
    }
}

fn logged_in(user_id: i64) -> SessionData {
    SessionData {
        user_id: Some(user_id),
        page_views: 0,
    }
}

// --- PUBLIC ARTICLE ACCESS ---

#[test]
fn anonymous_views_allowed_up_to_the_limit_then_refused() {
    let mut session = SessionData::default();
    let target = article(1, false);

    for expected in 1..=MAX_ANONYMOUS_PAGE_VIEWS {
        assert!(access::evaluate_public_article_access(&mut session, &target).is_ok());
        assert_eq!(session.page_views, expected);
    }

    let verdict = access::evaluate_public_article_access(&mut session, &target);
    assert!(matches!(verdict, Err(ApiError::MaxViewsExceeded)));
    assert_eq!(session.page_views, 4);
}

#[test]
fn refused_attempts_keep_counting() {
    let mut session = SessionData {
        user_id: None,
        page_views: 4,
    };

    let verdict = access::evaluate_public_article_access(&mut session, &article(1, false));

    assert!(matches!(verdict, Err(ApiError::MaxViewsExceeded)));
    assert_eq!(session.page_views, 5);
}

#[test]
fn logged_in_views_never_touch_the_counter() {
    let mut session = SessionData {
        user_id: Some(1),
        page_views: 17,
    };

    for _ in 0..10 {
        assert!(access::evaluate_public_article_access(&mut session, &article(1, false)).is_ok());
    }
    assert_eq!(session.page_views, 17);
}

#[test]
fn logout_resumes_counting_from_previous_value() {
    let mut session = SessionData {
        user_id: None,
        page_views: 2,
    };
    let target = article(1, false);

    session.user_id = Some(1);
    assert!(access::evaluate_public_article_access(&mut session, &target).is_ok());
    assert_eq!(session.page_views, 2);

    access::logout(&mut session);
    assert!(access::evaluate_public_article_access(&mut session, &target).is_ok());
    assert_eq!(session.page_views, 3);
    assert!(access::evaluate_public_article_access(&mut session, &target).is_err());
}

// --- MEMBER-ONLY ACCESS ---

#[tokio::test]
async fn member_access_denied_to_anonymous_without_lookup() {
    let repo = seeded_repo();

    let verdict = access::evaluate_member_only_access(&SessionData::default(), &repo, 2).await;

    assert!(matches!(verdict, Err(ApiError::Unauthorized)));
    assert_eq!(repo.article_lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn member_access_denied_to_anonymous_even_for_unknown_ids() {
    let repo = seeded_repo();

    let verdict = access::evaluate_member_only_access(&SessionData::default(), &repo, 999).await;

    assert!(matches!(verdict, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn member_access_allows_member_only_article() {
    let repo = seeded_repo();

    let found = access::evaluate_member_only_access(&logged_in(1), &repo, 2)
        .await
        .expect("member should see member-only article");

    assert_eq!(found.id, 2);
    assert!(found.is_member_only);
}

#[tokio::test]
async fn member_access_reports_public_article_as_not_found() {
    let repo = seeded_repo();

    let verdict = access::evaluate_member_only_access(&logged_in(1), &repo, 5).await;

    assert!(matches!(verdict, Err(ApiError::NotFound)));
}

#[tokio::test]
async fn member_access_reports_unknown_id_as_not_found() {
    let repo = seeded_repo();

    let verdict = access::evaluate_member_only_access(&logged_in(1), &repo, 404).await;

    assert!(matches!(verdict, Err(ApiError::NotFound)));
}

#[tokio::test]
async fn member_access_propagates_store_failures() {
    let repo = MockRepoControl {
        fail: true,
        ..seeded_repo()
    };

    let verdict = access::evaluate_member_only_access(&logged_in(1), &repo, 2).await;

    assert!(matches!(verdict, Err(ApiError::Repository(_))));
}

// --- AUTHENTICATION ---

#[tokio::test]
async fn authenticate_binds_first_matching_user() {
    let repo = seeded_repo();
    let mut session = SessionData::default();

    let found = access::authenticate(&repo, "alice", &mut session)
        .await
        .expect("alice exists");

    assert_eq!(found.id, 1);
    assert_eq!(session.user_id, Some(1));
}

#[tokio::test]
async fn authenticate_unknown_user_leaves_session_untouched() {
    let repo = seeded_repo();
    let mut session = SessionData {
        user_id: None,
        page_views: 2,
    };

    let verdict = access::authenticate(&repo, "nonexistent_user", &mut session).await;

    assert!(matches!(verdict, Err(ApiError::Unauthorized)));
    assert_eq!(
        session,
        SessionData {
            user_id: None,
            page_views: 2
        }
    );
}

#[tokio::test]
async fn authenticate_unknown_user_keeps_existing_login() {
    let repo = seeded_repo();
    let mut session = logged_in(2);

    let verdict = access::authenticate(&repo, "mallory", &mut session).await;

    assert!(verdict.is_err());
    assert_eq!(session.user_id, Some(2));
}

#[tokio::test]
async fn authenticate_does_not_reset_page_views() {
    let repo = seeded_repo();
    let mut session = SessionData {
        user_id: None,
        page_views: 3,
    };

    access::authenticate(&repo, "bob", &mut session)
        .await
        .expect("bob exists");

    assert_eq!(session.page_views, 3);
}

// --- ACTIVE SESSION CHECK ---

#[tokio::test]
async fn check_active_session_returns_user() {
    let repo = seeded_repo();

    let found = access::check_active_session(&repo, &logged_in(2))
        .await
        .expect("bob is logged in");

    assert_eq!(found.username, "bob");
}

#[tokio::test]
async fn check_active_session_rejects_anonymous() {
    let repo = seeded_repo();

    let verdict = access::check_active_session(&repo, &SessionData::default()).await;

    assert!(matches!(verdict, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn check_active_session_rejects_stale_reference_without_clearing() {
    let repo = seeded_repo();
    let session = logged_in(42);

    let verdict = access::check_active_session(&repo, &session).await;

    assert!(matches!(verdict, Err(ApiError::Unauthorized)));
    assert_eq!(session.user_id, Some(42));
}

// --- CLEAR / LOGOUT ---

#[tokio::test]
async fn clear_all_then_check_session_is_unauthorized() {
    let repo = seeded_repo();
    let mut session = SessionData {
        user_id: Some(1),
        page_views: 9,
    };

    access::clear_all(&mut session);

    assert_eq!(session, SessionData::default());
    assert!(matches!(
        access::check_active_session(&repo, &session).await,
        Err(ApiError::Unauthorized)
    ));
}

#[test]
fn clear_all_is_idempotent() {
    let mut session = SessionData::default();

    access::clear_all(&mut session);
    access::clear_all(&mut session);

    assert_eq!(session, SessionData::default());
}

#[test]
fn logout_keeps_page_views() {
    let mut session = SessionData {
        user_id: Some(1),
        page_views: 3,
    };

    access::logout(&mut session);

    assert_eq!(session.user_id, None);
    assert_eq!(session.page_views, 3);
}

#[test]
fn require_member_returns_user_id() {
    assert_eq!(access::require_member(&logged_in(7)).ok(), Some(7));
    assert!(matches!(
        access::require_member(&SessionData::default()),
        Err(ApiError::Unauthorized)
    ));
}

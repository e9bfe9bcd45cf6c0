use crate::{
    error::RepositoryError,
    models::{Article, NewArticle, User},
};
use async_trait::async_trait;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::sync::Arc;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. Handlers and the
/// access policy talk to this trait only, so the SQLite implementation can be
/// swapped for a mock in tests.
///
/// **Send + Sync + async_trait** are required to make the trait object (`Arc<dyn Repository>`)
/// safely shareable and usable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Article Retrieval ---
    // Every article, public and member-only, in id order.
    async fn get_articles(&self) -> Result<Vec<Article>, RepositoryError>;
    async fn get_article(&self, id: i64) -> Result<Option<Article>, RepositoryError>;

    // Membership-filtered retrieval. Must enforce is_member_only=true.
    async fn get_member_only_articles(&self) -> Result<Vec<Article>, RepositoryError>;
    // None if the id is unknown OR refers to a public article.
    async fn get_member_only_article(&self, id: i64) -> Result<Option<Article>, RepositoryError>;

    // --- Users ---
    async fn get_user(&self, id: i64) -> Result<Option<User>, RepositoryError>;
    // Usernames are not assumed unique: returns the lowest-id match.
    async fn find_user_by_username(&self, username: &str)
    -> Result<Option<User>, RepositoryError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const ARTICLE_COLUMNS: &str =
    "id, author, title, content, preview, minutes_to_read, date, is_member_only, user_id";

/// SqliteRepository
///
/// The concrete implementation of the `Repository` trait, backed by SQLite.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Creates a new repository instance using an initialized connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// connect
    ///
    /// Opens a pool for `db_url`. An in-memory database exists per connection, so
    /// `sqlite::memory:` URLs get a single connection that is never recycled.
    pub async fn connect(db_url: &str) -> Result<Self, RepositoryError> {
        let options = if db_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = options.connect(db_url).await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded migrations under `migrations/`.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn insert_user(&self, username: &str) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username) VALUES (?) RETURNING id, username",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn insert_article(&self, article: NewArticle) -> Result<Article, RepositoryError> {
        let sql = format!(
            "INSERT INTO articles \
             (author, title, content, preview, minutes_to_read, date, is_member_only, user_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING {ARTICLE_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Article>(&sql)
            .bind(article.author)
            .bind(article.title)
            .bind(article.content)
            .bind(article.preview)
            .bind(article.minutes_to_read)
            .bind(article.date)
            .bind(article.is_member_only)
            .bind(article.user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    pub async fn count_articles(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn get_articles(&self) -> Result<Vec<Article>, RepositoryError> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY id");
        let articles = sqlx::query_as::<_, Article>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(articles)
    }

    async fn get_article(&self, id: i64) -> Result<Option<Article>, RepositoryError> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?");
        let article = sqlx::query_as::<_, Article>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(article)
    }

    /// get_member_only_articles
    ///
    /// **Security**: Strictly enforces `WHERE is_member_only = TRUE` in the query itself.
    async fn get_member_only_articles(&self) -> Result<Vec<Article>, RepositoryError> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE is_member_only = TRUE ORDER BY id"
        );
        let articles = sqlx::query_as::<_, Article>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(articles)
    }

    async fn get_member_only_article(&self, id: i64) -> Result<Option<Article>, RepositoryError> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ? AND is_member_only = TRUE"
        );
        let article = sqlx::query_as::<_, Article>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(article)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>("SELECT id, username FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username FROM users WHERE username = ? ORDER BY id LIMIT 1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

use chrono::{Duration, Utc};

use crate::{error::RepositoryError, models::NewArticle, repository::SqliteRepository};

/// seed_demo_content
///
/// Fills an empty database with a few readers and a mix of public and member-only
/// articles. Does nothing if any article already exists. Returns the number of
/// articles inserted.
pub async fn seed_demo_content(repo: &SqliteRepository) -> Result<usize, RepositoryError> {
    if repo.count_articles().await? > 0 {
        tracing::debug!("database already has articles; skipping demo seed");
        return Ok(0);
    }

    let alice = repo.insert_user("alice").await?;
    let bob = repo.insert_user("bob").await?;
    repo.insert_user("carol").await?;

    let now = Utc::now();
    let demo = [
        ("Getting Started with Sourdough", alice.id, 4, false),
        ("A Field Guide to City Birds", bob.id, 6, false),
        ("Why Bridges Sing in the Wind", alice.id, 8, true),
        ("Notes from a Night Ferry", bob.id, 3, false),
        ("The Quiet Economics of Libraries", alice.id, 11, false),
        ("Inside the Seed Vault", bob.id, 9, true),
    ];

    for (offset, (title, author_id, minutes, member_only)) in demo.iter().enumerate() {
        let author = if *author_id == alice.id { "alice" } else { "bob" };
        let content = format!(
            "{title}. A demo article by {author}, about {minutes} minutes long, \
             included so the API has something to serve on first start."
        );
        let preview = content.chars().take(25).collect::<String>() + "...";

        repo.insert_article(NewArticle {
            author: author.to_string(),
            title: title.to_string(),
            content,
            preview,
            minutes_to_read: *minutes,
            date: now - Duration::days(offset as i64),
            is_member_only: *member_only,
            user_id: Some(*author_id),
        })
        .await?;
    }

    tracing::info!(articles = demo.len(), "seeded demo content");
    Ok(demo.len())
}

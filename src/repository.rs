use crate::models::{
    CreatePostRequest, CreateTopicRequest, Post, Topic, UpdatePostRequest, UpdateTopicRequest, User,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::{Arc, Mutex};

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. This is the core
/// of the Repository Abstraction pattern, allowing the handlers to interact with
/// the data layer without knowing the specific implementation (Postgres, Memory).
///
/// Every method returns `Result<_, sqlx::Error>`: an `Err` means the store itself
/// is unreachable or failed, which the handler layer surfaces as a 500. All other
/// outcomes (absent rows, zero deletions) are encoded in the `Option`/`bool`
/// payloads and are the caller's responsibility to translate.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Posts ---
    async fn get_posts(&self) -> Result<Vec<Post>, sqlx::Error>;
    async fn get_post(&self, id: i64) -> Result<Option<Post>, sqlx::Error>;
    // Case-insensitive substring match on the title.
    async fn get_posts_by_title(&self, term: &str) -> Result<Vec<Post>, sqlx::Error>;
    async fn post_exists(&self, id: i64) -> Result<bool, sqlx::Error>;
    // Insert with store-assigned id and creation timestamp.
    async fn create_post(&self, req: CreatePostRequest) -> Result<Post, sqlx::Error>;
    // Returns None when the id is unknown. Owner and creation timestamp are preserved.
    async fn update_post(&self, req: UpdatePostRequest) -> Result<Option<Post>, sqlx::Error>;
    // Returns false when nothing was deleted.
    async fn delete_post(&self, id: i64) -> Result<bool, sqlx::Error>;

    // --- Topics ---
    async fn get_topics(&self) -> Result<Vec<Topic>, sqlx::Error>;
    async fn get_topic(&self, id: i64) -> Result<Option<Topic>, sqlx::Error>;
    async fn get_topics_by_description(&self, term: &str) -> Result<Vec<Topic>, sqlx::Error>;
    // The referential precondition probe used before every post create/update.
    async fn topic_exists(&self, id: i64) -> Result<bool, sqlx::Error>;
    async fn create_topic(&self, req: CreateTopicRequest) -> Result<Topic, sqlx::Error>;
    async fn update_topic(&self, req: UpdateTopicRequest) -> Result<Option<Topic>, sqlx::Error>;
    async fn delete_topic(&self, id: i64) -> Result<bool, sqlx::Error>;

    // --- Users ---
    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error>;
    async fn get_user(&self, id: i64) -> Result<Option<User>, sqlx::Error>;
    // Lookup by the unique login identifier; used by login, registration
    // duplicate checks, and bearer-token resolution.
    async fn get_user_by_login(&self, login: &str) -> Result<Option<User>, sqlx::Error>;
    // `user.id` is ignored on insert; the store assigns one.
    async fn create_user(&self, user: User) -> Result<User, sqlx::Error>;
    async fn update_user(&self, user: User) -> Result<Option<User>, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the PostgreSQL database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const POST_COLUMNS: &str = "id, title, text, created_at, topic_id, user_id";
const USER_COLUMNS: &str = "id, name, login, password, photo";

#[async_trait]
impl Repository for PostgresRepository {
    // --- POSTS ---

    async fn get_posts(&self) -> Result<Vec<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts ORDER BY id"))
            .fetch_all(&self.pool)
            .await
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// get_posts_by_title
    ///
    /// Case-insensitive substring search, parameterized through a bound ILIKE
    /// pattern so the search term never reaches the SQL text itself.
    async fn get_posts_by_title(&self, term: &str) -> Result<Vec<Post>, sqlx::Error> {
        let pattern = format!("%{}%", term);
        sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE title ILIKE $1 ORDER BY id"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
    }

    async fn post_exists(&self, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
    }

    /// create_post
    ///
    /// Inserts a new post. The id comes from the sequence and `created_at` is
    /// stamped by the database, so both are returned with the row.
    async fn create_post(&self, req: CreatePostRequest) -> Result<Post, sqlx::Error> {
        sqlx::query_as::<_, Post>(&format!(
            "INSERT INTO posts (title, text, created_at, topic_id, user_id) \
             VALUES ($1, $2, NOW(), $3, $4) RETURNING {POST_COLUMNS}"
        ))
        .bind(&req.title)
        .bind(&req.text)
        .bind(req.topic_id)
        .bind(req.user_id)
        .fetch_one(&self.pool)
        .await
    }

    /// update_post
    ///
    /// Replaces the mutable fields of an existing post. `created_at` and
    /// `user_id` are deliberately absent from the SET list.
    async fn update_post(&self, req: UpdatePostRequest) -> Result<Option<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>(&format!(
            "UPDATE posts SET title = $2, text = $3, topic_id = $4 \
             WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(req.id)
        .bind(&req.title)
        .bind(&req.text)
        .bind(req.topic_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_post(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- TOPICS ---

    async fn get_topics(&self) -> Result<Vec<Topic>, sqlx::Error> {
        sqlx::query_as::<_, Topic>("SELECT id, description FROM topics ORDER BY id")
            .fetch_all(&self.pool)
            .await
    }

    async fn get_topic(&self, id: i64) -> Result<Option<Topic>, sqlx::Error> {
        sqlx::query_as::<_, Topic>("SELECT id, description FROM topics WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_topics_by_description(&self, term: &str) -> Result<Vec<Topic>, sqlx::Error> {
        let pattern = format!("%{}%", term);
        sqlx::query_as::<_, Topic>(
            "SELECT id, description FROM topics WHERE description ILIKE $1 ORDER BY id",
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
    }

    async fn topic_exists(&self, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM topics WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
    }

    async fn create_topic(&self, req: CreateTopicRequest) -> Result<Topic, sqlx::Error> {
        sqlx::query_as::<_, Topic>(
            "INSERT INTO topics (description) VALUES ($1) RETURNING id, description",
        )
        .bind(&req.description)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_topic(&self, req: UpdateTopicRequest) -> Result<Option<Topic>, sqlx::Error> {
        sqlx::query_as::<_, Topic>(
            "UPDATE topics SET description = $2 WHERE id = $1 RETURNING id, description",
        )
        .bind(req.id)
        .bind(&req.description)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_topic(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM topics WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- USERS ---

    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&self.pool)
            .await
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_user_by_login(&self, login: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE login = $1"))
            .bind(login)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_user(&self, user: User) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, login, password, photo) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.name)
        .bind(&user.login)
        .bind(&user.password)
        .bind(&user.photo)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_user(&self, user: User) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = $2, login = $3, password = $4, photo = $5 \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.login)
        .bind(&user.password)
        .bind(&user.photo)
        .fetch_optional(&self.pool)
        .await
    }
}

// --- In-Memory Implementation ---

/// MemoryRepository
///
/// An in-memory implementation of the `Repository` trait. This allows the full
/// router to be exercised in integration tests without a running database.
///
/// A single `Mutex` guards all three collections; it is only ever held across
/// synchronous sections, never across an await point.
#[derive(Default)]
pub struct MemoryRepository {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    users: Vec<User>,
    topics: Vec<Topic>,
    posts: Vec<Post>,
    next_user_id: i64,
    next_topic_id: i64,
    next_post_id: i64,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    // --- POSTS ---

    async fn get_posts(&self) -> Result<Vec<Post>, sqlx::Error> {
        Ok(self.inner.lock().unwrap().posts.clone())
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, sqlx::Error> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .posts
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn get_posts_by_title(&self, term: &str) -> Result<Vec<Post>, sqlx::Error> {
        let needle = term.to_lowercase();
        Ok(self
            .inner
            .lock()
            .unwrap()
            .posts
            .iter()
            .filter(|p| p.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn post_exists(&self, id: i64) -> Result<bool, sqlx::Error> {
        Ok(self.inner.lock().unwrap().posts.iter().any(|p| p.id == id))
    }

    async fn create_post(&self, req: CreatePostRequest) -> Result<Post, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_post_id += 1;
        let post = Post {
            id: inner.next_post_id,
            title: req.title,
            text: req.text,
            created_at: Utc::now(),
            topic_id: req.topic_id,
            user_id: req.user_id,
        };
        inner.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, req: UpdatePostRequest) -> Result<Option<Post>, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        match inner.posts.iter_mut().find(|p| p.id == req.id) {
            Some(post) => {
                post.title = req.title;
                post.text = req.text;
                post.topic_id = req.topic_id;
                Ok(Some(post.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_post(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.posts.len();
        inner.posts.retain(|p| p.id != id);
        Ok(inner.posts.len() < before)
    }

    // --- TOPICS ---

    async fn get_topics(&self) -> Result<Vec<Topic>, sqlx::Error> {
        Ok(self.inner.lock().unwrap().topics.clone())
    }

    async fn get_topic(&self, id: i64) -> Result<Option<Topic>, sqlx::Error> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .topics
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn get_topics_by_description(&self, term: &str) -> Result<Vec<Topic>, sqlx::Error> {
        let needle = term.to_lowercase();
        Ok(self
            .inner
            .lock()
            .unwrap()
            .topics
            .iter()
            .filter(|t| t.description.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn topic_exists(&self, id: i64) -> Result<bool, sqlx::Error> {
        Ok(self.inner.lock().unwrap().topics.iter().any(|t| t.id == id))
    }

    async fn create_topic(&self, req: CreateTopicRequest) -> Result<Topic, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_topic_id += 1;
        let topic = Topic {
            id: inner.next_topic_id,
            description: req.description,
        };
        inner.topics.push(topic.clone());
        Ok(topic)
    }

    async fn update_topic(&self, req: UpdateTopicRequest) -> Result<Option<Topic>, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        match inner.topics.iter_mut().find(|t| t.id == req.id) {
            Some(topic) => {
                topic.description = req.description;
                Ok(Some(topic.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_topic(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.topics.len();
        inner.topics.retain(|t| t.id != id);
        Ok(inner.topics.len() < before)
    }

    // --- USERS ---

    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error> {
        Ok(self.inner.lock().unwrap().users.clone())
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn get_user_by_login(&self, login: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.login == login)
            .cloned())
    }

    async fn create_user(&self, user: User) -> Result<User, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_user_id += 1;
        let user = User {
            id: inner.next_user_id,
            ..user
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, user: User) -> Result<Option<User>, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        match inner.users.iter_mut().find(|u| u.id == user.id) {
            Some(stored) => {
                stored.name = user.name;
                stored.login = user.login;
                stored.password = user.password;
                stored.photo = user.photo;
                Ok(Some(stored.clone()))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_repo_assigns_sequential_ids() {
        let repo = MemoryRepository::new();
        let a = repo
            .create_topic(CreateTopicRequest {
                description: "Rust".to_string(),
            })
            .await
            .unwrap();
        let b = repo
            .create_topic(CreateTopicRequest {
                description: "Axum".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
    }

    #[tokio::test]
    async fn memory_repo_title_search_is_case_insensitive_substring() {
        let repo = MemoryRepository::new();
        for title in ["Go Basics", "Banana bread"] {
            repo.create_post(CreatePostRequest {
                title: title.to_string(),
                text: "a body of at least ten characters".to_string(),
                topic_id: 1,
                user_id: 1,
            })
            .await
            .unwrap();
        }

        let hits = repo.get_posts_by_title("ana").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Banana bread");

        // Uppercase needle hits the same row.
        let hits = repo.get_posts_by_title("ANA").await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn memory_repo_update_preserves_owner_and_timestamp() {
        let repo = MemoryRepository::new();
        let created = repo
            .create_post(CreatePostRequest {
                title: "Original title".to_string(),
                text: "original body text".to_string(),
                topic_id: 1,
                user_id: 7,
            })
            .await
            .unwrap();

        let updated = repo
            .update_post(UpdatePostRequest {
                id: created.id,
                title: "Edited title".to_string(),
                text: "edited body text!".to_string(),
                topic_id: 2,
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.user_id, 7);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.topic_id, 2);
    }

    #[tokio::test]
    async fn memory_repo_delete_is_not_idempotent() {
        let repo = MemoryRepository::new();
        let topic = repo
            .create_topic(CreateTopicRequest {
                description: "Transient".to_string(),
            })
            .await
            .unwrap();
        assert!(repo.delete_topic(topic.id).await.unwrap());
        assert!(!repo.delete_topic(topic.id).await.unwrap());
    }
}

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use bloglist_core::domain::{MAX_LIKES, Post};
use bloglist_core::error::RepoError;
use bloglist_core::ports::{BaseRepository, PostRepository};

/// In-memory post store keyed by id.
///
/// Note: Data is lost on process restart.
pub struct InMemoryPostRepository {
    store: RwLock<IndexMap<Uuid, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(IndexMap::new()),
        }
    }
}

impl Default for InMemoryPostRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// Same bound the `BIGINT` column puts on the Postgres store.
fn check_likes(post: &Post) -> Result<(), RepoError> {
    if Post::likes_in_range(post.likes) {
        Ok(())
    } else {
        Err(RepoError::Constraint(format!(
            "likes {} exceeds {}",
            post.likes, MAX_LIKES
        )))
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_all(&self) -> Result<Vec<Post>, RepoError> {
        Ok(self.store.read().await.values().cloned().collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        check_likes(&post)?;
        let mut store = self.store.write().await;
        if store.contains_key(&post.id) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        store.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        check_likes(&post)?;
        match self.store.write().await.get_mut(&post.id) {
            Some(stored) => {
                *stored = post.clone();
                Ok(post)
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.store
            .write()
            .await
            .shift_remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<Post>, RepoError> {
        tracing::debug!(%user_id, "Finding posts by owner");

        Ok(self
            .store
            .read()
            .await
            .values()
            .filter(|p| p.is_owned_by(user_id))
            .cloned()
            .collect())
    }
}

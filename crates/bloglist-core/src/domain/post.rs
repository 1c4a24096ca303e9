use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Largest like count a post can carry. The `blogs.likes` column is a `BIGINT`.
pub const MAX_LIKES: u64 = i64::MAX as u64;

/// Post entity - a blog entry owned by the user who submitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub author: String,
    pub url: String,
    pub likes: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update of a post. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub url: Option<String>,
    pub likes: Option<u64>,
}

impl Post {
    /// Create a new post. Missing likes start at zero.
    pub fn new(
        user_id: Uuid,
        title: String,
        author: String,
        url: String,
        likes: Option<u64>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title,
            author,
            url,
            likes: likes.unwrap_or(0),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `likes` fits the storable range.
    pub fn likes_in_range(likes: u64) -> bool {
        likes <= MAX_LIKES
    }

    /// Whether `user_id` owns this post.
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Apply a partial update and bump `updated_at`.
    pub fn apply(&mut self, update: PostUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(author) = update.author {
            self.author = author;
        }
        if let Some(url) = update.url {
            self.url = url;
        }
        if let Some(likes) = update.likes {
            self.likes = likes;
        }
        self.updated_at = Utc::now();
    }
}

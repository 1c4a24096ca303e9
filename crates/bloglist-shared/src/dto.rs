//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    #[serde(default)]
    pub name: String,
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response containing an access token for the logged in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub username: String,
    pub name: String,
}

/// Request to create a post. At least one of `title` and `url` is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub url: Option<String>,
    pub likes: Option<u64>,
}

/// Request to update a post. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub url: Option<String>,
    pub likes: Option<u64>,
}

/// Public view of a post owner, embedded in post listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostOwner {
    pub id: String,
    pub username: String,
    pub name: String,
}

/// Owner reference on a post: the bare id, or the owner looked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostUser {
    Populated(PostOwner),
    Id(String),
}

/// A post as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: String,
    pub title: String,
    pub author: String,
    pub url: String,
    pub likes: u64,
    pub user: PostUser,
}

/// A post as listed under its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedPostResponse {
    pub id: String,
    pub title: String,
    pub author: String,
    pub url: String,
    pub likes: u64,
}

/// Response containing a user's public information and their posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub name: String,
    pub blogs: Vec<OwnedPostResponse>,
}

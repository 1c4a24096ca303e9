//! Blog post handlers.

use std::collections::HashMap;

use actix_web::{HttpResponse, web};
use serde::Serialize;

use bloglist_core::DomainError;
use bloglist_core::domain::{MAX_LIKES, Post, PostUpdate};
use bloglist_core::stats::{self, AuthorBlogs, AuthorLikes};
use bloglist_shared::dto::{
    CreatePostRequest, PostOwner, PostResponse, PostUser, UpdatePostRequest,
};

use super::parse_id;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

pub(super) fn post_response(post: Post, user: PostUser) -> PostResponse {
    PostResponse {
        id: post.id.to_string(),
        title: post.title,
        author: post.author,
        url: post.url,
        likes: post.likes,
        user,
    }
}

fn owner_ref(post: &Post) -> PostUser {
    PostUser::Id(post.user_id.to_string())
}

fn check_likes(likes: Option<u64>) -> Result<(), DomainError> {
    match likes {
        Some(likes) if !Post::likes_in_range(likes) => Err(DomainError::Validation(format!(
            "likes must not exceed {}",
            MAX_LIKES
        ))),
        _ => Ok(()),
    }
}

/// Aggregates over every stored post.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_likes: u64,
    pub favorite_blog: Option<PostResponse>,
    pub most_blogs: Option<AuthorBlogs>,
    pub most_likes: Option<AuthorLikes>,
}

/// GET /api/blogs
pub async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.posts.find_all().await?;

    let owners: HashMap<_, _> = state
        .users
        .find_all()
        .await?
        .into_iter()
        .map(|u| {
            let owner = PostOwner {
                id: u.id.to_string(),
                username: u.username,
                name: u.name,
            };
            (u.id, owner)
        })
        .collect();

    let body: Vec<PostResponse> = posts
        .into_iter()
        .map(|post| {
            let user = owners
                .get(&post.user_id)
                .cloned()
                .map(PostUser::Populated)
                .unwrap_or_else(|| owner_ref(&post));
            post_response(post, user)
        })
        .collect();

    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/blogs/{id}
pub async fn get(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;

    let post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or(DomainError::NotFound {
            entity_type: "Post",
            id,
        })?;

    let user = owner_ref(&post);
    Ok(HttpResponse::Ok().json(post_response(post, user)))
}

/// POST /api/blogs - requires a bearer token
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    if req.title.is_none() && req.url.is_none() {
        return Err(DomainError::Validation("title missing".to_string()).into());
    }
    check_likes(req.likes)?;

    // The token may outlive its user.
    let owner = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("token missing or invalid".to_string()))?;

    let post = Post::new(
        owner.id,
        req.title.unwrap_or_default(),
        req.author.unwrap_or_default(),
        req.url.unwrap_or_default(),
        req.likes,
    );
    let saved = state.posts.insert(post).await?;

    tracing::info!(post_id = %saved.id, user = %owner.username, "Post created");

    let user = owner_ref(&saved);
    Ok(HttpResponse::Ok().json(post_response(saved, user)))
}

/// PUT /api/blogs/{id} - requires a bearer token
pub async fn update(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<String>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;
    let req = body.into_inner();
    check_likes(req.likes)?;

    let mut post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or(DomainError::NotFound {
            entity_type: "Post",
            id,
        })?;

    post.apply(PostUpdate {
        title: req.title,
        author: req.author,
        url: req.url,
        likes: req.likes,
    });
    let updated = state.posts.update(post).await?;

    let user = owner_ref(&updated);
    Ok(HttpResponse::Ok().json(post_response(updated, user)))
}

/// DELETE /api/blogs/{id} - only the owner may delete
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;

    let post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or(DomainError::NotFound {
            entity_type: "Post",
            id,
        })?;

    if !post.is_owned_by(identity.user_id) {
        tracing::warn!(
            post_id = %id,
            user = %identity.username,
            "Rejected delete of another user's post"
        );
        return Err(DomainError::Unauthorized("delete operation forbidden".to_string()).into());
    }

    state.posts.delete(id).await?;
    tracing::info!(post_id = %id, user = %identity.username, "Post deleted");

    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/blogs/stats
pub async fn stats(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.posts.find_all().await?;

    let body = StatsResponse {
        total_likes: stats::total_likes(&posts),
        favorite_blog: stats::favorite_blog(&posts)
            .cloned()
            .map(|post| {
                let user = owner_ref(&post);
                post_response(post, user)
            }),
        most_blogs: stats::most_blogs(&posts),
        most_likes: stats::most_likes(&posts),
    };

    Ok(HttpResponse::Ok().json(body))
}

//! User registration and listing handlers.

use std::collections::HashMap;
use std::sync::Arc;

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use bloglist_core::DomainError;
use bloglist_core::domain::{Post, User};
use bloglist_core::error::RepoError;
use bloglist_core::ports::{AuthError, PasswordService};
use bloglist_shared::dto::{OwnedPostResponse, RegisterUserRequest, UserResponse};

use super::parse_id;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const USERNAME_TAKEN: &str = "username must be unique";
const PASSWORD_TOO_SHORT: &str = "password must be at least three characters long";

fn owned_post(post: Post) -> OwnedPostResponse {
    OwnedPostResponse {
        id: post.id.to_string(),
        title: post.title,
        author: post.author,
        url: post.url,
        likes: post.likes,
    }
}

fn user_response(user: User, posts: Vec<Post>) -> UserResponse {
    UserResponse {
        id: user.id.to_string(),
        username: user.username,
        name: user.name,
        blogs: posts.into_iter().map(owned_post).collect(),
    }
}

/// POST /api/users
pub async fn register(
    state: web::Data<AppState>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    if req.username.trim().is_empty() {
        return Err(DomainError::Validation("username missing".to_string()).into());
    }
    if !User::password_is_acceptable(&req.password) {
        return Err(DomainError::Validation(PASSWORD_TOO_SHORT.to_string()).into());
    }
    if state.users.find_by_username(&req.username).await?.is_some() {
        return Err(DomainError::Validation(USERNAME_TAKEN.to_string()).into());
    }

    let passwords = Arc::clone(password_service.get_ref());
    let password = req.password;
    let password_hash = web::block(move || passwords.hash(&password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| match e {
            AuthError::PasswordTooShort { .. } => {
                AppError::from(DomainError::Validation(PASSWORD_TOO_SHORT.to_string()))
            }
            e => AppError::Internal(e.to_string()),
        })?;

    let user = User::new(req.username, req.name, password_hash);
    let saved = match state.users.insert(user).await {
        Ok(saved) => saved,
        // Lost a race with a concurrent registration.
        Err(RepoError::Constraint(_)) => {
            return Err(DomainError::Validation(USERNAME_TAKEN.to_string()).into());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %saved.id, username = %saved.username, "User registered");

    Ok(HttpResponse::Ok().json(user_response(saved, Vec::new())))
}

/// GET /api/users
pub async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let users = state.users.find_all().await?;

    let mut posts_by_owner: HashMap<Uuid, Vec<Post>> = HashMap::new();
    for post in state.posts.find_all().await? {
        posts_by_owner.entry(post.user_id).or_default().push(post);
    }

    let body: Vec<UserResponse> = users
        .into_iter()
        .map(|user| {
            let posts = posts_by_owner.remove(&user.id).unwrap_or_default();
            user_response(user, posts)
        })
        .collect();

    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/users/{id}
pub async fn get(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;

    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(DomainError::NotFound {
            entity_type: "User",
            id,
        })?;
    let posts = state.posts.find_by_user_id(user.id).await?;

    Ok(HttpResponse::Ok().json(user_response(user, posts)))
}

//! Login handler.

use actix_web::{HttpResponse, web};
use std::sync::Arc;

use bloglist_core::ports::{PasswordService, TokenService};
use bloglist_shared::dto::{AuthResponse, LoginRequest};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const INVALID_LOGIN: &str = "invalid username or password";

/// POST /api/login
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_username(&req.username)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_LOGIN.to_string()))?;

    let passwords = Arc::clone(password_service.get_ref());
    let hash = user.password_hash.clone();
    let valid = web::block(move || passwords.verify(&req.password, &hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if !valid {
        tracing::info!(username = %user.username, "Rejected login");
        return Err(AppError::Unauthorized(INVALID_LOGIN.to_string()));
    }

    let token = token_service
        .generate_token(user.id, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: token_service.expiration_seconds().max(0) as u64,
        username: user.username,
        name: user.name,
    }))
}

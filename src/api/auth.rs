//! Account and session endpoints.

use axum::extract::State;
use chrono::Duration;

use super::extract::Json;
use super::{success, ApiResult};
use crate::auth::{self, CurrentUser};
use crate::db::now;
use crate::errors::AppError;
use crate::models::{
    ChangePasswordRequest, LoginRequest, RegisterRequest, Role, SessionResponse,
    UpdateProfileRequest, User, Validate,
};
use crate::AppState;

/// POST /api/auth/register - Create a collector account and sign it in.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<SessionResponse> {
    let settings = state.repo.get_settings().await?;
    if !settings.registration_open {
        return Err(AppError::Forbidden(
            "O cadastro de novos usuários está fechado".to_string(),
        ));
    }

    request.validate()?;

    let email = normalize_email(&request.email);
    let password_hash = hash_blocking(request.password).await?;
    let user = state
        .repo
        .create_user(&email, request.username.trim(), &password_hash, Role::Collector)
        .await?;

    tracing::info!(user_id = %user.id, "Registered new collector");

    success(issue_session(&state, user).await?)
}

/// POST /api/auth/login - Exchange credentials for a session token.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<SessionResponse> {
    let invalid = || AppError::Unauthorized("Email ou senha incorretos".to_string());

    let Some((user, hash)) = state
        .repo
        .find_credentials(&normalize_email(&request.email))
        .await?
    else {
        return Err(invalid());
    };

    let password = request.password;
    let matched = tokio::task::spawn_blocking(move || auth::verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password task failed: {}", e)))??;
    if !matched {
        return Err(invalid());
    }

    let purged = state.repo.purge_expired_sessions().await?;
    if purged > 0 {
        tracing::debug!(purged, "Purged expired sessions");
    }

    success(issue_session(&state, user).await?)
}

/// POST /api/auth/logout - End the current session.
pub async fn logout(State(state): State<AppState>, current: CurrentUser) -> ApiResult<()> {
    state.repo.delete_session(&current.token).await?;
    success(())
}

/// GET /api/auth/me - Current profile.
pub async fn get_me(current: CurrentUser) -> ApiResult<User> {
    success(current.user)
}

/// PUT /api/auth/me - Update username and full name.
pub async fn update_me(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<User> {
    request.validate()?;
    success(state.repo.update_profile(&current.user.id, &request).await?)
}

/// PUT /api/auth/password - Replace the caller's password.
pub async fn change_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<()> {
    request.validate()?;

    let password_hash = hash_blocking(request.new_password).await?;
    state
        .repo
        .update_password(&current.user.id, &password_hash)
        .await?;
    success(())
}

async fn issue_session(state: &AppState, user: User) -> Result<SessionResponse, AppError> {
    let token = auth::generate_token();
    let expires_at = now() + Duration::days(state.config.session_days);
    state.repo.create_session(&token, &user.id, expires_at).await?;

    Ok(SessionResponse {
        token,
        expires_at,
        user,
    })
}

/// Argon2 is CPU bound; keep it off the async workers.
pub(crate) async fn hash_blocking(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || auth::hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password task failed: {}", e)))?
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

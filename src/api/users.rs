//! User management endpoints (admin only).

use axum::extract::{Path, State};

use super::extract::Json;
use super::{success, ApiResult};
use crate::auth::AdminUser;
use crate::errors::AppError;
use crate::models::{UpdateRoleRequest, User, UserWithCounts};
use crate::AppState;

/// GET /api/users - All users with activity counts.
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Vec<UserWithCounts>> {
    success(state.repo.list_users_with_counts().await?)
}

/// PUT /api/users/{id}/role - Promote or demote a user.
pub async fn update_user_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateRoleRequest>,
) -> ApiResult<User> {
    let target = modifiable_user(&state, &admin, &id).await?;
    let user = state.repo.update_role(&target.id, request.role).await?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "Changed user role");
    success(user)
}

/// DELETE /api/users/{id} - Delete a user and everything they own.
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let target = modifiable_user(&state, &admin, &id).await?;
    state.repo.delete_user(&target.id).await?;

    tracing::info!(user_id = %target.id, "Deleted user");
    success(())
}

/// Load the target user, refusing the caller's own account and the bootstrap admin.
async fn modifiable_user(state: &AppState, admin: &User, id: &str) -> Result<User, AppError> {
    let target = state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Usuário não encontrado".to_string()))?;

    if target.id == admin.id {
        return Err(AppError::Forbidden(
            "Você não pode alterar a sua própria conta".to_string(),
        ));
    }
    if is_protected(state.config.admin_email.as_deref(), &target) {
        return Err(AppError::Forbidden(
            "O administrador principal não pode ser alterado".to_string(),
        ));
    }
    Ok(target)
}

fn is_protected(admin_email: Option<&str>, user: &User) -> bool {
    admin_email.is_some_and(|email| email.trim().eq_ignore_ascii_case(&user.email))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn test_is_protected() {
        let user = User {
            id: "u1".into(),
            email: "admin@canvass.local".into(),
            username: "admin".into(),
            full_name: None,
            role: Role::Admin,
            created_at: chrono::Utc::now(),
        };
        assert!(is_protected(Some("Admin@Canvass.local"), &user));
        assert!(!is_protected(Some("other@canvass.local"), &user));
        assert!(!is_protected(None, &user));
    }
}

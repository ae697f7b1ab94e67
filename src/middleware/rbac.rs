// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::resolve_user,
    models::auth::{Role, SystemUser},
    services::auth::AuthService,
};

/// 1. O Trait que define o papel exigido por uma rota
pub trait RoleDef: Send + Sync + 'static {
    fn role() -> Role;
}

/// 2. O Extractor (Guardião) das rotas JSON: 401 sem sessão, 403 sem papel.
pub struct RequireRole<T> {
    pub user: SystemUser,
    _role: PhantomData<T>,
}

impl<T> FromRequestParts<AppState> for RequireRole<T>
where
    T: RoleDef,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = resolve_user(parts, state).await?;

        if !AuthService::authorize(&user, T::role()) {
            tracing::warn!("⛔ '{}' sem papel '{}' em {}", user.username, T::role(), parts.uri.path());
            return Err(AppError::Forbidden);
        }

        Ok(RequireRole { user, _role: PhantomData })
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

pub struct AdminRole;
impl RoleDef for AdminRole {
    fn role() -> Role { Role::Admin }
}

pub type RequireAdmin = RequireRole<AdminRole>;

// src/middleware/auth.rs

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{
    common::{error::AppError, flash::push_flash},
    config::AppState,
    models::auth::SystemUser,
};

pub const SESSION_COOKIE: &str = "sessao";

/// Cookie com o token da sessão. Expira junto com o navegador; a validade
/// real fica no `exp` do token.
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Lê o cookie de sessão e recarrega o usuário no Credential Store.
pub async fn resolve_user(parts: &Parts, state: &AppState) -> Result<SystemUser, AppError> {
    let jar = CookieJar::from_headers(&parts.headers);
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_owned())
        .ok_or(AppError::Unauthenticated)?;

    if !state.db_config.is_configured().await {
        return Err(AppError::NotConfigured);
    }

    state.auth_service.resolve_session(&token).await
}

// Extrator para as páginas HTML: sem sessão válida, redireciona.
pub struct CurrentUser(pub SystemUser);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match resolve_user(parts, state).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(AppError::NotConfigured) => Err(Redirect::to("/configurar-banco").into_response()),
            Err(AppError::Unauthenticated) => Err(Redirect::to("/login").into_response()),
            Err(e) => {
                let jar = push_flash(CookieJar::from_headers(&parts.headers), e.into_flash());
                Err((jar, Redirect::to("/login")).into_response())
            }
        }
    }
}

// Usuário opcional (tela de login, configuração do banco)
pub struct MaybeUser(pub Option<SystemUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve_user(parts, state).await.ok()))
    }
}

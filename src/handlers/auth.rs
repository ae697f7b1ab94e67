// src/handlers/auth.rs

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    common::{
        error::AppError,
        flash::{push_flash, take_flash, Flash},
        render::Page,
    },
    config::AppState,
    middleware::auth::{clear_session, session_cookie, CurrentUser, MaybeUser},
    models::auth::LoginForm,
};

// GET /
pub async fn index(State(app_state): State<AppState>, MaybeUser(user): MaybeUser) -> Redirect {
    if !app_state.db_config.is_configured().await {
        return Redirect::to("/configurar-banco");
    }

    match user {
        None => Redirect::to("/login"),
        Some(u) if u.is_admin() => Redirect::to("/admin-dashboard"),
        Some(_) => Redirect::to("/dashboard"),
    }
}

// GET /login
pub async fn login_page(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let (jar, flash) = take_flash(jar);
    let html = app_state
        .templates
        .render("login.html", &Page::new(None, flash.map(|f| f.view())))?;

    Ok((jar, html).into_response())
}

// POST /login
pub async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Form(payload): Form<LoginForm>,
) -> Result<Response, AppError> {
    if !app_state.db_config.is_configured().await {
        let jar = push_flash(jar, Flash::NotConfigured);
        return Ok((jar, Redirect::to("/configurar-banco")).into_response());
    }

    let result = app_state
        .auth_service
        .authenticate(&payload.username, &payload.password)
        .await
        .and_then(|user| app_state.auth_service.create_session_token(&user));

    match result {
        Ok(token) => {
            let jar = jar.add(session_cookie(token));
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(e) => {
            let flash = match e {
                AppError::InvalidCredentials => Flash::InvalidCredentials,
                e @ (AppError::NotConfigured | AppError::ConnectionFailed(_)) => e.into_flash(),
                other => {
                    tracing::error!("🔥 Falha no login de '{}': {}", payload.username, other);
                    Flash::LoginFailed
                }
            };

            let html = app_state
                .templates
                .render("login.html", &Page::new(None, Some(flash.view())))?;
            Ok((jar, html).into_response())
        }
    }
}

// GET /logout
pub async fn logout(CurrentUser(user): CurrentUser, jar: CookieJar) -> impl IntoResponse {
    tracing::info!("Logout de '{}'", user.username);
    let jar = push_flash(clear_session(jar), Flash::LoggedOut);
    (jar, Redirect::to("/login"))
}

// src/handlers/users.rs

use axum::{
    extract::{Path, State},
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
    middleware::auth::CurrentUser,
    models::auth::{CreateUserForm, SystemUser},
};

fn deny(user: &SystemUser, jar: CookieJar) -> Response {
    tracing::warn!("⛔ '{}' tentou acessar a gestão de usuários", user.username);
    (push_flash(jar, Flash::AccessDenied), Redirect::to("/")).into_response()
}

// GET /usuarios
pub async fn list_users(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    if !user.is_admin() {
        return Ok(deny(&user, jar));
    }

    let (jar, pending) = take_flash(jar);

    let (usuarios, flash) = match app_state.auth_service.list_users().await {
        Ok(list) => (list, pending),
        Err(e) => (Vec::new(), Some(e.into_flash())),
    };

    let page = Page::new(Some(&user), flash.map(|f| f.view())).with("usuarios", &usuarios);
    let html = app_state.templates.render("usuarios.html", &page)?;
    Ok((jar, html).into_response())
}

// POST /usuarios/adicionar
pub async fn add_user(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Form(payload): Form<CreateUserForm>,
) -> Response {
    if !user.is_admin() {
        return deny(&user, jar);
    }

    let flash = match app_state.auth_service.create_user(payload).await {
        Ok(()) => Flash::UserCreated,
        Err(e) => e.into_flash(),
    };

    (push_flash(jar, flash), Redirect::to("/usuarios")).into_response()
}

// GET /usuarios/deletar/{id}
pub async fn delete_user(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Path(user_id): Path<i32>,
) -> Response {
    if !user.is_admin() {
        return deny(&user, jar);
    }

    let flash = match app_state.auth_service.delete_user(&user, user_id).await {
        Ok(()) => Flash::UserRemoved,
        Err(e) => e.into_flash(),
    };

    (push_flash(jar, flash), Redirect::to("/usuarios")).into_response()
}

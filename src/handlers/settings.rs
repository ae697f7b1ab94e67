// src/handlers/settings.rs

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        flash::{push_flash, take_flash, Flash, FlashView},
        render::Page,
    },
    config::{persist_db_settings, AppState},
    middleware::auth::MaybeUser,
    models::{
        auth::SystemUser,
        settings::{DbSettings, DbSettingsForm},
    },
};

// Valores que voltam para o formulário (a senha nunca volta)
#[derive(Debug, Default, Serialize)]
struct FormValues {
    server: String,
    database: String,
    username: String,
}

impl From<&DbSettings> for FormValues {
    fn from(s: &DbSettings) -> Self {
        Self { server: s.server.clone(), database: s.database.clone(), username: s.username.clone() }
    }
}

/// Enquanto o banco não está configurado a tela é aberta; depois, só admin.
/// `Err` carrega a resposta de recusa.
async fn guard(app_state: &AppState, user: Option<&SystemUser>, jar: CookieJar) -> Result<CookieJar, Response> {
    if !app_state.db_config.is_configured().await {
        return Ok(jar);
    }

    match user {
        Some(u) if u.is_admin() => Ok(jar),
        Some(u) => {
            tracing::warn!("⛔ '{}' tentou acessar a configuração do banco", u.username);
            Err((push_flash(jar, Flash::AccessDenied), Redirect::to("/")).into_response())
        }
        None => Err(Redirect::to("/login").into_response()),
    }
}

fn render_form(
    app_state: &AppState,
    user: Option<&SystemUser>,
    flash: Option<FlashView>,
    values: &FormValues,
) -> Result<axum::response::Html<String>, AppError> {
    app_state
        .templates
        .render("config.html", &Page::new(user, flash).with("form", values))
}

// GET /configurar-banco
pub async fn config_page(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let jar = match guard(&app_state, user.as_ref(), jar).await {
        Ok(jar) => jar,
        Err(denied) => return Ok(denied),
    };

    let (jar, flash) = take_flash(jar);
    let values = app_state
        .db_config
        .current()
        .await
        .as_ref()
        .map(FormValues::from)
        .unwrap_or_default();

    let html = render_form(&app_state, user.as_ref(), flash.map(|f| f.view()), &values)?;
    Ok((jar, html).into_response())
}

// POST /configurar-banco
pub async fn save_config(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    Form(payload): Form<DbSettingsForm>,
) -> Result<Response, AppError> {
    let jar = match guard(&app_state, user.as_ref(), jar).await {
        Ok(jar) => jar,
        Err(denied) => return Ok(denied),
    };

    if let Err(errors) = payload.validate() {
        let message = AppError::ValidationError(errors).public_message();
        let values = FormValues {
            server: payload.server,
            database: payload.database,
            username: payload.username,
        };
        let html = render_form(&app_state, user.as_ref(), Some(FlashView::error(message)), &values)?;
        return Ok((jar, html).into_response());
    }

    let settings = DbSettings::from(payload);
    let values = FormValues::from(&settings);

    // 1. Testa a conexão com os parâmetros informados
    if let Err(e) = app_state.executor.test_connection(&settings).await {
        tracing::warn!("Teste de conexão com {} falhou: {}", settings.server, e);
        let html = render_form(&app_state, user.as_ref(), Some(Flash::ConnectionFailed.view()), &values)?;
        return Ok((jar, html).into_response());
    }

    // 2. Grava o .env e recarrega o ambiente
    if let Err(e) = persist_db_settings(&app_state.env_file, &settings) {
        let flash = AppError::from(e).into_flash();
        let html = render_form(&app_state, user.as_ref(), Some(flash.view()), &values)?;
        return Ok((jar, html).into_response());
    }

    // 3. Passa a usar os novos parâmetros
    app_state.db_config.replace(settings).await;
    tracing::info!("✅ Banco de dados configurado em {}", values.server);

    app_state.prepare_database().await;

    let jar = push_flash(jar, Flash::ConnectionOk);
    Ok((jar, Redirect::to("/login")).into_response())
}

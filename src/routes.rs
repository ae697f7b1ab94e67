// src/routes.rs

use axum::{
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers};

pub fn create_router(app_state: AppState) -> Router {
    // Telas HTML (sessão via cookie; sem sessão redireciona para /login)
    let page_routes = Router::new()
        .route("/", get(handlers::auth::index))
        .route("/login"
               ,get(handlers::auth::login_page)
               .post(handlers::auth::login)
        )
        .route("/logout", get(handlers::auth::logout))
        .route("/configurar-banco"
               ,get(handlers::settings::config_page)
               .post(handlers::settings::save_config)
        )
        .route("/dashboard", get(handlers::dashboard::rep_dashboard))
        .route("/admin-dashboard", get(handlers::dashboard::admin_dashboard))
        .route("/usuarios", get(handlers::users::list_users))
        .route("/usuarios/adicionar", post(handlers::users::add_user))
        .route("/usuarios/deletar/{id}", get(handlers::users::delete_user));

    // API JSON (401/403 em vez de redirecionar)
    let api_routes = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/vendedor-dados/{codigo}", get(handlers::dashboard::rep_trend));

    Router::new()
        .merge(page_routes)
        .merge(api_routes)
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}

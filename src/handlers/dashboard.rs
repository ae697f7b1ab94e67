// src/handlers/dashboard.rs

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::{
    common::{error::AppError, flash::take_flash, render::Page},
    config::AppState,
    middleware::{auth::CurrentUser, rbac::RequireAdmin},
    models::{
        dashboard::{AdminDashboard, RepDashboard},
        sales::MonthlyTrendEntry,
    },
};

// GET /dashboard
pub async fn rep_dashboard(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    if user.is_admin() {
        return Ok(Redirect::to("/admin-dashboard").into_response());
    }

    let (jar, pending) = take_flash(jar);

    let result = match user.rep_code {
        Some(code) => app_state.dashboard_service.build_rep_dashboard(code).await,
        None => Err(AppError::RepNotLinked),
    };

    let (dashboard, flash): (Option<RepDashboard>, _) = match result {
        Ok(d) => (Some(d), pending),
        Err(e) => {
            if let AppError::RepNotLinked | AppError::RepNotFound = e {
                tracing::info!("Vendedor sem dados: usuário '{}' código {:?}", user.username, user.rep_code);
            }
            (None, Some(e.into_flash()))
        }
    };

    let page = Page::new(Some(&user), flash.map(|f| f.view())).with("dashboard", &dashboard);
    let html = app_state.templates.render("vendedor.html", &page)?;
    Ok((jar, html).into_response())
}

#[derive(Debug, Deserialize)]
pub struct AdminDashboardParams {
    pub mostrar_inativos: Option<String>,
}

impl AdminDashboardParams {
    pub fn include_inactive(&self) -> bool {
        self.mostrar_inativos.as_deref() == Some("1")
    }
}

// GET /admin-dashboard
pub async fn admin_dashboard(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<AdminDashboardParams>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    if !user.is_admin() {
        return Ok(Redirect::to("/dashboard").into_response());
    }

    let include_inactive = params.include_inactive();
    let (jar, pending) = take_flash(jar);

    let (dashboard, flash): (Option<AdminDashboard>, _) =
        match app_state.dashboard_service.build_admin_dashboard(include_inactive).await {
            Ok(d) => (Some(d), pending),
            Err(e) => (None, Some(e.into_flash())),
        };

    let page = Page::new(Some(&user), flash.map(|f| f.view()))
        .with("dashboard", &dashboard)
        .with("mostrar_inativos", &include_inactive);
    let html = app_state.templates.render("admin.html", &page)?;
    Ok((jar, html).into_response())
}

// GET /api/vendedor-dados/{codigo}
#[utoipa::path(
    get,
    path = "/api/vendedor-dados/{codigo}",
    tag = "Vendedores",
    params(
        ("codigo" = i32, Path, description = "Código do vendedor (VENDE.Codigo)")
    ),
    responses(
        (status = 200, description = "Realizado e comissão por mês (últimos 6 meses)", body = Vec<MonthlyTrendEntry>),
        (status = 401, description = "Sessão ausente ou expirada"),
        (status = 403, description = "Não autorizado"),
        (status = 500, description = "Erro ao consultar o banco")
    ),
    security(
        ("sessao" = [])
    )
)]
pub async fn rep_trend(
    State(app_state): State<AppState>,
    _admin: RequireAdmin,
    Path(codigo): Path<i32>,
) -> Result<Json<Vec<MonthlyTrendEntry>>, AppError> {
    let trend = app_state.dashboard_service.monthly_trend(codigo).await?;
    Ok(Json(trend))
}

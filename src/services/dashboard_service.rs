// src/services/dashboard_service.rs

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::{AggregateQuery, SalesSource},
    models::{
        dashboard::{
            AdminDashboard, AdminRepRow, ChartData, RepBreakdown, RepDashboard, CHART_COLORS,
            CHART_LABELS,
        },
        sales::{trailing_window_start, MonthlyTrendEntry, RepAggregate, ReportPeriod},
    },
};

// Tamanho da janela da série mensal da API
pub const TREND_WINDOW_MONTHS: u32 = 6;

/// `realized / target * 100`, ou zero quando não há meta.
pub fn percent_of_target(realized: Decimal, target: Decimal) -> Decimal {
    if target > Decimal::ZERO {
        realized / target * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    }
}

/// Monta o painel individual a partir da linha do agregado.
pub fn rep_dashboard(rep: RepAggregate) -> RepDashboard {
    let target = rep.target_value.unwrap_or(Decimal::ZERO);
    let realized = rep.realized_value.unwrap_or(Decimal::ZERO);
    let commission = rep.commission_value.unwrap_or(Decimal::ZERO);

    RepDashboard {
        target,
        realized,
        commission,
        percent_of_target: percent_of_target(realized, target),
        chart: ChartData {
            labels: CHART_LABELS.to_vec(),
            values: vec![target, realized, commission],
            colors: CHART_COLORS.to_vec(),
        },
        rep,
    }
}

/// Totais e quebra por vendedor do painel do administrador.
pub fn admin_dashboard(reps: Vec<RepAggregate>, include_inactive: bool) -> AdminDashboard {
    let rows: Vec<AdminRepRow> = reps
        .into_iter()
        .map(|r| AdminRepRow {
            target: r.target_value.unwrap_or(Decimal::ZERO),
            realized: r.realized_value.unwrap_or(Decimal::ZERO),
            commission: r.commission_value.unwrap_or(Decimal::ZERO),
            code: r.code,
            name: r.name,
            establishment_code: r.establishment_code,
            supervisor_code: r.supervisor_code,
            email: r.email,
            tax_id: r.tax_id,
            status: r.status,
        })
        .collect();

    let breakdown = rows
        .iter()
        .map(|r| RepBreakdown {
            name: r.name.clone(),
            target: r.target,
            realized: r.realized,
            commission: r.commission,
        })
        .collect();

    AdminDashboard {
        include_inactive,
        total_target: rows.iter().map(|r| r.target).sum(),
        total_realized: rows.iter().map(|r| r.realized).sum(),
        total_commission: rows.iter().map(|r| r.commission).sum(),
        breakdown,
        rows,
    }
}

#[derive(Clone)]
pub struct DashboardService {
    sales: Arc<dyn SalesSource>,
}

impl DashboardService {
    pub fn new(sales: Arc<dyn SalesSource>) -> Self {
        Self { sales }
    }

    fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }

    pub async fn build_rep_dashboard(&self, rep_code: i32) -> Result<RepDashboard, AppError> {
        self.build_rep_dashboard_at(rep_code, Self::now()).await
    }

    pub async fn build_rep_dashboard_at(
        &self,
        rep_code: i32,
        now: NaiveDateTime,
    ) -> Result<RepDashboard, AppError> {
        let query = AggregateQuery::for_rep(rep_code, ReportPeriod::current_month(now.date()));

        let rep = self
            .sales
            .rep_aggregates(&query)
            .await?
            .into_iter()
            .next()
            .ok_or(AppError::RepNotFound)?;

        Ok(rep_dashboard(rep))
    }

    pub async fn build_admin_dashboard(&self, include_inactive: bool) -> Result<AdminDashboard, AppError> {
        self.build_admin_dashboard_at(include_inactive, Self::now()).await
    }

    pub async fn build_admin_dashboard_at(
        &self,
        include_inactive: bool,
        now: NaiveDateTime,
    ) -> Result<AdminDashboard, AppError> {
        let query = AggregateQuery::for_all(include_inactive, ReportPeriod::current_month(now.date()));
        let reps = self.sales.rep_aggregates(&query).await?;

        tracing::info!("📊 Painel administrativo: {} vendedores", reps.len());
        Ok(admin_dashboard(reps, include_inactive))
    }

    pub async fn monthly_trend(&self, rep_code: i32) -> Result<Vec<MonthlyTrendEntry>, AppError> {
        let since = trailing_window_start(Self::now(), TREND_WINDOW_MONTHS);
        self.sales.monthly_trend(rep_code, since).await
    }
}

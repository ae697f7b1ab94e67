// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::sales::{RepAggregate, RepStatus};

pub const CHART_LABELS: [&str; 3] = ["Meta", "Realizado", "Comissão"];
pub const CHART_COLORS: [&str; 3] = ["#3498db", "#2ecc71", "#f39c12"];

// Dados do gráfico de barras do painel individual
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<&'static str>,
    pub values: Vec<Decimal>,
    pub colors: Vec<&'static str>,
}

// 1. Painel do vendedor
#[derive(Debug, Clone, Serialize)]
pub struct RepDashboard {
    pub rep: RepAggregate,
    pub target: Decimal,
    pub realized: Decimal,
    pub commission: Decimal,
    pub percent_of_target: Decimal,
    pub chart: ChartData,
}

// 2. Painel do administrador
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepBreakdown {
    pub name: String,
    pub target: Decimal,
    pub realized: Decimal,
    pub commission: Decimal,
}

// Linha da tabela: cadastro + valores já sem NULL
#[derive(Debug, Clone, Serialize)]
pub struct AdminRepRow {
    pub code: i32,
    pub name: String,
    pub establishment_code: Option<String>,
    pub supervisor_code: Option<String>,
    pub email: Option<String>,
    pub tax_id: Option<String>,
    pub status: RepStatus,
    pub target: Decimal,
    pub realized: Decimal,
    pub commission: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub include_inactive: bool,
    pub total_target: Decimal,
    pub total_realized: Decimal,
    pub total_commission: Decimal,
    pub breakdown: Vec<RepBreakdown>,
    pub rows: Vec<AdminRepRow>,
}

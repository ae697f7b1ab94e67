// src/models/sales.rs

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

// Situação exibida na tela. Mantém a regra do ERP: Bloqueado = 0 é INATIVO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RepStatus {
    Ativo,
    Inativo,
}

impl RepStatus {
    pub fn from_blocked_flag(flag: Option<i64>) -> Self {
        match flag {
            Some(0) => RepStatus::Inativo,
            _ => RepStatus::Ativo,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RepStatus::Ativo => "ATIVO",
            RepStatus::Inativo => "INATIVO",
        }
    }
}

// Uma linha do agregado: cadastro do vendedor (VENDE) + vendas do mês
#[derive(Debug, Clone, Serialize)]
pub struct RepAggregate {
    pub code: i32,
    pub name: String,
    pub establishment_code: Option<String>,
    pub target_value: Option<Decimal>,
    pub realized_value: Option<Decimal>,
    pub supervisor_code: Option<String>,
    pub commission_value: Option<Decimal>,
    pub email: Option<String>,
    pub tax_id: Option<String>,
    pub blocked_flag: Option<i64>,
    pub status: RepStatus,
}

// Ponto da série mensal (API /api/vendedor-dados)
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlyTrendEntry {
    #[schema(example = 2025)]
    pub year: i32,
    /// Mês do ano, 1..=12
    #[schema(example = 3)]
    pub month: u32,
    #[schema(value_type = f64, example = 15230.5)]
    pub realized: Decimal,
    #[schema(value_type = f64, example = 761.52)]
    pub commission: Decimal,
}

/// Intervalo semiaberto `[start, end)` usado nas somas de notas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPeriod {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ReportPeriod {
    /// Mês-calendário que contém `today`.
    pub fn current_month(today: NaiveDate) -> Self {
        let first = today.with_day(1).unwrap_or(today);
        let next = first.checked_add_months(Months::new(1)).unwrap_or(first);

        Self {
            start: first.and_time(NaiveTime::MIN),
            end: next.and_time(NaiveTime::MIN),
        }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.start && at < self.end
    }
}

/// Início da janela móvel de `months` meses terminando em `now`.
pub fn trailing_window_start(now: NaiveDateTime, months: u32) -> NaiveDateTime {
    now.checked_sub_months(Months::new(months)).unwrap_or(now)
}

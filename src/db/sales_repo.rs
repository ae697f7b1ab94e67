// src/db/sales_repo.rs

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::executor::{QueryExecutor, Record, SqlParam, SqlValue},
    models::sales::{MonthlyTrendEntry, RepAggregate, RepStatus, ReportPeriod},
};

// Canal de venda excluído dos painéis (telemarketing)
pub const EXCLUDED_CHANNEL: &str = "TLM";

// Valor líquido de um item de nota, descontados ST, ressarcimentos e despesas
const ITEM_NET_VALUE: &str = "it.vlr_liqitem - it.vlr_substrib - it.vlr_sbtres \
     - it.vlr_recsbt - it.vlr_substribemb - it.vlr_desprateada";

/// Filtros do agregado de vendas por vendedor. A mesma query atende o painel
/// individual (com `rep_code`) e o painel do administrador (sem).
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateQuery {
    pub rep_code: Option<i32>,
    pub include_inactive: bool,
    pub period: ReportPeriod,
}

impl AggregateQuery {
    pub fn for_rep(rep_code: i32, period: ReportPeriod) -> Self {
        // No painel individual o vendedor aparece mesmo bloqueado
        Self { rep_code: Some(rep_code), include_inactive: true, period }
    }

    pub fn for_all(include_inactive: bool, period: ReportPeriod) -> Self {
        Self { rep_code: None, include_inactive, period }
    }

    /// Monta o SQL e os parâmetros posicionais.
    pub fn to_sql(&self) -> (String, Vec<SqlParam>) {
        let mut params = vec![
            SqlParam::Timestamp(self.period.start),
            SqlParam::Timestamp(self.period.end),
            SqlParam::Text(EXCLUDED_CHANNEL.to_string()),
        ];

        let mut sql = format!(
            r#"
            SELECT v.codigo, v.nome_guerra, v.cod_estabeope, v.vlr_objetivo,
                   COALESCE(n.vlr_realizado, 0) AS vlr_realizado,
                   v.cod_supervisor,
                   COALESCE(n.vlr_comissao, 0) AS vlr_comissao,
                   v.email, v.cgc AS cpf_cnpj, v.bloqueado
            FROM vende v
            LEFT OUTER JOIN (
                SELECT x.cod_vendedor,
                       SUM(x.vlr_realizado) AS vlr_realizado,
                       SUM(x.vlr_comissao) AS vlr_comissao
                FROM (
                    SELECT cb.cod_vendedor, cb.cod_estabe, cb.ser_nota, cb.num_nota,
                           ROUND(SUM({ITEM_NET_VALUE})::numeric, 2) AS vlr_realizado,
                           ROUND(SUM(it.vlr_comissao)::numeric, 2) AS vlr_comissao
                    FROM nfscb cb
                    INNER JOIN nfsit it
                        ON cb.cod_estabe = it.cod_estabe
                       AND cb.ser_nota = it.ser_nota
                       AND cb.num_nota = it.num_nota
                    WHERE cb.status = 'F'
                      AND cb.tip_saida = 'V'
                      AND cb.dat_emissao >= $1
                      AND cb.dat_emissao < $2
                    GROUP BY cb.cod_vendedor, cb.cod_estabe, cb.ser_nota, cb.num_nota
                ) x
                GROUP BY x.cod_vendedor
            ) n ON v.codigo = n.cod_vendedor
            WHERE v.cod_tipvenbas <> $3
              AND v.flg_export = 1
            "#
        );

        if let Some(code) = self.rep_code {
            params.push(SqlParam::Int(code));
            sql.push_str(&format!(" AND v.codigo = ${}", params.len()));
        }

        // Ativo = bloqueado <> 0 (regra herdada do ERP)
        if !self.include_inactive {
            sql.push_str(" AND v.bloqueado <> 0");
        }

        sql.push_str(" ORDER BY v.nome_guerra");
        (sql, params)
    }
}

fn monthly_trend_sql() -> String {
    format!(
        r#"
        SELECT EXTRACT(YEAR FROM cb.dat_emissao)::int AS ano,
               EXTRACT(MONTH FROM cb.dat_emissao)::int AS mes,
               COALESCE(SUM({ITEM_NET_VALUE}), 0)::numeric AS realizado,
               COALESCE(SUM(it.vlr_comissao), 0)::numeric AS comissao
        FROM nfscb cb
        INNER JOIN nfsit it
            ON cb.cod_estabe = it.cod_estabe
           AND cb.ser_nota = it.ser_nota
           AND cb.num_nota = it.num_nota
        WHERE cb.status = 'F'
          AND cb.tip_saida = 'V'
          AND cb.cod_vendedor = $1
          AND cb.dat_emissao >= $2
        GROUP BY 1, 2
        ORDER BY 1, 2
        "#
    )
}

// Fonte dos números de vendas (banco do ERP em produção, memória nos testes)
#[async_trait]
pub trait SalesSource: Send + Sync {
    async fn rep_aggregates(&self, query: &AggregateQuery) -> Result<Vec<RepAggregate>, AppError>;

    /// Vendas do vendedor desde `since`, por (ano, mês), em ordem crescente.
    async fn monthly_trend(
        &self,
        rep_code: i32,
        since: NaiveDateTime,
    ) -> Result<Vec<MonthlyTrendEntry>, AppError>;
}

#[derive(Clone)]
pub struct SalesRepository {
    executor: QueryExecutor,
}

impl SalesRepository {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }
}

fn aggregate_from_record(record: &Record) -> Result<RepAggregate, AppError> {
    let code = record
        .opt_i32("codigo")
        .ok_or_else(|| anyhow::anyhow!("vende.codigo ausente ou não numérico"))?;
    let blocked_flag = record.opt_i64("bloqueado");

    Ok(RepAggregate {
        code,
        name: record.string_or_empty("nome_guerra"),
        establishment_code: record.opt_string("cod_estabeope"),
        target_value: nullable_decimal(record, "vlr_objetivo"),
        realized_value: nullable_decimal(record, "vlr_realizado"),
        supervisor_code: record.opt_string("cod_supervisor"),
        commission_value: nullable_decimal(record, "vlr_comissao"),
        email: record.opt_string("email"),
        tax_id: record.opt_string("cpf_cnpj"),
        blocked_flag,
        status: RepStatus::from_blocked_flag(blocked_flag),
    })
}

fn nullable_decimal(record: &Record, column: &str) -> Option<Decimal> {
    match record.get(column)? {
        SqlValue::Null => None,
        _ => Some(record.decimal_or_zero(column)),
    }
}

fn trend_from_record(record: &Record) -> MonthlyTrendEntry {
    MonthlyTrendEntry {
        year: record.opt_i32("ano").unwrap_or_default(),
        month: record.opt_i64("mes").and_then(|m| u32::try_from(m).ok()).unwrap_or_default(),
        realized: record.decimal_or_zero("realizado"),
        commission: record.decimal_or_zero("comissao"),
    }
}

#[async_trait]
impl SalesSource for SalesRepository {
    async fn rep_aggregates(&self, query: &AggregateQuery) -> Result<Vec<RepAggregate>, AppError> {
        let (sql, params) = query.to_sql();

        self.executor
            .execute(&sql, &params)
            .await?
            .into_rows()
            .iter()
            .map(aggregate_from_record)
            .collect()
    }

    async fn monthly_trend(
        &self,
        rep_code: i32,
        since: NaiveDateTime,
    ) -> Result<Vec<MonthlyTrendEntry>, AppError> {
        let params = [SqlParam::Int(rep_code), SqlParam::Timestamp(since)];
        let rows = self
            .executor
            .execute(&monthly_trend_sql(), &params)
            .await?
            .into_rows();

        Ok(rows.iter().map(trend_from_record).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::executor::is_read_statement;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn period() -> ReportPeriod {
        ReportPeriod::current_month(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap())
    }

    #[test]
    fn rep_query_binds_code_after_period_and_channel() {
        let (sql, params) = AggregateQuery::for_rep(42, period()).to_sql();

        assert!(is_read_statement(&sql));
        assert!(sql.contains("AND v.codigo = $4"));
        assert!(!sql.contains("v.bloqueado <> 0"));
        assert_eq!(params.len(), 4);
        assert_eq!(params[2], SqlParam::Text("TLM".into()));
        assert_eq!(params[3], SqlParam::Int(42));
    }

    #[test]
    fn admin_query_filters_inactive_unless_requested() {
        let (active_only, params) = AggregateQuery::for_all(false, period()).to_sql();
        assert!(active_only.contains("AND v.bloqueado <> 0"));
        assert!(!active_only.contains("v.codigo = $"));
        assert_eq!(params.len(), 3);

        let (all, _) = AggregateQuery::for_all(true, period()).to_sql();
        assert!(!all.contains("v.bloqueado <> 0"));
        assert!(all.trim_end().ends_with("ORDER BY v.nome_guerra"));
    }

    #[test]
    fn aggregate_record_keeps_nulls_distinct_from_zero() {
        let record = Record::new(vec![
            ("codigo".into(), SqlValue::Int(10)),
            ("nome_guerra".into(), SqlValue::Text("MARIA".into())),
            ("vlr_objetivo".into(), SqlValue::Null),
            ("vlr_realizado".into(), SqlValue::Decimal(dec!(0))),
            ("vlr_comissao".into(), SqlValue::Decimal(dec!(12.5))),
            ("bloqueado".into(), SqlValue::Int(0)),
        ]);

        let rep = aggregate_from_record(&record).unwrap();
        assert_eq!(rep.code, 10);
        assert_eq!(rep.target_value, None);
        assert_eq!(rep.realized_value, Some(dec!(0)));
        assert_eq!(rep.commission_value, Some(dec!(12.5)));
        assert_eq!(rep.status, RepStatus::Inativo);
    }

    #[test]
    fn trend_record_mapping() {
        let record = Record::new(vec![
            ("ano".into(), SqlValue::Int(2025)),
            ("mes".into(), SqlValue::Int(11)),
            ("realizado".into(), SqlValue::Decimal(dec!(900.10))),
            ("comissao".into(), SqlValue::Null),
        ]);

        let entry = trend_from_record(&record);
        assert_eq!(entry.year, 2025);
        assert_eq!(entry.month, 11);
        assert_eq!(entry.realized, dec!(900.10));
        assert_eq!(entry.commission, dec!(0));
    }
}

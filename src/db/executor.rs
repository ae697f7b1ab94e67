// src/db/executor.rs

use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::{prelude::FromPrimitive, Decimal};
use serde::{ser::SerializeMap, Serialize, Serializer};
use sqlx::{
    postgres::{PgArguments, PgConnectOptions, PgRow},
    query::Query,
    Column, Connection, PgConnection, Postgres, Row, TypeInfo,
};
use thiserror::Error;

use crate::{config::DbConfigHandle, models::settings::DbSettings};

// Falhas do executor. "Nenhuma linha" NÃO é erro: vira `Rows(vec![])`.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Banco de dados não configurado")]
    NotConfigured,

    #[error("Falha na conexão: {0}")]
    ConnectionFailed(String),

    #[error("Falha na query: {0}")]
    QueryFailed(#[from] sqlx::Error),
}

impl DbError {
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DbError::QueryFailed(e) => e
                .as_database_error()
                .map(|db_err| db_err.is_unique_violation())
                .unwrap_or(false),
            _ => false,
        }
    }
}

/// Parâmetro posicional ($1, $2, ...) de uma query.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i32),
    OptInt(Option<i32>),
    Text(String),
    Bool(bool),
    Decimal(Decimal),
    Timestamp(NaiveDateTime),
}

/// Valor de uma coluna já decodificado.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
}

impl Serialize for SqlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SqlValue::Null => serializer.serialize_none(),
            SqlValue::Int(v) => serializer.serialize_i64(*v),
            SqlValue::Float(v) => serializer.serialize_f64(*v),
            SqlValue::Decimal(v) => Serialize::serialize(v, serializer),
            SqlValue::Text(v) => serializer.serialize_str(v),
            SqlValue::Bool(v) => serializer.serialize_bool(*v),
            SqlValue::Date(v) => Serialize::serialize(v, serializer),
            SqlValue::Timestamp(v) => Serialize::serialize(v, serializer),
            SqlValue::TimestampTz(v) => Serialize::serialize(v, serializer),
        }
    }
}

/// Uma linha do resultado: colunas na ordem dos metadados da query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    columns: Vec<(String, SqlValue)>,
}

impl Record {
    pub fn new(columns: Vec<(String, SqlValue)>) -> Self {
        Self { columns }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    }

    /// Valor numérico da coluna; NULL ou ausente vira zero.
    pub fn decimal_or_zero(&self, column: &str) -> Decimal {
        match self.get(column) {
            Some(SqlValue::Decimal(d)) => *d,
            Some(SqlValue::Int(i)) => Decimal::from(*i),
            Some(SqlValue::Float(f)) => Decimal::from_f64(*f).unwrap_or(Decimal::ZERO),
            Some(SqlValue::Bool(b)) => Decimal::from(*b as i32),
            _ => Decimal::ZERO,
        }
    }

    pub fn opt_i64(&self, column: &str) -> Option<i64> {
        match self.get(column)? {
            SqlValue::Int(i) => Some(*i),
            SqlValue::Decimal(d) => d.trunc().try_into().ok(),
            SqlValue::Bool(b) => Some(*b as i64),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn opt_i32(&self, column: &str) -> Option<i32> {
        self.opt_i64(column).and_then(|v| i32::try_from(v).ok())
    }

    pub fn opt_string(&self, column: &str) -> Option<String> {
        match self.get(column)? {
            SqlValue::Null => None,
            SqlValue::Text(s) => Some(s.clone()),
            SqlValue::Int(i) => Some(i.to_string()),
            SqlValue::Decimal(d) => Some(d.to_string()),
            other => serde_json::to_value(other)
                .ok()
                .map(|v| v.to_string()),
        }
    }

    pub fn string_or_empty(&self, column: &str) -> String {
        self.opt_string(column).unwrap_or_default()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Rows(Vec<Record>),
    Affected(u64),
}

impl QueryOutcome {
    /// Linhas de um SELECT. Um resultado de escrita não tem linhas.
    pub fn into_rows(self) -> Vec<Record> {
        match self {
            QueryOutcome::Rows(rows) => rows,
            QueryOutcome::Affected(_) => Vec::new(),
        }
    }

    pub fn affected(&self) -> u64 {
        match self {
            QueryOutcome::Rows(_) => 0,
            QueryOutcome::Affected(n) => *n,
        }
    }
}

/// Decide se o texto é uma leitura (SELECT / WITH), ignorando caixa e espaços.
pub fn is_read_statement(sql: &str) -> bool {
    let head: String = sql.trim_start().chars().take(6).collect();
    let head = head.to_ascii_uppercase();
    head.starts_with("SELECT") || head.starts_with("WITH")
}

// Executor de queries: abre uma conexão nova a cada chamada.
#[derive(Clone)]
pub struct QueryExecutor {
    config: DbConfigHandle,
    connect_timeout: Duration,
}

impl QueryExecutor {
    pub fn new(config: DbConfigHandle, connect_timeout: Duration) -> Self {
        Self { config, connect_timeout }
    }

    /// Executa `sql` com os parâmetros dados.
    /// Leitura -> `Rows`; escrita -> commit e `Affected`.
    pub async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<QueryOutcome, DbError> {
        let settings = self.config.current().await.ok_or(DbError::NotConfigured)?;
        let mut conn = connect(&settings, self.connect_timeout).await?;

        // Em caso de erro a conexão é descartada no drop (fecha o socket).
        let outcome = run_statement(&mut conn, sql, params).await?;

        if let Err(e) = conn.close().await {
            tracing::warn!("Falha ao encerrar conexão: {}", e);
        }

        Ok(outcome)
    }

    /// Abre e fecha uma conexão com as credenciais informadas.
    pub async fn test_connection(&self, settings: &DbSettings) -> Result<(), DbError> {
        let conn = connect(settings, self.connect_timeout).await?;
        conn.close()
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))
    }

    /// Aplica as migrações da tabela de usuários do sistema.
    pub async fn run_migrations(&self) -> Result<(), DbError> {
        let settings = self.config.current().await.ok_or(DbError::NotConfigured)?;
        let mut conn = connect(&settings, self.connect_timeout).await?;

        // run_direct: `run` sobre `&mut PgConnection` não gera future `Send`
        sqlx::migrate!()
            .run_direct(&mut conn)
            .await
            .map_err(|e| DbError::QueryFailed(e.into()))?;

        if let Err(e) = conn.close().await {
            tracing::warn!("Falha ao encerrar conexão: {}", e);
        }
        Ok(())
    }
}

fn connect_options(settings: &DbSettings) -> PgConnectOptions {
    let (host, port) = settings.host_and_port();
    PgConnectOptions::new()
        .host(host)
        .port(port)
        .database(&settings.database)
        .username(&settings.username)
        .password(&settings.password)
}

async fn connect(settings: &DbSettings, timeout: Duration) -> Result<PgConnection, DbError> {
    let options = connect_options(settings);

    match tokio::time::timeout(timeout, PgConnection::connect_with(&options)).await {
        Ok(Ok(conn)) => Ok(conn),
        Ok(Err(e)) => {
            tracing::error!("🔥 Erro na conexão com {}: {}", settings.server, e);
            Err(DbError::ConnectionFailed(e.to_string()))
        }
        Err(_) => {
            tracing::error!("🔥 Tempo esgotado ao conectar em {}", settings.server);
            Err(DbError::ConnectionFailed(format!(
                "tempo esgotado após {}s",
                timeout.as_secs()
            )))
        }
    }
}

fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[SqlParam],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            SqlParam::Int(v) => query.bind(*v),
            SqlParam::OptInt(v) => query.bind(*v),
            SqlParam::Text(v) => query.bind(v.clone()),
            SqlParam::Bool(v) => query.bind(*v),
            SqlParam::Decimal(v) => query.bind(*v),
            SqlParam::Timestamp(v) => query.bind(*v),
        };
    }
    query
}

async fn run_statement(
    conn: &mut PgConnection,
    sql: &str,
    params: &[SqlParam],
) -> Result<QueryOutcome, DbError> {
    if is_read_statement(sql) {
        let rows = bind_params(sqlx::query(sql), params)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| {
                tracing::error!("Erro na query: {}", e);
                DbError::QueryFailed(e)
            })?;

        return Ok(QueryOutcome::Rows(rows.iter().map(row_to_record).collect()));
    }

    // INSERT / UPDATE / DELETE: commit explícito
    let mut tx = conn.begin().await?;
    let result = bind_params(sqlx::query(sql), params)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Erro na query: {}", e);
            DbError::QueryFailed(e)
        })?;
    tx.commit().await?;

    Ok(QueryOutcome::Affected(result.rows_affected()))
}

fn row_to_record(row: &PgRow) -> Record {
    let columns = row
        .columns()
        .iter()
        .map(|col| (col.name().to_string(), decode_column(row, col.ordinal(), col.type_info().name())))
        .collect();
    Record::new(columns)
}

fn decode_column(row: &PgRow, idx: usize, type_name: &str) -> SqlValue {
    fn get<'r, T>(row: &'r PgRow, idx: usize) -> Option<T>
    where
        T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
    {
        row.try_get::<Option<T>, _>(idx).ok().flatten()
    }

    let value = match type_name {
        "INT2" => get::<i16>(row, idx).map(|v| SqlValue::Int(v.into())),
        "INT4" => get::<i32>(row, idx).map(|v| SqlValue::Int(v.into())),
        "INT8" => get::<i64>(row, idx).map(SqlValue::Int),
        "FLOAT4" => get::<f32>(row, idx).map(|v| SqlValue::Float(v.into())),
        "FLOAT8" => get::<f64>(row, idx).map(SqlValue::Float),
        "NUMERIC" => get::<Decimal>(row, idx).map(SqlValue::Decimal),
        "BOOL" => get::<bool>(row, idx).map(SqlValue::Bool),
        "DATE" => get::<NaiveDate>(row, idx).map(SqlValue::Date),
        "TIMESTAMP" => get::<NaiveDateTime>(row, idx).map(SqlValue::Timestamp),
        "TIMESTAMPTZ" => get::<DateTime<Utc>>(row, idx).map(SqlValue::TimestampTz),
        // TEXT, VARCHAR, BPCHAR, NAME e qualquer outro tipo textual
        _ => get::<String>(row, idx).map(SqlValue::Text),
    };

    value.unwrap_or(SqlValue::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn read_statement_detection_ignores_case_and_whitespace() {
        assert!(is_read_statement("SELECT 1"));
        assert!(is_read_statement("   \n\tselect * from vende"));
        assert!(is_read_statement("With x as (select 1) select * from x"));
        assert!(!is_read_statement("INSERT INTO usuarios_sistema VALUES (1)"));
        assert!(!is_read_statement("  delete from usuarios_sistema"));
        assert!(!is_read_statement(""));
    }

    #[test]
    fn record_keeps_column_order_when_serialized() {
        let record = Record::new(vec![
            ("mes".into(), SqlValue::Int(3)),
            ("realizado".into(), SqlValue::Decimal(dec!(150.25))),
            ("comissao".into(), SqlValue::Null),
        ]);

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"mes":3,"realizado":150.25,"comissao":null}"#);
        assert_eq!(record.column_names().collect::<Vec<_>>(), ["mes", "realizado", "comissao"]);
    }

    #[test]
    fn values_serialize_as_plain_json() {
        assert_eq!(serde_json::to_value(SqlValue::Decimal(dec!(1234.56))).unwrap(), serde_json::json!(1234.56));
        assert_eq!(serde_json::to_value(SqlValue::Null).unwrap(), serde_json::Value::Null);
        assert_eq!(serde_json::to_value(SqlValue::Text("ANA".into())).unwrap(), serde_json::json!("ANA"));

        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(serde_json::to_value(SqlValue::Date(date)).unwrap(), serde_json::json!("2025-03-01"));
    }

    #[test]
    fn migration_future_can_cross_threads() {
        fn assert_send<T: Send>(_: &T) {}

        let executor = QueryExecutor::new(DbConfigHandle::new(None), Duration::from_secs(1));
        let future = executor.run_migrations();
        assert_send(&future);
    }

    #[test]
    fn null_and_missing_numbers_coalesce_to_zero() {
        let record = Record::new(vec![
            ("vlr_objetivo".into(), SqlValue::Null),
            ("vlr_realizado".into(), SqlValue::Int(2500)),
        ]);

        assert_eq!(record.decimal_or_zero("vlr_objetivo"), Decimal::ZERO);
        assert_eq!(record.decimal_or_zero("vlr_comissao"), Decimal::ZERO);
        assert_eq!(record.decimal_or_zero("VLR_REALIZADO"), dec!(2500));
    }

    #[test]
    fn outcome_accessors() {
        assert_eq!(QueryOutcome::Affected(2).affected(), 2);
        assert!(QueryOutcome::Affected(2).into_rows().is_empty());
        assert_eq!(QueryOutcome::Rows(vec![Record::default()]).into_rows().len(), 1);
    }
}

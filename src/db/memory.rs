// src/db/memory.rs
//
// Implementações em memória do CredentialStore e do SalesSource.
// Servem como dublês de teste; a aplicação em produção usa o banco.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::{
    common::error::AppError,
    db::{
        sales_repo::{AggregateQuery, SalesSource},
        user_repo::CredentialStore,
    },
    models::{
        auth::{NewSystemUser, SystemUser},
        sales::{MonthlyTrendEntry, RepAggregate},
    },
};

#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: Mutex<Vec<SystemUser>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insere diretamente, devolvendo o id gerado.
    pub fn insert(&self, user: NewSystemUser) -> i32 {
        let mut users = self.lock();
        let id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        users.push(SystemUser {
            id,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            rep_code: user.rep_code,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SystemUser>> {
        // Um teste que entrou em pânico não deve derrubar os outros
        self.users.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<SystemUser>, AppError> {
        Ok(self.lock().iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<SystemUser>, AppError> {
        Ok(self.lock().iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, user: NewSystemUser) -> Result<(), AppError> {
        if self.lock().iter().any(|u| u.username == user.username) {
            return Err(AppError::UsernameAlreadyExists);
        }
        self.insert(user);
        Ok(())
    }

    async fn delete_user(&self, id: i32) -> Result<u64, AppError> {
        let mut users = self.lock();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok((before - users.len()) as u64)
    }

    async fn list_users(&self) -> Result<Vec<SystemUser>, AppError> {
        let mut users = self.lock().clone();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}

// Vendedores e séries mensais fixos. O período do mês não é aplicado:
// os valores de `reps` já representam o mês corrente.
#[derive(Default)]
pub struct InMemorySalesSource {
    pub reps: Vec<RepAggregate>,
    pub trends: Vec<(i32, MonthlyTrendEntry)>,
}

impl InMemorySalesSource {
    pub fn new(reps: Vec<RepAggregate>) -> Self {
        Self { reps, trends: Vec::new() }
    }

    pub fn with_trend(mut self, rep_code: i32, entry: MonthlyTrendEntry) -> Self {
        self.trends.push((rep_code, entry));
        self
    }
}

#[async_trait]
impl SalesSource for InMemorySalesSource {
    async fn rep_aggregates(&self, query: &AggregateQuery) -> Result<Vec<RepAggregate>, AppError> {
        let mut rows: Vec<RepAggregate> = self
            .reps
            .iter()
            .filter(|r| query.rep_code.is_none_or(|code| r.code == code))
            .filter(|r| query.include_inactive || r.blocked_flag.is_some_and(|flag| flag != 0))
            .cloned()
            .collect();

        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn monthly_trend(
        &self,
        rep_code: i32,
        _since: NaiveDateTime,
    ) -> Result<Vec<MonthlyTrendEntry>, AppError> {
        let mut entries: Vec<MonthlyTrendEntry> = self
            .trends
            .iter()
            .filter(|(code, _)| *code == rep_code)
            .map(|(_, entry)| entry.clone())
            .collect();

        entries.sort_by_key(|e| (e.year, e.month));
        Ok(entries)
    }
}

// src/db/user_repo.rs

use async_trait::async_trait;

use crate::{
    common::error::AppError,
    db::executor::{QueryExecutor, Record, SqlParam},
    models::auth::{NewSystemUser, Role, SystemUser},
};

// O "Credential Store": tudo que o login e a gestão de usuários precisam.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<SystemUser>, AppError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<SystemUser>, AppError>;

    /// Insere o usuário. Nome repetido -> `UsernameAlreadyExists`.
    async fn create_user(&self, user: NewSystemUser) -> Result<(), AppError>;

    /// Remove o usuário e devolve quantas linhas saíram.
    async fn delete_user(&self, id: i32) -> Result<u64, AppError>;

    async fn list_users(&self) -> Result<Vec<SystemUser>, AppError>;
}

const USER_COLUMNS: &str = "id, username, password_hash, role, codigo_vendedor";

// O repositório de usuários, responsável pela tabela 'usuarios_sistema'
#[derive(Clone)]
pub struct UserRepository {
    executor: QueryExecutor,
}

impl UserRepository {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    async fn fetch_one(&self, sql: &str, params: &[SqlParam]) -> Result<Option<SystemUser>, AppError> {
        let rows = self.executor.execute(sql, params).await?.into_rows();
        rows.first().map(user_from_record).transpose()
    }
}

fn user_from_record(record: &Record) -> Result<SystemUser, AppError> {
    let id = record
        .opt_i32("id")
        .ok_or_else(|| anyhow::anyhow!("usuarios_sistema sem coluna id"))?;

    let role_text = record.string_or_empty("role");
    let role = role_text
        .parse::<Role>()
        .map_err(|_| anyhow::anyhow!("Papel desconhecido '{}' para o usuário {}", role_text, id))?;

    Ok(SystemUser {
        id,
        username: record.string_or_empty("username"),
        password_hash: record.string_or_empty("password_hash"),
        role,
        rep_code: record.opt_i32("codigo_vendedor"),
    })
}

#[async_trait]
impl CredentialStore for UserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<SystemUser>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM usuarios_sistema WHERE username = $1");
        self.fetch_one(&sql, &[SqlParam::Text(username.to_string())]).await
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<SystemUser>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM usuarios_sistema WHERE id = $1");
        self.fetch_one(&sql, &[SqlParam::Int(id)]).await
    }

    async fn create_user(&self, user: NewSystemUser) -> Result<(), AppError> {
        let params = [
            SqlParam::Text(user.username),
            SqlParam::Text(user.password_hash),
            SqlParam::Text(user.role.as_str().to_string()),
            SqlParam::OptInt(user.rep_code),
        ];

        self.executor
            .execute(
                r#"
                INSERT INTO usuarios_sistema (username, password_hash, role, codigo_vendedor)
                VALUES ($1, $2, $3, $4)
                "#,
                &params,
            )
            .await
            .map_err(|e| {
                // Converte erro de violação de chave única em um erro mais amigável
                if e.is_unique_violation() {
                    return AppError::UsernameAlreadyExists;
                }
                e.into()
            })?;

        Ok(())
    }

    async fn delete_user(&self, id: i32) -> Result<u64, AppError> {
        let outcome = self
            .executor
            .execute("DELETE FROM usuarios_sistema WHERE id = $1", &[SqlParam::Int(id)])
            .await?;
        Ok(outcome.affected())
    }

    async fn list_users(&self) -> Result<Vec<SystemUser>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM usuarios_sistema ORDER BY username");
        self.executor
            .execute(&sql, &[])
            .await?
            .into_rows()
            .iter()
            .map(user_from_record)
            .collect()
    }
}

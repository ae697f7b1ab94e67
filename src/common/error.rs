// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::{common::flash::Flash, db::DbError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Sessão ausente ou expirada")]
    Unauthenticated,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Usuário sem código de vendedor vinculado")]
    RepNotLinked,

    #[error("Vendedor não encontrado")]
    RepNotFound,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Nome de usuário já existe")]
    UsernameAlreadyExists,

    #[error("Tentativa de remover o próprio usuário")]
    SelfDeletion,

    #[error("Vendedor precisa de um código vinculado")]
    RepCodeRequired,

    #[error("Código de vendedor inválido")]
    InvalidRepCode,

    #[error("Papel inválido")]
    InvalidRole,

    #[error("Banco de dados não configurado")]
    NotConfigured,

    #[error("Falha na conexão com o banco: {0}")]
    ConnectionFailed(String),

    #[error("Falha na query: {0}")]
    QueryFailed(sqlx::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro de template: {0}")]
    TemplateError(#[from] tera::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotConfigured => AppError::NotConfigured,
            DbError::ConnectionFailed(msg) => AppError::ConnectionFailed(msg),
            DbError::QueryFailed(e) => AppError::QueryFailed(e),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::RepCodeRequired
            | AppError::InvalidRepCode
            | AppError::InvalidRole
            | AppError::SelfDeletion => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::RepNotLinked | AppError::RepNotFound | AppError::UserNotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::UsernameAlreadyExists => StatusCode::CONFLICT,
            AppError::NotConfigured | AppError::ConnectionFailed(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Mensagem curta exibida ao usuário. Detalhes internos só vão para o log.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(errors) => first_validation_message(errors),
            AppError::InvalidCredentials => "Usuário ou senha incorretos!".into(),
            AppError::Unauthenticated => "Faça login para continuar.".into(),
            AppError::Forbidden => "Não autorizado".into(),
            other => other.to_flash().message().into(),
        }
    }

    /// Converte o erro na mensagem "flash" das páginas HTML.
    pub fn to_flash(&self) -> Flash {
        match self {
            AppError::ValidationError(_) => Flash::InvalidInput,
            AppError::InvalidCredentials => Flash::InvalidCredentials,
            AppError::Unauthenticated => Flash::LoginRequired,
            AppError::Forbidden => Flash::AccessDenied,
            AppError::RepNotLinked | AppError::RepNotFound => Flash::RepNotFound,
            AppError::UserNotFound => Flash::UserNotFound,
            AppError::UsernameAlreadyExists => Flash::UsernameTaken,
            AppError::SelfDeletion => Flash::SelfDeletion,
            AppError::RepCodeRequired => Flash::RepCodeRequired,
            AppError::InvalidRepCode => Flash::InvalidRepCode,
            AppError::InvalidRole => Flash::InvalidRole,
            AppError::NotConfigured => Flash::NotConfigured,
            AppError::ConnectionFailed(_) => Flash::ConnectionFailed,
            _ => Flash::DataError,
        }
    }

    /// Igual a `to_flash`, registrando no log as falhas do servidor.
    /// Chamado no limite da requisição, onde o erro deixa de existir.
    pub fn into_flash(self) -> Flash {
        if self.status().is_server_error() {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }
        self.to_flash()
    }
}

fn first_validation_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| Flash::InvalidInput.message().to_string())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let body = match &self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                })
            }
            other => json!({ "error": other.public_message() }),
        };

        (status, Json(body)).into_response()
    }
}

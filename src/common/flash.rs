// src/common/flash.rs
//
// Mensagens de uma única exibição. Atravessam o redirect como um código curto
// num cookie; o texto só é resolvido na hora de renderizar.

use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Serialize;

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    InvalidCredentials,
    LoginRequired,
    LoginFailed,
    ConnectionOk,
    ConnectionFailed,
    NotConfigured,
    RepNotFound,
    DataError,
    AccessDenied,
    InvalidInput,
    InvalidRole,
    RepCodeRequired,
    InvalidRepCode,
    UsernameTaken,
    UserCreated,
    SelfDeletion,
    UserRemoved,
    UserNotFound,
    LoggedOut,
}

const ALL: [Flash; 19] = [
    Flash::InvalidCredentials,
    Flash::LoginRequired,
    Flash::LoginFailed,
    Flash::ConnectionOk,
    Flash::ConnectionFailed,
    Flash::NotConfigured,
    Flash::RepNotFound,
    Flash::DataError,
    Flash::AccessDenied,
    Flash::InvalidInput,
    Flash::InvalidRole,
    Flash::RepCodeRequired,
    Flash::InvalidRepCode,
    Flash::UsernameTaken,
    Flash::UserCreated,
    Flash::SelfDeletion,
    Flash::UserRemoved,
    Flash::UserNotFound,
    Flash::LoggedOut,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

impl Flash {
    pub fn code(&self) -> &'static str {
        match self {
            Flash::InvalidCredentials => "credenciais",
            Flash::LoginRequired => "login",
            Flash::LoginFailed => "falha-login",
            Flash::ConnectionOk => "conexao-ok",
            Flash::ConnectionFailed => "conexao-falhou",
            Flash::NotConfigured => "sem-config",
            Flash::RepNotFound => "vendedor-nao-encontrado",
            Flash::DataError => "erro-dados",
            Flash::AccessDenied => "acesso-negado",
            Flash::InvalidInput => "entrada-invalida",
            Flash::InvalidRole => "papel-invalido",
            Flash::RepCodeRequired => "codigo-obrigatorio",
            Flash::InvalidRepCode => "codigo-invalido",
            Flash::UsernameTaken => "usuario-existe",
            Flash::UserCreated => "usuario-criado",
            Flash::SelfDeletion => "auto-exclusao",
            Flash::UserRemoved => "usuario-removido",
            Flash::UserNotFound => "usuario-nao-encontrado",
            Flash::LoggedOut => "saiu",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        ALL.into_iter().find(|f| f.code() == code)
    }

    pub fn message(&self) -> &'static str {
        match self {
            Flash::InvalidCredentials => "Usuário ou senha incorretos!",
            Flash::LoginRequired => "Faça login para continuar.",
            Flash::LoginFailed => "Erro ao tentar login. Tente novamente.",
            Flash::ConnectionOk => "Conexão bem sucedida! Configurações salvas.",
            Flash::ConnectionFailed => "Falha na conexão com o banco de dados.",
            Flash::NotConfigured => "Configure o banco de dados antes de continuar.",
            Flash::RepNotFound => {
                "Dados do vendedor não encontrados (Código não vinculado ou inexistente)."
            }
            Flash::DataError => "Erro ao buscar dados.",
            Flash::AccessDenied => "Acesso negado.",
            Flash::InvalidInput => {
                "Dados inválidos: usuário (1 a 50 caracteres) e senha (mínimo 6 caracteres)."
            }
            Flash::InvalidRole => "Papel inválido. Use admin ou vendedor.",
            Flash::RepCodeRequired => "Vendedor precisa de um código vinculado.",
            Flash::InvalidRepCode => "O código do vendedor deve ser numérico.",
            Flash::UsernameTaken => "Nome de usuário já existe.",
            Flash::UserCreated => "Usuário criado com sucesso!",
            Flash::SelfDeletion => "Você não pode deletar seu próprio usuário.",
            Flash::UserRemoved => "Usuário removido.",
            Flash::UserNotFound => "Usuário não encontrado.",
            Flash::LoggedOut => "Sessão encerrada.",
        }
    }

    pub fn kind(&self) -> FlashKind {
        match self {
            Flash::ConnectionOk | Flash::UserCreated | Flash::UserRemoved | Flash::LoggedOut => {
                FlashKind::Success
            }
            _ => FlashKind::Error,
        }
    }

    pub fn view(&self) -> FlashView {
        FlashView { kind: self.kind(), message: self.message().to_string() }
    }
}

// O que o template recebe
#[derive(Debug, Clone, Serialize)]
pub struct FlashView {
    pub kind: FlashKind,
    pub message: String,
}

impl FlashView {
    /// Mensagem livre (ex.: texto de validação) exibida como erro.
    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: FlashKind::Error, message: message.into() }
    }
}

/// Agenda a mensagem para a próxima página renderizada.
pub fn push_flash(jar: CookieJar, flash: Flash) -> CookieJar {
    jar.add(
        Cookie::build((FLASH_COOKIE, flash.code()))
            .path("/")
            .http_only(true)
            .build(),
    )
}

/// Lê e consome a mensagem pendente.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let flash = jar.get(FLASH_COOKIE).and_then(|c| Flash::from_code(c.value()));

    match flash {
        Some(_) => (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), flash),
        None => (jar, None),
    }
}

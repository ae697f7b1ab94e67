// src/models/auth.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use validator::Validate;

// Papel do usuário no sistema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Vendedor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Vendedor => "vendedor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "vendedor" => Ok(Role::Vendedor),
            _ => Err(()),
        }
    }
}

// Representa um usuário vindo da tabela usuarios_sistema
#[derive(Debug, Clone, Serialize)]
pub struct SystemUser {
    pub id: i32,
    pub username: String,

    #[serde(skip_serializing)] // nunca sai para templates/JSON
    pub password_hash: String,

    pub role: Role,

    /// Código do vendedor na tabela VENDE
    pub rep_code: Option<i32>,
}

impl SystemUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// Dados para inserir um usuário (senha já com hash)
#[derive(Debug, Clone)]
pub struct NewSystemUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub rep_code: Option<i32>,
}

// Formulário de login
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// Formulário de criação de usuário (/usuarios/adicionar)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserForm {
    #[validate(length(min = 1, max = 50, message = "O usuário deve ter entre 1 e 50 caracteres."))]
    pub username: String,

    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,

    pub role: String,

    /// Pode vir vazio quando o papel é admin
    #[serde(default)]
    pub codigo: Option<String>,
}

impl CreateUserForm {
    /// Código do vendedor informado, já sem espaços. Vazio vira `None`.
    pub fn codigo_trimmed(&self) -> Option<&str> {
        self.codigo.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

// Estrutura de dados ("claims") dentro do cookie de sessão
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,               // ID do usuário
    pub role: Role,
    pub rep_code: Option<i32>,
    pub exp: usize,             // Quando a sessão expira
    pub iat: usize,             // Quando a sessão foi criada
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(" vendedor ".parse::<Role>(), Ok(Role::Vendedor));
        assert!("gerente".parse::<Role>().is_err());
    }

    #[test]
    fn blank_codigo_is_none() {
        let form = CreateUserForm {
            username: "ana".into(),
            password: "123456".into(),
            role: "vendedor".into(),
            codigo: Some("   ".into()),
        };
        assert_eq!(form.codigo_trimmed(), None);
    }
}

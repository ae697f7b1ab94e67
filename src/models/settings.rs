// src/models/settings.rs

use serde::Deserialize;
use validator::Validate;

// Chaves gravadas no arquivo .env
pub const KEY_SERVER: &str = "DB_SERVER";
pub const KEY_DATABASE: &str = "DB_NAME";
pub const KEY_USER: &str = "DB_USER";
pub const KEY_PASSWORD: &str = "DB_PASSWORD";

const DEFAULT_PG_PORT: u16 = 5432;

/// Parâmetros de conexão com o banco de dados de vendas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSettings {
    /// Host, opcionalmente com porta (`host:porta`).
    pub server: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl DbSettings {
    /// Lê as quatro variáveis do ambiente. Retorna `None` se alguma estiver
    /// ausente ou vazia (aplicação ainda não configurada).
    pub fn from_env() -> Option<Self> {
        let read = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        Some(Self {
            server: read(KEY_SERVER)?,
            database: read(KEY_DATABASE)?,
            username: read(KEY_USER)?,
            password: read(KEY_PASSWORD)?,
        })
    }

    pub fn is_complete(&self) -> bool {
        [&self.server, &self.database, &self.username, &self.password]
            .iter()
            .all(|v| !v.trim().is_empty())
    }

    /// Separa `server` em host e porta. Uma porta inválida cai no padrão.
    pub fn host_and_port(&self) -> (&str, u16) {
        match self.server.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() => {
                (host, port.parse().unwrap_or(DEFAULT_PG_PORT))
            }
            _ => (self.server.as_str(), DEFAULT_PG_PORT),
        }
    }

    /// Pares KEY=VALUE na ordem em que vão para o arquivo.
    pub fn as_env_pairs(&self) -> [(&'static str, &str); 4] {
        [
            (KEY_SERVER, self.server.as_str()),
            (KEY_DATABASE, self.database.as_str()),
            (KEY_USER, self.username.as_str()),
            (KEY_PASSWORD, self.password.as_str()),
        ]
    }
}

// Formulário da tela /configurar-banco
#[derive(Debug, Deserialize, Validate)]
pub struct DbSettingsForm {
    #[validate(length(min = 1, message = "Informe o servidor."))]
    pub server: String,
    #[validate(length(min = 1, message = "Informe o nome do banco."))]
    pub database: String,
    #[validate(length(min = 1, message = "Informe o usuário."))]
    pub username: String,
    #[validate(length(min = 1, message = "Informe a senha."))]
    pub password: String,
}

impl From<DbSettingsForm> for DbSettings {
    fn from(form: DbSettingsForm) -> Self {
        Self {
            server: form.server.trim().to_string(),
            database: form.database.trim().to_string(),
            username: form.username.trim().to_string(),
            password: form.password,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(server: &str) -> DbSettings {
        DbSettings {
            server: server.into(),
            database: "DMD".into(),
            username: "sa".into(),
            password: "segredo".into(),
        }
    }

    #[test]
    fn host_without_port_uses_default() {
        assert_eq!(settings("db.local").host_and_port(), ("db.local", 5432));
    }

    #[test]
    fn host_with_port_is_split() {
        assert_eq!(settings("10.0.0.5:6543").host_and_port(), ("10.0.0.5", 6543));
        assert_eq!(settings("10.0.0.5:abc").host_and_port(), ("10.0.0.5", 5432));
    }

    #[test]
    fn blank_field_is_incomplete() {
        let mut s = settings("db.local");
        assert!(s.is_complete());
        s.password = "  ".into();
        assert!(!s.is_complete());
    }
}

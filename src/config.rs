// src/config.rs

use std::{
    env,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use tokio::sync::RwLock;

use crate::{
    common::render::Templates,
    db::{CredentialStore, QueryExecutor, SalesRepository, SalesSource, UserRepository},
    models::settings::{DbSettings, KEY_DATABASE, KEY_PASSWORD, KEY_SERVER, KEY_USER},
    services::{auth::AuthService, dashboard_service::DashboardService},
};

// Configuração lida do ambiente na inicialização
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub env_file: PathBuf,
    pub session_secret: String,
    pub session_hours: i64,
    pub connect_timeout: Duration,
    pub bcrypt_cost: u32,
    pub bootstrap_admin: Option<(String, String)>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let env_file = PathBuf::from(env::var("ENV_FILE").unwrap_or_else(|_| ".env".to_string()));

        // O .env pode não existir ainda (primeira execução)
        if let Err(e) = dotenvy::from_path(&env_file) {
            tracing::info!("Arquivo {} não carregado: {}", env_file.display(), e);
        }

        let session_secret = env::var("SESSION_SECRET").context("SESSION_SECRET deve ser definido")?;

        let bootstrap_admin = match (env::var("BOOTSTRAP_ADMIN_USER"), env::var("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Ok(user), Ok(password)) if !user.trim().is_empty() && !password.is_empty() => {
                Some((user.trim().to_string(), password))
            }
            _ => None,
        };

        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string()),
            env_file,
            session_secret,
            session_hours: parse_var("SESSION_HOURS", 12)?,
            connect_timeout: Duration::from_secs(parse_var("DB_CONNECT_TIMEOUT_SECS", 5)?),
            bcrypt_cost: parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            bootstrap_admin,
        })
    }
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} inválido: '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// Parâmetros de conexão atuais. Trocados em tempo de execução pela tela
/// /configurar-banco, por isso ficam atrás de um lock compartilhado.
#[derive(Clone, Default)]
pub struct DbConfigHandle(Arc<RwLock<Option<DbSettings>>>);

impl DbConfigHandle {
    pub fn new(settings: Option<DbSettings>) -> Self {
        Self(Arc::new(RwLock::new(settings.filter(DbSettings::is_complete))))
    }

    pub async fn current(&self) -> Option<DbSettings> {
        self.0.read().await.clone()
    }

    pub async fn is_configured(&self) -> bool {
        self.0.read().await.is_some()
    }

    pub async fn replace(&self, settings: DbSettings) {
        *self.0.write().await = Some(settings);
    }
}

/// Grava os parâmetros no arquivo de ambiente, preservando as outras chaves,
/// e recarrega o arquivo no ambiente do processo.
pub fn persist_db_settings(path: &Path, settings: &DbSettings) -> anyhow::Result<()> {
    let existing = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).with_context(|| format!("Falha ao ler {}", path.display())),
    };

    let content = merge_env_content(&existing, &settings.as_env_pairs());

    // Só grava conteúdo que o dotenvy consegue ler de volta
    check_env_content(&content)?;

    std::fs::write(path, content).with_context(|| format!("Falha ao gravar {}", path.display()))?;

    dotenvy::from_path_override(path)
        .with_context(|| format!("Falha ao recarregar {}", path.display()))?;

    Ok(())
}

fn merge_env_content(existing: &str, pairs: &[(&str, &str)]) -> String {
    const MANAGED: [&str; 4] = [KEY_SERVER, KEY_DATABASE, KEY_USER, KEY_PASSWORD];

    let mut lines: Vec<String> = existing
        .lines()
        .filter(|line| {
            let key = line.split_once('=').map(|(k, _)| k.trim()).unwrap_or("");
            !MANAGED.contains(&key)
        })
        .map(str::to_string)
        .collect();

    lines.extend(pairs.iter().map(|(key, value)| format!("{key}={}", quote_env_value(value))));

    let mut content = lines.join("\n");
    content.push('\n');
    content
}

/// Valor entre aspas duplas; `\`, `"` e `$` escapados para o dotenvy
/// não interpretar espaços, `#` nem expandir variáveis.
fn quote_env_value(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' | '"' | '$' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

fn check_env_content(content: &str) -> anyhow::Result<()> {
    for item in dotenvy::from_read_iter(content.as_bytes()) {
        item.context("Conteúdo do arquivo de ambiente inválido")?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct AppState {
    pub db_config: DbConfigHandle,
    pub executor: QueryExecutor,
    pub auth_service: AuthService,
    pub dashboard_service: DashboardService,
    pub templates: Templates,
    pub env_file: PathBuf,
    pub bootstrap_admin: Option<(String, String)>,
}

impl AppState {
    /// Monta o estado de produção: usuários e vendas vêm do banco configurado.
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let db_config = DbConfigHandle::new(DbSettings::from_env());
        let executor = QueryExecutor::new(db_config.clone(), config.connect_timeout);

        // --- Monta o gráfico de dependências ---
        let users: Arc<dyn CredentialStore> = Arc::new(UserRepository::new(executor.clone()));
        let sales: Arc<dyn SalesSource> = Arc::new(SalesRepository::new(executor.clone()));

        Self::with_sources(config, db_config, executor, users, sales)
    }

    /// Permite trocar as fontes de dados (ex.: dublês em memória nos testes).
    pub fn with_sources(
        config: &AppConfig,
        db_config: DbConfigHandle,
        executor: QueryExecutor,
        users: Arc<dyn CredentialStore>,
        sales: Arc<dyn SalesSource>,
    ) -> anyhow::Result<Self> {
        let templates = Templates::new().context("Falha ao carregar os templates")?;

        let auth_service = AuthService::new(
            users,
            config.session_secret.clone(),
            chrono::Duration::hours(config.session_hours),
            config.bcrypt_cost,
        );

        Ok(Self {
            db_config,
            executor,
            auth_service,
            dashboard_service: DashboardService::new(sales),
            templates,
            env_file: config.env_file.clone(),
            bootstrap_admin: config.bootstrap_admin.clone(),
        })
    }

    /// Roda as migrações e cria o administrador inicial, se configurado.
    /// Falhas só são registradas no log.
    pub async fn prepare_database(&self) {
        match self.executor.run_migrations().await {
            Ok(()) => tracing::info!("✅ Migrações do banco de dados executadas com sucesso!"),
            Err(e) => {
                tracing::error!("🔥 Falha ao rodar as migrações: {}", e);
                return;
            }
        }

        if let Some((username, password)) = &self.bootstrap_admin {
            if let Err(e) = self.auth_service.ensure_admin(username, password).await {
                tracing::error!("🔥 Falha ao criar o administrador inicial: {}", e);
            }
        }
    }
}

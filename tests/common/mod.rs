// tests/common/mod.rs
//
// Monta a aplicação com dublês em memória e ajuda a conversar com o router.

#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use painel_vendas::{
    config::{AppConfig, AppState, DbConfigHandle},
    db::{memory::{InMemoryCredentialStore, InMemorySalesSource}, QueryExecutor},
    models::{
        auth::{NewSystemUser, Role},
        sales::{MonthlyTrendEntry, RepAggregate, RepStatus},
        settings::DbSettings,
    },
    routes::create_router,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tower::ServiceExt;

pub const ADMIN_PASSWORD: &str = "admin123";
pub const REP_PASSWORD: &str = "senha123";

static ENV_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub users: Arc<InMemoryCredentialStore>,
    pub admin_id: i32,
    pub rep_id: i32,
    pub env_file: PathBuf,
}

pub fn rep(code: i32, name: &str, target: Decimal, realized: Decimal, commission: Decimal, blocked: i64) -> RepAggregate {
    RepAggregate {
        code,
        name: name.to_string(),
        establishment_code: Some("01".to_string()),
        target_value: Some(target),
        realized_value: Some(realized),
        supervisor_code: None,
        commission_value: Some(commission),
        email: Some(format!("{}@empresa.com", name.to_lowercase())),
        tax_id: None,
        blocked_flag: Some(blocked),
        status: RepStatus::from_blocked_flag(Some(blocked)),
    }
}

pub fn dummy_settings() -> DbSettings {
    // Porta fechada: qualquer conexão real falha rápido
    DbSettings {
        server: "127.0.0.1:1".to_string(),
        database: "vendas".to_string(),
        username: "sa".to_string(),
        password: "segredo".to_string(),
    }
}

pub fn test_config() -> AppConfig {
    let n = ENV_COUNTER.fetch_add(1, Ordering::SeqCst);
    AppConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        env_file: std::env::temp_dir().join(format!("painel-vendas-{}-{}.env", std::process::id(), n)),
        session_secret: "segredo-de-teste".to_string(),
        session_hours: 1,
        connect_timeout: Duration::from_secs(2),
        bcrypt_cost: 4,
        bootstrap_admin: None,
    }
}

pub fn spawn_app(configured: bool) -> TestApp {
    let config = test_config();
    let db_config = DbConfigHandle::new(configured.then(dummy_settings));
    let executor = QueryExecutor::new(db_config.clone(), config.connect_timeout);

    let users = Arc::new(InMemoryCredentialStore::new());
    let admin_id = users.insert(NewSystemUser {
        username: "admin".to_string(),
        password_hash: bcrypt::hash(ADMIN_PASSWORD, 4).unwrap(),
        role: Role::Admin,
        rep_code: None,
    });
    let rep_id = users.insert(NewSystemUser {
        username: "ana".to_string(),
        password_hash: bcrypt::hash(REP_PASSWORD, 4).unwrap(),
        role: Role::Vendedor,
        rep_code: Some(101),
    });
    users.insert(NewSystemUser {
        username: "orfao".to_string(),
        password_hash: bcrypt::hash(REP_PASSWORD, 4).unwrap(),
        role: Role::Vendedor,
        rep_code: None,
    });

    let sales = InMemorySalesSource::new(vec![
        rep(101, "ANA SOUZA", dec!(1000), dec!(500), dec!(25), 1),
        rep(102, "BRUNO LIMA", dec!(2000), dec!(1500), dec!(75), 0),
    ])
    .with_trend(101, MonthlyTrendEntry { year: 2025, month: 2, realized: dec!(300), commission: dec!(15) })
    .with_trend(101, MonthlyTrendEntry { year: 2025, month: 1, realized: dec!(200), commission: dec!(10) });

    let state = AppState::with_sources(&config, db_config, executor, users.clone(), Arc::new(sales))
        .expect("estado de teste");

    TestApp {
        router: create_router(state.clone()),
        state,
        users,
        admin_id,
        rep_id,
        env_file: config.env_file,
    }
}

impl TestApp {
    pub async fn session_for(&self, username: &str) -> String {
        let user = self
            .state
            .auth_service
            .authenticate(
                username,
                if username == "admin" { ADMIN_PASSWORD } else { REP_PASSWORD },
            )
            .await
            .expect("usuário de teste");
        let token = self.state.auth_service.create_session_token(&user).unwrap();
        format!("sessao={token}")
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri).method("GET");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.router.clone().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
    }

    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .uri(uri)
            .method("POST")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::from(form.to_string())).unwrap())
            .await
            .unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.env_file);
    }
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}

/// Código da mensagem flash gravada na resposta, se houver.
pub fn flash_code(response: &Response<Body>) -> Option<String> {
    set_cookies(response).into_iter().find_map(|c| {
        let value = c.strip_prefix("flash=")?;
        let code = value.split(';').next().unwrap_or("");
        (!code.is_empty()).then(|| code.to_string())
    })
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}

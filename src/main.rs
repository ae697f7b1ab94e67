// src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use painel_vendas::{
    config::{AppConfig, AppState},
    routes::create_router,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = AppConfig::from_env()?;
    let app_state = AppState::new(&config)?;

    if app_state.db_config.is_configured().await {
        // Sem banco acessível a aplicação sobe mesmo assim; as telas mostram o erro
        app_state.prepare_database().await;
    } else {
        tracing::warn!("Banco não configurado; acesse /configurar-banco");
    }

    let app = create_router(app_state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

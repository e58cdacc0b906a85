use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use askbridge_whatsapp::BridgeContext;

mod app;
mod http;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "askbridge_gateway=info,tower_http=debug".into()),
        )
        .init();

    // load config: explicit path via ASKBRIDGE_CONFIG > ~/.askbridge/askbridge.toml
    let config_path = std::env::var("ASKBRIDGE_CONFIG").ok();
    let config = askbridge_core::config::BridgeConfig::load(config_path.as_deref())?;

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;

    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");

    let conn = rusqlite::Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    askbridge_store::db::init_db(&conn)?;
    info!("database schema ready");

    let store = askbridge_store::UserStore::new(conn);
    let ask = Arc::new(askbridge_ask::AskClient::new(
        config.ask.api_key.clone(),
        config.ask.agent_id.clone(),
        config.ask.base_url.clone(),
    ));
    let transport = Arc::new(askbridge_whatsapp::WaClient::new(
        config.whatsapp.token.clone(),
        config.whatsapp.phone_id.clone(),
    ));

    let ctx = Arc::new(BridgeContext {
        ask,
        transport,
        store,
        session_timeout_minutes: config.session.timeout_minutes,
    });

    let state = Arc::new(app::AppState { config, ctx });
    let router = app::build_router(Arc::clone(&state));

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("askbridge gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}

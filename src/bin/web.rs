//! Gambit Web API
//!
//! 启动: cargo run --bin gambit-web --features web
//! 浏览器访问 http://127.0.0.1:8000

use std::sync::Arc;

use gambit::config::load_config;
use gambit::web::{router, spawn_session_reaper, WebState};
use gambit::{create_agent_components, observability};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cfg = match load_config(None) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!("config load failed, using defaults: {}", e);
            Default::default()
        }
    };

    let components = create_agent_components(&cfg)?;
    let state = Arc::new(WebState::new(components, &cfg.web));
    spawn_session_reaper(state.clone(), cfg.web.session_ttl_secs);
    let app = router(state);

    let port = std::env::var("GAMBIT_WEB_PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(cfg.web.port);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Gambit Web API: http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

use premium_engine::config::AppConfig;
use premium_engine::pricing::PricingEngine;
use premium_engine::server;
use premium_engine::state::AppState;

#[tokio::main]
async fn main() {
    // Structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("premium engine starting");

    // Load config
    let cfg = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    match cfg.cache_capacity() {
        Some(cap) => tracing::info!(ttl_secs = cfg.cache_ttl_secs, capacity = cap, "premium cache bounded"),
        None => tracing::info!(
            ttl_secs = cfg.cache_ttl_secs,
            "premium cache unbounded -- clear via DELETE /api/cache on long-lived deployments"
        ),
    }

    let engine = PricingEngine::from_config(&cfg);
    let app_state = AppState::new(cfg.clone(), engine);
    let app = server::router(app_state);

    let addr = format!("0.0.0.0:{}", cfg.server_port);
    tracing::info!("server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("bind error: {e}");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}

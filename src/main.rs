//! vtop-relay service entry point
//!
//! Wires the pool, login workflow, and extractor pipeline together and serves
//! the HTTP surface. The pool is pre-warmed before the listener opens so the
//! first requests already find solved-challenge-ready sessions.

use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use vtop_relay::{
    auth::{LoginWorkflow, ScriptChallengeResolver},
    cdp::DevToolsBrowser,
    config::Config,
    extract::ExtractorPipeline,
    portal::CdpPageFactory,
    server::{router, Orchestrator},
    session::{PoolSettings, SessionPool},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing - respect RUST_LOG environment variable
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|v| v.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    info!("vtop-relay v{}", vtop_relay::VERSION);

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: host={}, port={}, pool_size={}",
        config.host, config.port, config.pool_size
    );

    // Page factory over the backing browser
    let browser = DevToolsBrowser::new(config.devtools_endpoint.clone());
    let factory = Arc::new(CdpPageFactory::new(browser, config.settle_timeout_ms));

    // Pre-warm the session pool; an entirely failed pre-warm aborts startup
    let pool = SessionPool::new(factory, PoolSettings::from_config(&config));
    let warmed = pool.initialize().await?;
    info!("Session pool ready with {} pre-warmed sessions", warmed);

    // Assemble the request path
    let resolver = Arc::new(ScriptChallengeResolver::vtop_default());
    let workflow = LoginWorkflow::new(resolver, &config);
    let pipeline = ExtractorPipeline::vtop_default();
    let orchestrator = Arc::new(Orchestrator::new(pool, workflow, pipeline));

    let app = router(orchestrator);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolve when the process is asked to stop
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM signal");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT signal");
            }
        }
    }

    #[cfg(windows)]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C signal");
    }
}

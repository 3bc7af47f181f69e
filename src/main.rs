use anyhow::Result;
use std::{fs, io::ErrorKind, path::Path, sync::Arc};
use thumbnail_intake::{
    app::{AppState, build_app},
    config::AppConfig,
    db,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = AppConfig::from_env_and_args()?;

    tracing::info!("Starting thumbnail-intake with config: {:?}", cfg);

    // --- Ensure assets directory exists ---
    if !Path::new(&cfg.assets_root).exists() {
        fs::create_dir_all(&cfg.assets_root)?;
        tracing::info!("Created assets directory at {}", cfg.assets_root);
    }

    // --- Initialize SQLite connection ---
    let pool = Arc::new(db::connect(&cfg.database_url).await?);

    // --- Schema (idempotent); migration mode exits here ---
    db::run_migrations(&pool).await?;
    if migrate {
        tracing::info!("Database migration complete.");
        return Ok(());
    }

    // --- Build router ---
    let state = AppState::from_config(&cfg, pool);
    let app = build_app(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!(
        "Server listening on http://{} (thumbnail strategy: {:?})",
        listener.local_addr()?,
        cfg.thumbnail_strategy
    );
    axum::serve(listener, app).await?;

    Ok(())
}

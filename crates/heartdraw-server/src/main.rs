mod config;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use heartdraw_api::{AppState, AppStateInner, SessionConfig};
use heartdraw_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "heartdraw=debug,tower_http=debug".into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {:#}", e);
            std::process::exit(1);
        }
    };
    if config.dev {
        warn!("Development mode: session cookies are not marked Secure");
    }

    // Init database
    let db = Database::open(&config.db_path)?;
    if config.seed {
        let hash = heartdraw_api::auth::hash_password(heartdraw_db::seed::DEMO_PASSWORD)?;
        heartdraw_db::seed::seed_demo(&db, &hash)?;
    }

    let state: AppState = Arc::new(AppStateInner {
        db,
        session: SessionConfig {
            secret: config.session_secret.clone(),
            ttl: chrono::Duration::days(config.session_days),
            secure_cookie: !config.dev,
        },
    });

    let mut app: Router = heartdraw_api::router(state.clone());
    if let Some(dir) = &config.static_dir {
        // Unknown paths fall through to the SPA entry point.
        let index = ServeFile::new(dir.join("index.html"));
        app = app.fallback_service(ServeDir::new(dir).not_found_service(index));
        info!("Serving client bundle from {}", dir.display());
    }

    let app = app
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("HeartDraw server listening on {}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    match Arc::try_unwrap(state) {
        Ok(inner) => inner.db.close()?,
        Err(_) => warn!("Database still referenced at shutdown; leaving it to drop"),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}

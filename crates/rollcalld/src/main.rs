use anyhow::{Context, Result};
use rollcall_store::Db;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod clock;
mod config;
mod dbus_interface;
mod engine;
mod enroll;
mod recognize;
#[cfg(test)]
mod testutil;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("rollcalld starting");

    let config = config::Config::from_env();
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }

    let db = Arc::new(Db::open(&config.db_path)?);
    let engine = engine::spawn_engine(&config, db.clone())?;

    let service = dbus_interface::RollcallService {
        engine,
        db: db.clone(),
    };

    let _conn = zbus::connection::Builder::system()?
        .name("org.rollcall.Attendance1")?
        .serve_at("/org/rollcall/Attendance1", service)?
        .build()
        .await
        .context("registering on the system bus")?;

    tracing::info!("rollcalld ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("rollcalld shutting down");

    Ok(())
}

use anyhow::Result;
use std::time::Duration;
use system_tracking::{MonitorConfig, MonitorSession, ResourceMonitor};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Poll the session until its background task reaches a terminal state
async fn wait_until_finished(session: &MonitorSession) {
    while session.is_running() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load and validate configuration early
    let config = MonitorConfig::from_env()?;
    config.validate()?;
    info!("{}", config.summary());

    let monitor = ResourceMonitor::new();
    let mut session = monitor.start(&config)?;

    // Run until the wall-clock bound elapses, or stop early on ctrl-c
    tokio::select! {
        _ = wait_until_finished(&session) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-c received, stopping monitoring session");
        }
    }
    let record = session.stop().await?;

    record.save_json(&config.output_file)?;
    info!(
        output_file = %config.output_file,
        samples = record.resource_logs.len(),
        state = ?session.state(),
        "Monitoring run complete"
    );

    Ok(())
}

#![warn(missing_docs)]
//! # shellbridge-app binary
//!
//! Desktop shell entry point. Resolves the operating mode, builds the shell,
//! and runs both gateway loops until interrupted.

use shellbridge_app::{
    AppConfig, AppError, Shell, app_version, bootstrap, init_tracing, redact_sensitive,
};
use tracing::{error, info};

/// Process entry point.
#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();
    if let Err(error) = init_tracing(&config.log_filter) {
        eprintln!("shellbridge: {error}");
    }

    if let Err(failure) = run(config).await {
        error!(error = %redact_sensitive(&failure.to_string()), "shellbridge stopped");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    let Shell {
        runtime,
        session,
        pipeline,
        gateway,
    } = bootstrap(&config)?;

    info!(
        version = app_version(),
        mode = ?runtime.mode(),
        backend = runtime.backend_base_url().unwrap_or("none"),
        session = session.has_session(),
        "shellbridge ready"
    );

    // The rendering surface owns `gateway.surface`; the host loop stops once
    // every clone of it is gone.
    let surface = gateway.surface;
    let host = tokio::spawn(gateway.host.run());
    let surface_loop = tokio::spawn(gateway.surface_loop.run());

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    drop(surface);
    drop(pipeline);
    if let Err(join_error) = host.await {
        error!(error = %join_error, "host gateway task failed");
    }
    surface_loop.abort();
    Ok(())
}

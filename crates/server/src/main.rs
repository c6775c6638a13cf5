use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::Notify;
use tracing::info;

use duebell_core::config::load_dotenv;
use duebell_core::instant::parse_iso8601;
use duebell_core::Config;
use duebell_server::cli::{Cli, Command};
use duebell_server::state::AppState;
use duebell_server::{build_router, startup, ticker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    load_dotenv();
    let mut config = Config::from_env();
    cli.apply_overrides(&mut config);

    match &cli.command {
        Some(Command::CheckConfig) => {
            println!("{}", serde_json::to_string_pretty(&config.redacted_summary())?);
            config.validate()?;
            println!("configuration ok");
            Ok(())
        }
        Some(Command::RunOnce { at }) => {
            config.validate()?;
            run_once(&config, at.as_deref()).await
        }
        Some(Command::Serve { no_timer, .. }) => {
            config.validate()?;
            serve(&config, !no_timer).await
        }
        None => {
            config.validate()?;
            serve(&config, true).await
        }
    }
}

async fn run_once(config: &Config, at: Option<&str>) -> anyhow::Result<()> {
    let dispatcher = startup::build_dispatcher(config)?;
    let summary = match at {
        Some(raw) => {
            let now = parse_iso8601(raw).with_context(|| format!("invalid --at value {raw:?}"))?;
            dispatcher.run_once(now).await?
        }
        None => dispatcher.run().await?,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn serve(config: &Config, with_timer: bool) -> anyhow::Result<()> {
    config.log_summary();

    let dispatcher = Arc::new(startup::build_dispatcher(config)?);
    let state = Arc::new(AppState::new(dispatcher));
    let shutdown = Arc::new(Notify::new());

    let timer = if with_timer {
        let every = Duration::from_secs(config.dispatch.tick_interval_secs);
        Some(tokio::spawn(ticker::run_ticker(state.clone(), every, shutdown.clone())))
    } else {
        info!("periodic timer disabled, manual trigger only");
        None
    };

    let app = build_router(state, &config.server.cors_origin);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // notify_one stores a permit, so the timer sees it even mid-pass.
    shutdown.notify_one();
    if let Some(handle) = timer {
        handle.await.ok();
    }
    info!("duebell exited cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

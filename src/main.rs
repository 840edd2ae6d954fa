//! plugbot - plugin-hosting command runtime
//!
//! Runs the runtime against the console transport: every stdin line is a
//! message from the configured owner in the `console` channel.

use plugbot::Bot;
use plugbot::config::{Config, LogFormat, validate};
use plugbot::plugin::PluginCatalog;
use plugbot::transport::console::{ConsoleTransport, spawn_stdin_reader};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "plugbot.toml".to_string());

    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path)?
    } else {
        Config::default()
    };

    init_tracing(config.log.format);

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(path = %config_path, error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {}", errors.len(), config_path);
    }

    info!(
        path = %config_path,
        prefix = %config.bot.prefix,
        autoload = config.plugins.autoload.len(),
        "Starting plugbot"
    );

    plugbot::metrics::init();

    let author = config
        .bot
        .owner
        .clone()
        .unwrap_or_else(|| "console".to_string());
    let bot = Arc::new(Bot::new(
        config,
        PluginCatalog::new(),
        Arc::new(ConsoleTransport::new()),
    ));

    if bot.config().metrics.enabled() {
        tokio::spawn(plugbot::http::run_http_server(
            bot.config().metrics.port,
            bot.shutdown_token(),
        ));
    }

    bot.start().await?;

    let (inbound, _reader) = spawn_stdin_reader(author);
    let runner = Arc::clone(&bot);
    let event_loop = tokio::spawn(async move { runner.run(inbound).await });

    let shutdown_token = bot.shutdown_token();
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                error!(error = %e, "Failed to listen for ctrl-c");
            }
        }
        _ = shutdown_token.cancelled() => {}
        _ = wait_for(event_loop) => {}
    }

    let report = bot.shutdown().await;
    if !report.is_clean() {
        error!(failed = ?report.failed, "Some plugins failed to save on shutdown");
    }
    Ok(())
}

async fn wait_for(handle: tokio::task::JoinHandle<()>) {
    if let Err(e) = handle.await {
        error!(error = %e, "Event loop ended abnormally");
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

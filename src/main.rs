//! CLI for mqttbridge
//!
//! Loads configuration, then runs the bridge until Ctrl-C.

use std::process::ExitCode;

use clap::Parser;
use mqttbridge::config::{Settings, load_config};
use mqttbridge::utils::logging;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "mqttbridge", about = "Forward MQTT messages to WebSocket clients")]
struct Cli {
    /// Configuration file (default: config/default.*, optional)
    #[arg(long)]
    config: Option<String>,

    /// WebSocket port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Broker url, e.g. mqtt://localhost:1883
    #[arg(long)]
    mqtt_url: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Flags win over file and environment settings.
    fn apply_overrides(self, settings: &mut Settings) {
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(url) = self.mqtt_url {
            settings.mqtt.url = url;
        }
        if let Some(level) = self.log_level {
            settings.log.level = level;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut settings = match load_config(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            logging::init("info");
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    cli.apply_overrides(&mut settings);

    logging::init(&settings.log.level);

    match mqttbridge::app::run(settings, shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Bridge failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received."),
        Err(e) => {
            error!("Unable to listen for shutdown signal: {e}");
            std::future::pending::<()>().await;
        }
    }
}

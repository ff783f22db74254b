use std::env;
use std::path::PathBuf;
use clap::Parser;
use crate::gui::application::{run_application, StartupOptions};
use crate::error::AppRunError;

pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod encoder;
pub mod error;
pub mod events;
pub mod gui;
pub mod playback;
pub mod position;

#[derive(Debug, Parser)]
#[command(version, about = "In-vehicle control panel")]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Do not connect to gpsd
    #[arg(long)]
    pub no_gps: bool,

    /// Do not request the rotary encoder's GPIO lines
    #[arg(long)]
    pub no_encoder: bool,

    /// Do not connect to BlueZ
    #[arg(long)]
    pub no_bluetooth: bool,
}

impl Cli {
    pub fn startup_options(&self) -> StartupOptions {
        StartupOptions {
            gps: !self.no_gps,
            encoder: !self.no_encoder,
            bluetooth: !self.no_bluetooth,
        }
    }
}

fn log_level() -> log::LevelFilter {
    env::var("LOG_LEVEL")
        .ok()
        .and_then(|level| level.parse().ok())
        .unwrap_or(log::LevelFilter::Info)
}

/// Logs to stderr, and additionally to the file named by LOG_FILE.
pub fn init_logging() {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log_level())
        // zbus and the http stack are chatty at debug level
        .level_for("zbus", log::LevelFilter::Warn)
        .level_for("hyper_util", log::LevelFilter::Warn)
        .chain(std::io::stderr());

    if let Ok(log_file) = env::var("LOG_FILE") {
        match fern::log_file(&log_file) {
            Ok(file) => dispatch = dispatch.chain(file),
            Err(err) => eprintln!("Failed to open LOG_FILE {}: {}", log_file, err),
        }
    }

    if let Err(err) = dispatch.apply() {
        eprintln!("Failed to initialize logger: {}", err);
    }
}

pub fn run(args: env::Args) -> Result<(), AppRunError> {
    let cli = Cli::parse_from(args);
    run_application(cli.config.clone(), cli.startup_options())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_disable_peripherals() {
        let cli = Cli::parse_from(["car-panel", "--no-gps", "--config", "/tmp/panel.json"]);
        let options = cli.startup_options();

        assert!(!options.gps);
        assert!(options.encoder);
        assert!(options.bluetooth);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/panel.json")));
    }
}

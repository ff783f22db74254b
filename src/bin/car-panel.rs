use std::env;
use std::process::ExitCode;
use log::{error, info};
use car_panel::{init_logging, run};
use car_panel::error::{AppRunError, ConfigError};

fn main() -> ExitCode {
    init_logging();
    info!(concat!("Car Panel ", env!("CARGO_PKG_VERSION")));

    let args = env::args();

    match run(args) {
        Err(AppRunError::ConfigError { source: ConfigError::CanNotLock { .. } }) => {
            error!("This application has already been started");
            ExitCode::FAILURE
        },
        Err(err) => {
            error!("Unexpected error: {}", err);
            ExitCode::FAILURE
        },
        Ok(_) => ExitCode::SUCCESS,
    }
}

use std::process::ExitCode;

use clap::Parser;
use restclient_cli::{Args, Config};

fn main() -> ExitCode {
    env_logger::init();

    let config = match Config::try_from(Args::parse()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    log::debug!(
        "{} {} as {:?}",
        restclient_cli::method_of(&config.action),
        config.addr,
        config.credentials
    );

    match restclient_cli::run(&config) {
        Ok(data) => match serde_json::to_string_pretty(&data) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

//! Command-line front end: one prediction request in, one JSON response out
//!
//! ```text
//! ppg-bp [--config <path>] [request.json]
//! ```
//!
//! Reads the request from the file argument, or stdin when none is given.
//! Exit status is 0 on success, 1 for client-class failures and 2 for
//! internal failures.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use ppg_bp_core::api::handle_predict;
use ppg_bp_core::config::ConfigLoader;
use ppg_bp_core::PredictionPipeline;
use tracing::error;
use tracing_subscriber::EnvFilter;

const EXIT_CLIENT_ERROR: u8 = 1;
const EXIT_INTERNAL_ERROR: u8 = 2;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    request: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = iter.next().ok_or("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            "--help" | "-h" => {
                return Err("usage: ppg-bp [--config <path>] [request.json]".to_string());
            }
            flag if flag.starts_with('-') && flag != "-" => {
                return Err(format!("unknown option {}", flag));
            }
            path => {
                if args.request.is_some() {
                    return Err("only one request file may be given".to_string());
                }
                if path != "-" {
                    args.request = Some(PathBuf::from(path));
                }
            }
        }
    }

    Ok(args)
}

fn read_request(path: Option<&PathBuf>) -> io::Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path),
        None => {
            let mut body = Vec::new();
            io::stdin().read_to_end(&mut body)?;
            Ok(body)
        }
    }
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only the response
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::from(EXIT_CLIENT_ERROR);
        }
    };

    let loader = match &args.config {
        Some(path) => ConfigLoader::new().with_file(path),
        None => ConfigLoader::new(),
    };
    let config = match loader.load() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return ExitCode::from(EXIT_INTERNAL_ERROR);
        }
    };

    let pipeline = match PredictionPipeline::from_config(&config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!(error = %e, "Failed to build prediction pipeline");
            return ExitCode::from(EXIT_INTERNAL_ERROR);
        }
    };

    let body = match read_request(args.request.as_ref()) {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, "Failed to read request");
            return ExitCode::from(EXIT_CLIENT_ERROR);
        }
    };

    let response = handle_predict(&pipeline, &body);
    println!("{}", response.body);

    match response.status {
        200 => ExitCode::SUCCESS,
        400..=499 => ExitCode::from(EXIT_CLIENT_ERROR),
        _ => ExitCode::from(EXIT_INTERNAL_ERROR),
    }
}

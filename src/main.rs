//! policy-fetcher CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use policy_fetcher::cli::{handle_error, Cli, Commands};
use policy_fetcher::infrastructure::config::ConfigLoader;
use policy_fetcher::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ConfigLoader::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            handle_error(&err, cli.json);
            return ExitCode::FAILURE;
        }
    };

    let _logger = match LoggerImpl::init(&config.logging) {
        Ok(logger) => logger,
        Err(err) => {
            handle_error(&err, cli.json);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Fetch(args) => {
            policy_fetcher::cli::commands::fetch::execute(args, &config, cli.json).await
        }
        Commands::Validate(args) => {
            policy_fetcher::cli::commands::validate::execute(args, cli.json).await
        }
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            handle_error(&err, cli.json);
            ExitCode::FAILURE
        }
    }
}

mod app;
mod cli;
mod config;
mod effects;
mod input;
mod logging;
mod render;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    logging::initialize(cli.log, cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            converter_logging::converter_error!("startup failed: {:#}", err);
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: cli::Cli) -> anyhow::Result<ExitCode> {
    let mut config = config::ClientConfig::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.api_base = base_url;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }

    app::run_app(
        config,
        app::RunOptions {
            initial_url: cli.url,
            auto: cli.auto,
        },
    )
}

use std::process::ExitCode;

use authgate_cli::cli::Cli;
use authgate_cli::config::AppConfig;
use authgate_cli::{Status, logging, run};
use clap::Parser;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match try_main(&cli) {
        Ok(status) => status.into(),
        Err(err) => {
            eprintln!("authgate: {err:#}");
            Status::ConfigError.into()
        }
    }
}

fn try_main(cli: &Cli) -> anyhow::Result<Status> {
    let config = AppConfig::load(cli.config.as_deref())?;
    logging::init(&config.logging)?;
    let mut stdout = std::io::stdout().lock();
    run(&cli.command, &config, &mut stdout)
}

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "authgate",
    version,
    about = "Validate bearer tokens and evaluate authorization requests"
)]
pub struct Cli {
    /// YAML configuration file; `AUTHGATE_*` environment variables override it
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check the key registry configuration and list the active keys
    CheckConfig,
    /// Validate a bearer token and print the resulting identity or failure
    Validate(ValidateArgs),
    /// Validate a token, then evaluate an authorization request for it
    Authorize(AuthorizeArgs),
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("credential").required(true).args(["token", "header"])))]
pub struct ValidateArgs {
    /// Raw JWT
    #[arg(long)]
    pub token: Option<String>,

    /// Full `Authorization` header value, e.g. "Bearer eyJ..."
    #[arg(long)]
    pub header: Option<String>,
}

#[derive(Debug, Args)]
pub struct AuthorizeArgs {
    /// Raw JWT; without it the request is evaluated unauthenticated
    #[arg(long)]
    pub token: Option<String>,

    /// Authorization request as JSON or YAML; `-` reads stdin
    #[arg(long, value_name = "FILE")]
    pub request: String,
}

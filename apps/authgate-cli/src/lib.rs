#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! `authgate` host: loads configuration, builds the key registry and runs one
//! command against it.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use policy_engine::{AuditedEvaluator, AuthorizationEngine};
use serde::Serialize;
use token_validator::TokenValidator;

use crate::cli::Command;
use crate::commands::Credential;
use crate::config::AppConfig;

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Valid credential or allowed request.
    Success,
    /// Invalid credential or denied request.
    Rejected,
    /// Configuration could not be loaded or the registry is not ready.
    ConfigError,
}

impl Status {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Rejected => 1,
            Self::ConfigError => 2,
        }
    }
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        Self::from(status.code())
    }
}

/// Run `command` and write its JSON report to `out`.
///
/// # Errors
///
/// Configuration, I/O and request parsing failures. Rejected credentials and
/// denied requests are reported through the returned [`Status`] instead.
pub fn run(command: &Command, config: &AppConfig, out: &mut dyn Write) -> anyhow::Result<Status> {
    let ctx = commands::build_context(&config.keys)?;

    match command {
        Command::CheckConfig => {
            write_report(out, &commands::check_config(&ctx))?;
            Ok(Status::Success)
        }
        Command::Validate(args) => {
            let validator = TokenValidator::new(Arc::new(ctx));
            let credential = match (&args.token, &args.header) {
                (Some(token), _) => Credential::Token(token),
                (None, Some(header)) => Credential::AuthorizationHeader(header),
                (None, None) => Credential::Token(""),
            };
            let report = commands::validate(&validator, credential);
            write_report(out, &report)?;
            Ok(report.status())
        }
        Command::Authorize(args) => {
            let request = commands::read_request(&args.request)?;
            let validator = TokenValidator::new(Arc::new(ctx));
            let evaluator = AuditedEvaluator::new(AuthorizationEngine::new());
            let report =
                commands::authorize(&validator, &evaluator, args.token.as_deref(), &request);
            write_report(out, &report)?;
            Ok(report.status())
        }
    }
}

fn write_report<T: Serialize>(out: &mut dyn Write, report: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report).context("failed to serialize report")?;
    writeln!(out).context("failed to write report")?;
    Ok(())
}

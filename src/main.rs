mod cli;
mod commands;
mod config;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::AppConfig;
use std::io;
use std::process::ExitCode;
use zonekit::ErrorCategory;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    pub config: AppConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            ui::error(&format!("{err:#}"));
            let category = err
                .downcast_ref::<zonekit::Error>()
                .map(zonekit::Error::category);
            if let Some(category) = category {
                eprintln!("  {}", hint(category));
            }
            ExitCode::from(exit_code(category))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let ctx = Context {
        quiet: cli.quiet,
        config,
    };

    match cli.command {
        Command::Apply(args) => commands::apply::run(&ctx, args),
        Command::Validate(args) => commands::validate::run(&ctx, args),
        Command::Show(args) => commands::show::run(&ctx, args),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "fwconverge", &mut io::stdout());
            Ok(())
        }
    }
}

fn hint(category: ErrorCategory) -> String {
    format!("{}: {}", category.description(), category.advice())
}

/// 1 for request and validation errors, 2 for backend errors.
fn exit_code(category: Option<ErrorCategory>) -> u8 {
    match category {
        Some(ErrorCategory::Backend) => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(Some(ErrorCategory::Validation)), 1);
        assert_eq!(exit_code(Some(ErrorCategory::Input)), 1);
        assert_eq!(exit_code(Some(ErrorCategory::Backend)), 2);
        assert_eq!(exit_code(None), 1);
    }

    #[test]
    fn test_hint_names_category() {
        let text = hint(ErrorCategory::Validation);
        assert!(text.starts_with("Invalid option combination: "));
        assert!(text.ends_with("nothing was changed"));
    }

    #[test]
    fn test_backend_error_survives_anyhow() {
        let err: anyhow::Error =
            zonekit::Error::from(zonekit::BackendError::OfflineDeclined).into();
        let category = err
            .downcast_ref::<zonekit::Error>()
            .map(zonekit::Error::category);
        assert_eq!(category, Some(ErrorCategory::Backend));
    }
}

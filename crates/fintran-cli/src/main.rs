//! fintran CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use fintran_cli::cli::{Cli, Command};
use fintran_cli::commands::{run_check, run_convert, run_rules, run_schema, run_validate};
use fintran_cli::exit::{ExitStatus, exit_status};
use fintran_cli::logging::{LogConfig, init_logging};
use tracing::level_filters::LevelFilter;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    if let Err(error) = init_logging(&log_config(&cli)) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(ExitStatus::Unexpected.code());
    }

    let outcome = match &cli.command {
        Command::Convert(args) => run_convert(args),
        Command::Check(args) => run_check(args),
        Command::Validate(args) => run_validate(args),
        Command::Rules => run_rules(),
        Command::Schema => run_schema(),
    };
    let status = outcome.unwrap_or_else(|error| {
        eprintln!("error: {error:#}");
        exit_status(&error)
    });
    std::process::exit(status.code());
}

/// `--log-level` beats `-v/-q`, and either one disables `RUST_LOG`.
fn log_config(cli: &Cli) -> LogConfig {
    let explicit = cli.log_level.map(LevelFilter::from);
    let with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    LogConfig {
        level: explicit.unwrap_or_else(|| cli.verbosity.tracing_level_filter()),
        use_env_filter: explicit.is_none() && !cli.verbosity.is_present(),
        with_ansi,
        format: cli.log_format.into(),
        log_file: cli.log_file.clone(),
        ..LogConfig::default()
    }
}

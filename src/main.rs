//! cadir - content-addressed directory cache
//!
//! CLI entry point that dispatches to the restore flow or a subcommand.

use cadir::cli::{Cli, Commands};
use cadir::config::{Config, ConfigManager};
use cadir::error::{exit_code, CadirError, CadirResult};
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                exit_code::ARGUMENT_PARSING_FAILED
            } else {
                exit_code::OK
            };
            // --help and --version land here too
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli) -> CadirResult<()> {
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    // Find local config unless --no-local is set
    let local_config_path = if cli.no_local {
        None
    } else {
        let cwd =
            std::env::current_dir().map_err(|e| CadirError::io("getting current directory", e))?;
        ConfigManager::find_local_config(&cwd)
    };

    let config = config_manager.load_merged(local_config_path.as_deref())?;

    init_logging(cli.verbose, &config);
    if let Some(ref path) = local_config_path {
        debug!("Found local config: {}", path.display());
    }

    let verbose = cli.verbose > 0;
    match cli.command {
        None => cadir::cli::commands::restore(cli.restore, verbose, &config),
        Some(Commands::Pack(args)) => cadir::cli::commands::pack(args, &config),
        Some(Commands::Unpack(args)) => cadir::cli::commands::unpack(args),
        Some(Commands::Key(args)) => cadir::cli::commands::key(args),
        Some(Commands::Config(args)) => {
            cadir::cli::commands::config(args, &config_manager, &config)
        }
    }
}

/// 0 = warn, 1 = debug, 2+ = trace; RUST_LOG overrides
fn init_logging(verbose: u8, config: &Config) {
    let level = match verbose {
        0 if config.general.verbose => "cadir=debug",
        0 => "cadir=warn",
        1 => "cadir=debug",
        _ => "cadir=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    if config.general.log_format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

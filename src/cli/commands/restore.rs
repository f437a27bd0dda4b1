//! Restore command - resolve a cache entry for the cache source

use crate::cache::{CacheOrchestrator, CacheOutcome, CacheRequest};
use crate::cli::args::RestoreArgs;
use crate::config::Config;
use crate::error::{CadirError, CadirResult};
use crate::journal::Journal;
use crate::materialize::Materialize;
use crate::runner::ShellRunner;
use console::{style, Emoji};
use std::path::PathBuf;
use tracing::debug;

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");

/// Execute the restore command
pub fn execute(args: RestoreArgs, verbose: bool, config: &Config) -> CadirResult<()> {
    let invocation_dir =
        std::env::current_dir().map_err(|e| CadirError::io("getting current directory", e))?;
    let request = build_request(args, verbose, config, invocation_dir)?;
    debug!("{:?}", request);

    let runner = ShellRunner::new(config.commands.shell.clone(), request.verbose);
    let outcome = CacheOrchestrator::new(runner).resolve(&request)?;

    Journal::new(&request.cache_root, config.cache.journal).record(&outcome);

    if request.verbose {
        report(&outcome);
    }
    Ok(())
}

/// Combine flags and configuration into a validated request.
///
/// Flags win over configuration values.
pub fn build_request(
    args: RestoreArgs,
    verbose: bool,
    config: &Config,
    invocation_dir: PathBuf,
) -> CadirResult<CacheRequest> {
    let cache_source = args
        .cache_source
        .ok_or_else(|| CadirError::InvalidArguments("--cache-source is required".to_string()))?;
    let identity_file = args
        .identity_file
        .ok_or_else(|| CadirError::InvalidArguments("--identity-file is required".to_string()))?;

    let cache_root = args
        .cache_destination
        .or_else(|| config.cache.root.clone())
        .ok_or_else(|| {
            CadirError::InvalidArguments(
                "--cache-destination is required (or set cache.root in config)".to_string(),
            )
        })?;

    let setup_command = args
        .setup
        .or_else(|| config.commands.setup.clone())
        .ok_or_else(|| {
            CadirError::InvalidArguments(
                "--command is required (or set commands.setup in config)".to_string(),
            )
        })?;

    let working_dir = args
        .command_working_directory
        .or_else(|| config.commands.working_directory.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let materialize = if args.link || config.cache.link {
        Materialize::Link
    } else {
        Materialize::Copy
    };

    Ok(CacheRequest {
        identity_file,
        cache_source,
        cache_root,
        working_dir,
        setup_command,
        finalize_command: args.finalize.or_else(|| config.commands.finalize.clone()),
        materialize,
        verbose: verbose || config.general.verbose,
        invocation_dir,
    })
}

fn report(outcome: &CacheOutcome) {
    let detail = match outcome {
        CacheOutcome::Populated { .. } => "cache populated".to_string(),
        CacheOutcome::Copied { finalized, .. } => {
            if *finalized {
                "copied from cache, finalize succeeded".to_string()
            } else {
                "copied from cache".to_string()
            }
        }
        CacheOutcome::Linked { link, .. } => format!("linked {}", link.display()),
    };

    eprintln!(
        "{}{} {}",
        CHECK,
        style(detail).green(),
        style(outcome.key()).dim()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn args() -> RestoreArgs {
        RestoreArgs {
            cache_source: Some(PathBuf::from("node_modules")),
            identity_file: Some(PathBuf::from("package-lock.json")),
            cache_destination: Some(PathBuf::from("/cache")),
            setup: Some("npm ci".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn flags_only() {
        let request = build_request(args(), false, &Config::default(), PathBuf::from("/w")).unwrap();

        assert_eq!(request.cache_root, Path::new("/cache"));
        assert_eq!(request.setup_command, "npm ci");
        assert_eq!(request.working_dir, Path::new("."));
        assert_eq!(request.materialize, Materialize::Copy);
        assert!(request.finalize_command.is_none());
        assert!(!request.verbose);
        assert_eq!(request.invocation_dir, Path::new("/w"));
    }

    #[test]
    fn config_fills_missing_flags() {
        let mut config = Config::default();
        config.cache.root = Some(PathBuf::from("/configured"));
        config.cache.link = true;
        config.commands.setup = Some("yarn install".to_string());
        config.commands.finalize = Some("yarn postinstall".to_string());
        config.commands.working_directory = Some(PathBuf::from("web"));
        config.general.verbose = true;

        let mut args = args();
        args.cache_destination = None;
        args.setup = None;

        let request = build_request(args, false, &config, PathBuf::from("/w")).unwrap();

        assert_eq!(request.cache_root, Path::new("/configured"));
        assert_eq!(request.setup_command, "yarn install");
        assert_eq!(request.finalize_command.as_deref(), Some("yarn postinstall"));
        assert_eq!(request.working_dir, Path::new("web"));
        assert_eq!(request.materialize, Materialize::Link);
        assert!(request.verbose);
    }

    #[test]
    fn flags_override_config() {
        let mut config = Config::default();
        config.cache.root = Some(PathBuf::from("/configured"));
        config.commands.setup = Some("yarn install".to_string());

        let request = build_request(args(), true, &config, PathBuf::from("/w")).unwrap();

        assert_eq!(request.cache_root, Path::new("/cache"));
        assert_eq!(request.setup_command, "npm ci");
        assert!(request.verbose);
    }

    #[test]
    fn missing_destination_is_invalid() {
        let mut args = args();
        args.cache_destination = None;

        let err = build_request(args, false, &Config::default(), PathBuf::from("/w")).unwrap_err();
        assert!(matches!(err, CadirError::InvalidArguments(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn missing_setup_is_invalid() {
        let mut args = args();
        args.setup = None;

        let err = build_request(args, false, &Config::default(), PathBuf::from("/w")).unwrap_err();
        assert!(err.to_string().contains("--command"));
    }
}

//! CLI argument definitions using clap derive

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// cadir - content-addressed directory cache
///
/// Restores a generated directory (such as node_modules) from a cache keyed
/// by the contents of an identity file, running the setup command only when
/// no entry exists yet.
#[derive(Parser, Debug)]
#[command(name = "cadir")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(subcommand_negates_reqs = true)]
pub struct Cli {
    /// Archive and inspection commands; omit to restore a cache entry
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub restore: RestoreArgs,

    /// Echo command output and enable debug logging (-vv for trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(long, global = true, env = "CADIR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .cadir.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Arguments for restoring a cache entry
#[derive(Args, Debug, Default)]
pub struct RestoreArgs {
    /// Directory to cache on a miss and restore on a hit
    #[arg(short = 's', long, required = true)]
    pub cache_source: Option<PathBuf>,

    /// File whose contents identify the cache entry
    #[arg(short = 'i', long, required = true)]
    pub identity_file: Option<PathBuf>,

    /// Cache root holding all entries [config: cache.root]
    #[arg(short = 'd', long)]
    pub cache_destination: Option<PathBuf>,

    /// Working directory for setup and finalize commands [default: .]
    #[arg(short = 'w', long)]
    pub command_working_directory: Option<PathBuf>,

    /// Command that regenerates the cache source on a miss [config: commands.setup]
    #[arg(short = 'c', long = "command", visible_alias = "setup")]
    pub setup: Option<String>,

    /// Command run after the entry is copied back on a hit
    #[arg(short = 'f', long = "finalize-command", visible_alias = "finalize")]
    pub finalize: Option<String>,

    /// Replace the cache source with a symlink to the entry instead of a copy
    #[arg(short = 'l', long)]
    pub link: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pack a directory into a gzip-compressed tar archive
    Pack(PackArgs),

    /// Unpack a tar or tar.gz archive into a directory
    Unpack(UnpackArgs),

    /// Print the cache key derived from a file
    Key(KeyArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the pack command
#[derive(Parser, Debug)]
pub struct PackArgs {
    /// Directory to archive
    pub source: PathBuf,

    /// Archive file to write
    pub output: PathBuf,

    /// gzip compression level, 0-9 [config: archive.compression_level]
    #[arg(long)]
    pub level: Option<u32>,

    /// Tar header format [config: archive.format]
    #[arg(long, value_parser = ["gnu", "ustar"])]
    pub format: Option<String>,
}

/// Arguments for the unpack command
#[derive(Parser, Debug)]
pub struct UnpackArgs {
    /// Archive to read
    pub archive: PathBuf,

    /// Directory to extract into (created if missing)
    pub destination: PathBuf,
}

/// Arguments for the key command
#[derive(Parser, Debug)]
pub struct KeyArgs {
    /// Identity file to hash
    pub file: PathBuf,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Show the global config file path
    Path,

    /// Write a default global config file
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_restore_flags() {
        let cli = Cli::try_parse_from([
            "cadir", "-s", "node_modules", "-i", "package-lock.json", "-d", "/cache", "-c",
            "npm ci", "-f", "npm rebuild", "-w", "app", "-v", "-l",
        ])
        .unwrap();

        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 1);
        let restore = cli.restore;
        assert_eq!(restore.cache_source, Some(PathBuf::from("node_modules")));
        assert_eq!(restore.identity_file, Some(PathBuf::from("package-lock.json")));
        assert_eq!(restore.cache_destination, Some(PathBuf::from("/cache")));
        assert_eq!(restore.setup.as_deref(), Some("npm ci"));
        assert_eq!(restore.finalize.as_deref(), Some("npm rebuild"));
        assert_eq!(restore.command_working_directory, Some(PathBuf::from("app")));
        assert!(restore.link);
    }

    #[test]
    fn parse_long_aliases() {
        let cli = Cli::try_parse_from([
            "cadir",
            "--cache-source",
            "deps",
            "--identity-file",
            "deps.lock",
            "--setup",
            "make deps",
            "--finalize",
            "make post",
        ])
        .unwrap();

        assert_eq!(cli.restore.setup.as_deref(), Some("make deps"));
        assert_eq!(cli.restore.finalize.as_deref(), Some("make post"));
        assert!(!cli.restore.link);
    }

    #[test]
    fn restore_requires_source_and_identity() {
        assert!(Cli::try_parse_from(["cadir", "-s", "deps"]).is_err());
        assert!(Cli::try_parse_from(["cadir", "-i", "deps.lock"]).is_err());
        assert!(Cli::try_parse_from(["cadir"]).is_err());
    }

    #[test]
    fn subcommands_do_not_need_restore_flags() {
        let cli = Cli::try_parse_from(["cadir", "key", "Cargo.lock"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Key(_))));

        let cli = Cli::try_parse_from(["cadir", "pack", "src", "out.tar.gz", "--level", "9"])
            .unwrap();
        match cli.command {
            Some(Commands::Pack(args)) => {
                assert_eq!(args.level, Some(9));
                assert!(args.format.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn pack_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["cadir", "pack", "a", "b", "--format", "zip"]).is_err());
    }

    #[test]
    fn parse_config_init_force() {
        let cli = Cli::try_parse_from(["cadir", "config", "init", "--force"]).unwrap();
        match cli.command {
            Some(Commands::Config(ConfigArgs {
                action: Some(ConfigAction::Init { force }),
            })) => assert!(force),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["cadir", "unpack", "a.tgz", "out", "-vv", "--no-local"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_local);
    }
}

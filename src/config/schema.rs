//! Configuration schema for cadir
//!
//! Configuration is stored at `~/.config/cadir/config.toml`, optionally
//! overridden per project by a `.cadir.toml`.

use crate::archive::ArchiveOptions;
use crate::runner::DEFAULT_SHELL;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache location and restore behaviour
    pub cache: CacheConfig,

    /// Setup and finalize commands
    pub commands: CommandsConfig,

    /// Archive writer settings
    pub archive: ArchiveOptions,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Cache settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root, used when --cache-destination is not given
    pub root: Option<PathBuf>,

    /// Materialize hits as symlinks instead of copies
    pub link: bool,

    /// Append a JSON line per invocation to `<root>/journal.log`
    pub journal: bool,
}

/// Command settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Setup command, used when --command is not given
    pub setup: Option<String>,

    /// Finalize command, used when --finalize-command is not given
    pub finalize: Option<String>,

    /// Working directory for both commands
    pub working_directory: Option<PathBuf>,

    /// Shell that runs the commands via `-c`
    pub shell: String,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            setup: None,
            finalize: None,
            working_directory: None,
            shell: DEFAULT_SHELL.to_string(),
        }
    }
}

//! Error types for cadir
//!
//! All modules use `CadirResult<T>` as their return type. Every failure
//! point of the cache state machine has its own variant and exit code.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cadir operations
pub type CadirResult<T> = Result<T, CadirError>;

/// Exit codes surfaced at the process boundary
pub mod exit_code {
    pub const OK: u8 = 0;
    pub const ARGUMENT_PARSING_FAILED: u8 = 1;
    pub const IDENTITY_FILE_FAILED: u8 = 2;
    pub const SETUP_COMMAND_FAILED: u8 = 3;
    pub const FINALIZE_COMMAND_FAILED: u8 = 4;
    pub const COPY_TO_CACHE_FAILED: u8 = 5;
    pub const COPY_FROM_CACHE_FAILED: u8 = 6;
    pub const CREATE_SYMLINK_FAILED: u8 = 7;
    pub const CLEANING_FAILED: u8 = 8;
    pub const CREATE_CACHE_DIRECTORY_FAILED: u8 = 9;
    pub const ARCHIVE_FAILED: u8 = 10;
    pub const IO_FAILED: u8 = 11;
}

/// All errors that can occur in cadir
#[derive(Error, Debug)]
pub enum CadirError {
    // Argument and configuration errors
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Cache state machine errors
    #[error("Cannot read identity file {path}: {source}")]
    IdentityFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Setup command failed: {command} (exit code: {code})")]
    SetupCommandFailed { command: String, code: i32 },

    #[error("Finalize command failed: {command} (exit code: {code})")]
    FinalizeCommandFailed { command: String, code: i32 },

    #[error("Create cache directories failed: {path}: {source}")]
    CreateCacheDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Copy to cache failed: {from} -> {to}: {source}")]
    CopyToCacheFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Copy from cache failed: {from} -> {to}: {source}")]
    CopyFromCacheFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create symlink {link} -> {target}: {source}")]
    CreateSymlinkFailed {
        target: PathBuf,
        link: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cleaning for cache regeneration failed: {path}: {source}")]
    CleaningFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Archive errors
    #[error(transparent)]
    Archive(#[from] crate::archive::ArchiveError),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl CadirError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidArguments(_)
            | Self::ConfigInvalid { .. }
            | Self::TomlParse(_) => exit_code::ARGUMENT_PARSING_FAILED,
            Self::IdentityFileUnreadable { .. } => exit_code::IDENTITY_FILE_FAILED,
            Self::SetupCommandFailed { .. } => exit_code::SETUP_COMMAND_FAILED,
            Self::FinalizeCommandFailed { .. } => exit_code::FINALIZE_COMMAND_FAILED,
            Self::CopyToCacheFailed { .. } => exit_code::COPY_TO_CACHE_FAILED,
            Self::CopyFromCacheFailed { .. } => exit_code::COPY_FROM_CACHE_FAILED,
            Self::CreateSymlinkFailed { .. } => exit_code::CREATE_SYMLINK_FAILED,
            Self::CleaningFailed { .. } => exit_code::CLEANING_FAILED,
            Self::CreateCacheDirectoryFailed { .. } => exit_code::CREATE_CACHE_DIRECTORY_FAILED,
            Self::Archive(_) => exit_code::ARCHIVE_FAILED,
            Self::ConfigDirCreate { .. }
            | Self::Io { .. }
            | Self::Json(_)
            | Self::TomlSerialize(_) => exit_code::IO_FAILED,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidArguments(_) => Some("Run: cadir --help"),
            Self::SetupCommandFailed { .. } | Self::FinalizeCommandFailed { .. } => {
                Some("Re-run with --verbose to see the command output")
            }
            Self::CreateSymlinkFailed { .. } => {
                Some("Check that the parent of --cache-source exists, or drop --link")
            }
            Self::Archive(crate::archive::ArchiveError::Extract { .. }) => {
                Some("The destination may hold a partial tree; remove it before retrying")
            }
            _ => None,
        }
    }
}

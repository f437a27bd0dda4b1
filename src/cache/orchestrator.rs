//! Cache hit/miss state machine
//!
//! Derives the key, probes the cache entry, then either populates it (miss)
//! or materializes it into the cache source path (hit). The first failure
//! ends the run with its own error variant.

use crate::cache::key::CacheKey;
use crate::cache::lock::EntryLock;
use crate::cache::path;
use crate::error::{CadirError, CadirResult};
use crate::materialize::{self, Materialize};
use crate::runner::{CommandOutput, CommandRunner};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Validated parameters for one cache resolution
#[derive(Debug, Clone)]
pub struct CacheRequest {
    /// File whose bytes seed the cache key
    pub identity_file: PathBuf,
    /// Live directory to cache (miss) or restore (hit)
    pub cache_source: PathBuf,
    /// Directory holding all cache entries
    pub cache_root: PathBuf,
    /// Working directory for setup and finalize commands
    pub working_dir: PathBuf,
    /// Command regenerating the cache source on a miss
    pub setup_command: String,
    /// Command run after a copy-mode hit
    pub finalize_command: Option<String>,
    /// Copy or symlink on a hit
    pub materialize: Materialize,
    /// Echo captured command output
    pub verbose: bool,
    /// Directory the process was started from, used to anchor relative paths
    pub invocation_dir: PathBuf,
}

/// Whether the cache entry existed when probed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Miss,
    Hit,
}

impl CacheState {
    /// Probe the entry path
    pub fn probe(entry: &Path) -> Self {
        if entry.exists() {
            Self::Hit
        } else {
            Self::Miss
        }
    }
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Miss => write!(f, "miss"),
            Self::Hit => write!(f, "hit"),
        }
    }
}

/// Terminal success states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Miss: setup ran and the entry was created
    Populated { key: CacheKey, entry: PathBuf },
    /// Hit: entry copied into the cache source
    Copied {
        key: CacheKey,
        entry: PathBuf,
        finalized: bool,
    },
    /// Hit: cache source replaced by a symlink to the entry
    Linked {
        key: CacheKey,
        entry: PathBuf,
        link: PathBuf,
    },
}

impl CacheOutcome {
    pub fn key(&self) -> &CacheKey {
        match self {
            Self::Populated { key, .. } | Self::Copied { key, .. } | Self::Linked { key, .. } => {
                key
            }
        }
    }

    pub fn entry(&self) -> &Path {
        match self {
            Self::Populated { entry, .. }
            | Self::Copied { entry, .. }
            | Self::Linked { entry, .. } => entry,
        }
    }

    pub fn state(&self) -> CacheState {
        match self {
            Self::Populated { .. } => CacheState::Miss,
            Self::Copied { .. } | Self::Linked { .. } => CacheState::Hit,
        }
    }

    /// Event name used in the journal
    pub fn event(&self) -> &'static str {
        match self {
            Self::Populated { .. } => "cache.populated",
            Self::Copied { .. } => "cache.copied",
            Self::Linked { .. } => "cache.linked",
        }
    }
}

/// Drives one cache resolution using a [`CommandRunner`]
pub struct CacheOrchestrator<R> {
    runner: R,
}

impl<R: CommandRunner> CacheOrchestrator<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Resolve `request` to a populated or materialized cache entry
    pub fn resolve(&self, request: &CacheRequest) -> CadirResult<CacheOutcome> {
        let key = CacheKey::from_identity_file(&request.identity_file)?;
        info!("Identity file is: {}", key);

        let entry = path::entry_path(&request.cache_root, &key);
        match CacheState::probe(&entry) {
            CacheState::Hit => self.load_from_cache(request, key, entry),
            CacheState::Miss => {
                info!("No cache exists");
                self.create_cache(request, key, entry)
            }
        }
    }

    /// Miss path: setup, then populate a staging directory and rename it
    /// into place while holding the per-key lock.
    fn create_cache(
        &self,
        request: &CacheRequest,
        key: CacheKey,
        entry: PathBuf,
    ) -> CadirResult<CacheOutcome> {
        let root = &request.cache_root;
        fs::create_dir_all(root).map_err(|e| CadirError::CreateCacheDirectoryFailed {
            path: root.clone(),
            source: e,
        })?;

        let lock_path = path::lock_path(root, &key);
        let _lock =
            EntryLock::acquire(&lock_path).map_err(|e| CadirError::CreateCacheDirectoryFailed {
                path: lock_path.clone(),
                source: e,
            })?;

        if CacheState::probe(&entry) == CacheState::Hit {
            info!("Cache populated by another process while waiting");
            return self.load_from_cache(request, key, entry);
        }

        let setup = self.execute(request, &request.setup_command);
        if !setup.success() {
            return Err(CadirError::SetupCommandFailed {
                command: request.setup_command.clone(),
                code: setup.code_or_signal(),
            });
        }

        let staging = path::staging_path(root, &key);
        debug!("Create cache directory: {}", staging.display());
        fs::create_dir_all(&staging).map_err(|e| CadirError::CreateCacheDirectoryFailed {
            path: staging.clone(),
            source: e,
        })?;

        if let Err(e) = materialize::copy_tree(&request.cache_source, &staging) {
            discard_staging(&staging);
            return Err(CadirError::CopyToCacheFailed {
                from: request.cache_source.clone(),
                to: entry,
                source: e,
            });
        }

        if let Err(e) = fs::rename(&staging, &entry) {
            discard_staging(&staging);
            return Err(CadirError::CreateCacheDirectoryFailed {
                path: entry,
                source: e,
            });
        }

        info!("Cache entry created: {}", entry.display());
        Ok(CacheOutcome::Populated { key, entry })
    }

    /// Hit path: clear the cache source, then copy or link the entry.
    fn load_from_cache(
        &self,
        request: &CacheRequest,
        key: CacheKey,
        entry: PathBuf,
    ) -> CadirResult<CacheOutcome> {
        info!("Cache found: {}", entry.display());

        let source = &request.cache_source;
        if fs::symlink_metadata(source).is_ok() {
            debug!("Removing {}", source.display());
            materialize::remove_path(source).map_err(|e| CadirError::CleaningFailed {
                path: source.clone(),
                source: e,
            })?;
        }

        match request.materialize {
            Materialize::Copy => {
                materialize::copy_tree(&entry, source).map_err(|e| {
                    CadirError::CopyFromCacheFailed {
                        from: entry.clone(),
                        to: source.clone(),
                        source: e,
                    }
                })?;

                let finalize = request
                    .finalize_command
                    .as_deref()
                    .filter(|c| !c.trim().is_empty());

                let finalized = match finalize {
                    Some(command) => {
                        let out = self.execute(request, command);
                        if !out.success() {
                            return Err(CadirError::FinalizeCommandFailed {
                                command: command.to_string(),
                                code: out.code_or_signal(),
                            });
                        }
                        true
                    }
                    None => false,
                };

                Ok(CacheOutcome::Copied {
                    key,
                    entry,
                    finalized,
                })
            }
            Materialize::Link => {
                let target = path::anchor(&entry, &request.invocation_dir);
                materialize::link(&target, source, &request.invocation_dir).map_err(|e| {
                    CadirError::CreateSymlinkFailed {
                        target: target.clone(),
                        link: source.clone(),
                        source: e,
                    }
                })?;

                Ok(CacheOutcome::Linked {
                    key,
                    entry: target,
                    link: source.clone(),
                })
            }
        }
    }

    fn execute(&self, request: &CacheRequest, command: &str) -> CommandOutput {
        let out = self.runner.run(&request.working_dir, command);
        if request.verbose && !out.output.is_empty() {
            print!("{}", out.output);
        }
        debug!("Command exited with {:?}", out.code);
        out
    }
}

fn discard_staging(staging: &Path) {
    if let Err(e) = materialize::remove_path(staging) {
        warn!("Failed to remove staging directory {}: {}", staging.display(), e);
    }
}

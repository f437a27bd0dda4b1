//! Content-addressed directory cache
//!
//! A cache entry is a directory named after the SHA-256 of an identity file
//! (typically a lockfile). The first run with a given identity executes the
//! setup command and stores the produced directory; later runs restore it
//! by copy or symlink instead.
//!
//! # Cache States
//!
//! | State | Action |
//! |-------|--------|
//! | Miss | run setup, copy cache source into a staging dir, rename into place |
//! | Hit (copy) | clear cache source, copy entry back, run finalize |
//! | Hit (link) | clear cache source, symlink it to the entry |
//!
//! Population is serialized per key with an exclusive file lock, and entries
//! only become visible through an atomic rename, so readers never observe a
//! half-written entry.

pub mod key;
pub mod lock;
pub mod orchestrator;
pub mod path;

pub use key::CacheKey;
pub use lock::EntryLock;
pub use orchestrator::{CacheOrchestrator, CacheOutcome, CacheRequest, CacheState};

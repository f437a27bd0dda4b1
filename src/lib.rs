//! cadir - content-addressed directory cache
//!
//! Restores generated build artifacts (dependency trees, toolchains) from a
//! cache keyed by the SHA-256 of an identity file, and packs or unpacks
//! directory trees as gzip-compressed tar archives.

pub mod archive;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod journal;
pub mod materialize;
pub mod runner;

pub use error::{CadirError, CadirResult};

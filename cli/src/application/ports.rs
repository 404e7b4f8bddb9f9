//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`; never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;

use crate::domain::{ExtractError, FetchError, Marker, ProxySettings};

// ── Value Types ───────────────────────────────────────────────────────────────

/// A single download: where from, where to, and through which proxy.
#[derive(Debug, Clone, Copy)]
pub struct DownloadRequest<'a> {
    /// Source URL.
    pub url: &'a str,
    /// Destination file; parents are created, existing content truncated.
    pub dest: &'a Path,
    /// Optional HTTP proxy.
    pub proxy: Option<&'a ProxySettings>,
}

// ── Download Ports ────────────────────────────────────────────────────────────

/// Performs one HTTP GET attempt. Retry policy lives in the application layer.
pub trait Downloader {
    /// Download `request.url` into `request.dest`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on a non-2xx status, a transport failure, or a
    /// failure writing the destination file.
    fn download(&self, request: &DownloadRequest<'_>) -> Result<(), FetchError>;
}

/// Blocking wait between retries, swappable so tests don't sleep.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

// ── Install Port ──────────────────────────────────────────────────────────────

/// Unpacks a gzip-compressed tar archive.
pub trait ArchiveExtractor {
    /// Extract `archive` into `target`, creating `target` if absent.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError` on corruption or filesystem failure.
    fn extract(&self, archive: &Path, target: &Path) -> Result<(), ExtractError>;
}

// ── Launch Command Ports ──────────────────────────────────────────────────────

/// The primary launch command together with its format's marker convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCommand {
    pub command: String,
    pub marker: Marker,
}

/// Persisted location of the application's primary launch command.
pub trait LaunchCommandStore {
    /// Read the primary launch command.
    fn load(&self) -> Result<StoredCommand>;
    /// Replace the primary launch command, leaving every other entry intact.
    fn save(&self, command: &str) -> Result<()>;
}

/// Exposes environment variables to the launched process.
pub trait EnvironmentWriter {
    /// Persist `environment` for the application's runtime.
    fn write_environment(&self, environment: &BTreeMap<String, String>) -> Result<()>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait; no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

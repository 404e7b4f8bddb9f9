//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `std::fs`, `std::process`, or `std::net`.
//! Configuration-stage errors (`BindingParseError`, `FieldTypeError`) are
//! recovered inside the resolver; everything else is fatal to the pipeline.

use std::path::PathBuf;

use thiserror::Error;

// ── Configuration errors (recovered) ──────────────────────────────────────────

/// The service-binding document is absent or not shaped as
/// `{ group: [ { name, credentials } ] }`.
#[derive(Debug, Error)]
#[error("service bindings are not readable: {0}")]
pub struct BindingParseError(#[from] pub serde_json::Error);

/// A credential field is present with an unexpected JSON type.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("credential '{key}' is not {expected}")]
pub struct FieldTypeError {
    pub key: String,
    pub expected: &'static str,
}

// ── Fetch errors ──────────────────────────────────────────────────────────────

/// A single download attempt failed. Every variant is retryable.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not download {url}: HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not download {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ── Extract errors ────────────────────────────────────────────────────────────

/// Archive corruption or filesystem failure while installing the agent.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot open archive {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot create install directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot unpack {} into {}: {source}", archive.display(), target.display())]
    Unpack {
        archive: PathBuf,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ── Rewrite errors ────────────────────────────────────────────────────────────

/// The launch command cannot be wrapped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RewriteError {
    #[error("launch command does not contain '{marker}': {command}")]
    MalformedCommand { marker: String, command: String },
}

// ── Pipeline errors ───────────────────────────────────────────────────────────

/// Fatal errors raised after the integration has been enabled.
#[derive(Debug, Error)]
pub enum InjectError {
    #[error("Sealights. Failed to download package: {0}")]
    Fetch(#[from] FetchError),

    #[error("Sealights. Failed to extract package: {0}")]
    Extract(#[from] ExtractError),

    #[error("Sealights. Failed to rewrite start command: {0}")]
    Rewrite(#[from] RewriteError),

    #[error("Sealights. Launch command file: {0:#}")]
    LaunchFile(anyhow::Error),

    #[error("Sealights. Runtime environment: {0:#}")]
    Environment(anyhow::Error),
}

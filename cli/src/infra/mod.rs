//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: HTTP downloads, archive
//! extraction, launch-command files, and the runtime profile script.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod archive;
pub mod clock;
pub mod http;
pub mod launch_file;
pub mod profile;

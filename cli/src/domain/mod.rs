//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod binding;
pub mod command;
pub mod config;
pub mod error;
pub mod retry;

pub use binding::{ServiceBinding, ServiceBindingSet};
pub use command::{LaunchCommand, Marker, rewrite, split_launch_command};
pub use config::{ConfigWarning, ProxySettings, ResolvedConfig, resolve};
pub use error::{
    BindingParseError, ExtractError, FetchError, FieldTypeError, InjectError, RewriteError,
};

//! Command implementations

pub mod resolve;
pub mod run;
pub mod version;

use clap::Args;

/// Source of the service-binding document, shared by `run` and `resolve`.
#[derive(Args)]
pub struct BindingsArgs {
    /// Service-binding JSON document
    #[arg(long = "bindings", env = "VCAP_SERVICES", hide_env_values = true)]
    pub document: Option<String>,

    /// Buildpack version used for the default tool name
    #[arg(long, env = "BUILDPACK_VERSION")]
    pub buildpack_version: Option<String>,
}

impl BindingsArgs {
    /// The binding document, empty when none was supplied.
    #[must_use]
    pub fn document(&self) -> &str {
        self.document.as_deref().unwrap_or_default()
    }
}

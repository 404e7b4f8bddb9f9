//! Runtime environment: implements `EnvironmentWriter` with a `.profile.d`
//! script, which the platform sources before starting the application.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::EnvironmentWriter;

/// Script location relative to the build directory.
pub const PROFILE_SCRIPT: &str = ".profile.d/sealights.sh";

/// Writes `export KEY=value` lines to a profile script.
pub struct ProfileScript {
    path: PathBuf,
}

impl ProfileScript {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The conventional script inside `build_dir`.
    #[must_use]
    pub fn in_build_dir(build_dir: &Path) -> Self {
        Self::new(build_dir.join(PROFILE_SCRIPT))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EnvironmentWriter for ProfileScript {
    fn write_environment(&self, environment: &BTreeMap<String, String>) -> Result<()> {
        let script = render_script(environment);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        std::fs::write(&self.path, script)
            .with_context(|| format!("writing {}", self.path.display()))
    }
}

fn render_script(environment: &BTreeMap<String, String>) -> String {
    let mut script = String::from("# Sealights agent environment\n");
    for (name, value) in environment {
        if !is_variable_name(name) {
            tracing::warn!(%name, "Sealights. Skipping invalid environment variable name");
            continue;
        }
        script.push_str(&format!("export {name}={}\n", shell_words::quote(value)));
    }
    script
}

fn is_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

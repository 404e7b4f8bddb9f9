//! Launch-command files: implements `LaunchCommandStore`.
//!
//! Three layouts carry the application's primary start command:
//! the .NET Core buildpack release-step YAML, a `Procfile`, and the
//! `manifest.yml`. Only the primary entry is read or replaced.

use std::cell::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde_yaml::Value;

use crate::application::ports::{LaunchCommandStore, StoredCommand};
use crate::domain::Marker;

pub const RELEASE_STEP_FILE: &str = "tmp/dotnet-core-buildpack-release-step.yml";
pub const PROCFILE: &str = "Procfile";
pub const MANIFEST_FILE: &str = "manifest.yml";

/// Process type whose command is rewritten.
const PRIMARY_PROCESS: &str = "web";

// ── Format ───────────────────────────────────────────────────────────────────

/// Layout of a launch-command file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchFormat {
    /// `default_process_types.web` in the buildpack release step,
    /// e.g. `cd ${DEPS_DIR}/0/dotnet_publish && exec ./app`.
    Release,
    /// `web: dotnet app.dll`.
    Procfile,
    /// `applications[0].command`.
    Manifest,
}

impl LaunchFormat {
    /// Detection order inside a build directory.
    pub const ALL: [Self; 3] = [Self::Release, Self::Procfile, Self::Manifest];

    #[must_use]
    pub fn marker(self) -> Marker {
        match self {
            Self::Release => Marker::Exec,
            Self::Procfile | Self::Manifest => Marker::Runtime,
        }
    }

    /// Conventional location relative to the build directory.
    #[must_use]
    pub fn default_path(self, build_dir: &Path) -> PathBuf {
        match self {
            Self::Release => build_dir.join(RELEASE_STEP_FILE),
            Self::Procfile => build_dir.join(PROCFILE),
            Self::Manifest => build_dir.join(MANIFEST_FILE),
        }
    }

    /// Guess the format from a file name; anything unrecognised is a release step.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.file_name().and_then(|n| n.to_str()) {
            Some(PROCFILE) => Self::Procfile,
            Some("manifest.yml" | "manifest.yaml") => Self::Manifest,
            _ => Self::Release,
        }
    }
}

impl fmt::Display for LaunchFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Release => "release",
            Self::Procfile => "procfile",
            Self::Manifest => "manifest",
        })
    }
}

impl FromStr for LaunchFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "release" => Ok(Self::Release),
            "procfile" => Ok(Self::Procfile),
            "manifest" => Ok(Self::Manifest),
            other => Err(format!(
                "unknown launch format '{other}' (expected release, procfile or manifest)"
            )),
        }
    }
}

// ── Store ────────────────────────────────────────────────────────────────────

/// A launch-command file on disk.
#[derive(Debug, Clone)]
pub struct LaunchFile {
    path: PathBuf,
    format: LaunchFormat,
}

impl LaunchFile {
    #[must_use]
    pub fn new(path: PathBuf, format: LaunchFormat) -> Self {
        Self { path, format }
    }

    /// Locate the launch-command file in `build_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error when none of the known files exists.
    pub fn detect(build_dir: &Path) -> Result<Self> {
        LaunchFormat::ALL
            .into_iter()
            .map(|format| Self::new(format.default_path(build_dir), format))
            .find(|file| file.path.is_file())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Failed to detect launch command type in {}",
                    build_dir.display()
                )
            })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn format(&self) -> LaunchFormat {
        self.format
    }

    fn read(&self) -> Result<String> {
        std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))
    }
}

impl LaunchCommandStore for LaunchFile {
    fn load(&self) -> Result<StoredCommand> {
        let content = self.read()?;
        let command = primary_command(self.format, &content)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(StoredCommand {
            command,
            marker: self.format.marker(),
        })
    }

    fn save(&self, command: &str) -> Result<()> {
        let content = self.read()?;
        let updated = replace_primary_command(self.format, &content, command)
            .with_context(|| format!("updating {}", self.path.display()))?;
        std::fs::write(&self.path, updated)
            .with_context(|| format!("writing {}", self.path.display()))
    }
}

/// Launch file chosen on first use: the explicit one, else whatever
/// [`LaunchFile::detect`] finds in the build directory. Builds without a
/// Sealights binding never touch it.
#[derive(Debug)]
pub struct LaunchLocator {
    build_dir: PathBuf,
    explicit: Option<LaunchFile>,
    detected: OnceCell<LaunchFile>,
}

impl LaunchLocator {
    #[must_use]
    pub fn new(build_dir: PathBuf, explicit: Option<LaunchFile>) -> Self {
        Self {
            build_dir,
            explicit,
            detected: OnceCell::new(),
        }
    }

    fn file(&self) -> Result<&LaunchFile> {
        if let Some(file) = &self.explicit {
            return Ok(file);
        }
        if let Some(file) = self.detected.get() {
            return Ok(file);
        }
        let file = LaunchFile::detect(&self.build_dir)?;
        tracing::debug!(path = %file.path.display(), format = %file.format, "Sealights. Launch file detected");
        Ok(self.detected.get_or_init(|| file))
    }
}

impl LaunchCommandStore for LaunchLocator {
    fn load(&self) -> Result<StoredCommand> {
        self.file()?.load()
    }

    fn save(&self, command: &str) -> Result<()> {
        self.file()?.save(command)
    }
}

// ── Parsing ──────────────────────────────────────────────────────────────────

/// Extract the primary launch command from file content.
///
/// # Errors
///
/// Returns an error when the content has no primary command.
pub fn primary_command(format: LaunchFormat, content: &str) -> Result<String> {
    match format {
        LaunchFormat::Release | LaunchFormat::Manifest => {
            let document: Value = serde_yaml::from_str(content).context("invalid YAML")?;
            yaml_command(format, &document)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| missing(format))
        }
        LaunchFormat::Procfile => procfile_primary(content)
            .map(|entry| entry.command.to_string())
            .ok_or_else(|| missing(format)),
    }
}

/// Replace the primary launch command, keeping every other entry.
///
/// # Errors
///
/// Returns an error when the content has no primary command.
pub fn replace_primary_command(format: LaunchFormat, content: &str, command: &str) -> Result<String> {
    match format {
        LaunchFormat::Release | LaunchFormat::Manifest => {
            let mut document: Value = serde_yaml::from_str(content).context("invalid YAML")?;
            let slot = yaml_command_mut(format, &mut document).ok_or_else(|| missing(format))?;
            *slot = Value::String(command.to_string());
            serde_yaml::to_string(&document).context("serializing YAML")
        }
        LaunchFormat::Procfile => {
            let entry = procfile_primary(content).ok_or_else(|| missing(format))?;
            let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
            lines[entry.line] = format!("{}: {command}", entry.process);
            let mut updated = lines.join("\n");
            if content.ends_with('\n') {
                updated.push('\n');
            }
            Ok(updated)
        }
    }
}

fn missing(format: LaunchFormat) -> anyhow::Error {
    match format {
        LaunchFormat::Release => {
            anyhow::anyhow!("no 'default_process_types.{PRIMARY_PROCESS}' command")
        }
        LaunchFormat::Procfile => anyhow::anyhow!("no process type declared"),
        LaunchFormat::Manifest => anyhow::anyhow!("no 'applications[0].command'"),
    }
}

fn yaml_command(format: LaunchFormat, document: &Value) -> Option<&Value> {
    match format {
        LaunchFormat::Release => document.get("default_process_types")?.get(PRIMARY_PROCESS),
        LaunchFormat::Manifest => document.get("applications")?.get(0)?.get("command"),
        LaunchFormat::Procfile => None,
    }
}

fn yaml_command_mut(format: LaunchFormat, document: &mut Value) -> Option<&mut Value> {
    let slot = match format {
        LaunchFormat::Release => document
            .get_mut("default_process_types")?
            .get_mut(PRIMARY_PROCESS)?,
        LaunchFormat::Manifest => document
            .get_mut("applications")?
            .get_mut(0)?
            .get_mut("command")?,
        LaunchFormat::Procfile => return None,
    };
    slot.is_string().then_some(slot)
}

struct ProcfileEntry<'a> {
    line: usize,
    process: &'a str,
    command: &'a str,
}

/// The `web` entry, else the first declared process.
fn procfile_primary(content: &str) -> Option<ProcfileEntry<'_>> {
    let entries: Vec<ProcfileEntry<'_>> = content
        .lines()
        .enumerate()
        .filter_map(|(line, text)| {
            let text = text.trim();
            if text.is_empty() || text.starts_with('#') {
                return None;
            }
            let (process, command) = text.split_once(':')?;
            Some(ProcfileEntry {
                line,
                process: process.trim(),
                command: command.trim(),
            })
        })
        .collect();

    let web = entries.iter().position(|e| e.process == PRIMARY_PROCESS);
    entries.into_iter().nth(web.unwrap_or(0))
}

// ── Unit tests ───────────────────────────────────────────────────────────────

//! Application service: the agent injection pipeline.
//!
//! `Start → Resolve → {Unconfigured: Done} | {Configured: Fetch → Extract →
//! Rewrite → Done}`. Resolution problems degrade to "not configured"; any
//! failure after that aborts the pipeline with an `InjectError`.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::PathBuf;
use std::time::Duration;

use crate::application::ports::{
    ArchiveExtractor, DownloadRequest, Downloader, EnvironmentWriter, LaunchCommandStore,
    ProgressReporter, Sleeper,
};
use crate::application::services::fetch::fetch_with_retry;
use crate::domain::command;
use crate::domain::config::{self, ResolvedConfig};
use crate::domain::InjectError;

/// Filesystem layout and retry budget for one build.
#[derive(Debug, Clone)]
pub struct InjectSettings {
    /// Where the agent is unpacked during staging, e.g. `<build>/sealights`.
    pub install_dir: PathBuf,
    /// Where the downloaded archive is written.
    pub archive_path: PathBuf,
    /// Agent directory as seen by the launched process, e.g. `${HOME}/sealights`.
    pub runtime_agent_dir: String,
    /// Working directory passed to the agent, e.g. `${HOME}`.
    pub runtime_working_dir: String,
    /// Download attempts before giving up.
    pub max_retries: u32,
    /// Fixed part of the retry backoff.
    pub base_wait: Duration,
}

/// Result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectOutcome {
    /// No Sealights binding; nothing was downloaded or modified.
    NotConfigured,
    /// The agent was installed and the launch command rewritten.
    Injected {
        /// The new launch command.
        command: String,
    },
}

/// The injection pipeline, constructed explicitly by the host.
pub struct InjectionPipeline<'a> {
    pub downloader: &'a dyn Downloader,
    pub sleeper: &'a dyn Sleeper,
    pub extractor: &'a dyn ArchiveExtractor,
    pub launch: &'a dyn LaunchCommandStore,
    pub environment: &'a dyn EnvironmentWriter,
    pub reporter: &'a dyn ProgressReporter,
    pub settings: InjectSettings,
}

impl InjectionPipeline<'_> {
    /// Run every stage.
    ///
    /// # Errors
    ///
    /// Returns `InjectError` when fetching, extracting, or rewriting fails
    /// after a Sealights binding was found.
    pub fn run(
        &self,
        bindings: &str,
        tool_name: impl FnOnce() -> String,
    ) -> Result<InjectOutcome, InjectError> {
        tracing::debug!("Sealights. Check service status...");

        let Some(config) = self.resolve(bindings, tool_name) else {
            tracing::debug!("Sealights service isn't configured");
            return Ok(InjectOutcome::NotConfigured);
        };

        self.install(&config)?;
        let command = self.rewrite(&config)?;

        self.reporter.success("Sealights. Service is set up");
        Ok(InjectOutcome::Injected { command })
    }

    /// Resolve the configuration and report advisory warnings.
    #[must_use]
    pub fn resolve(
        &self,
        bindings: &str,
        tool_name: impl FnOnce() -> String,
    ) -> Option<ResolvedConfig> {
        let config = config::resolve(bindings, tool_name)?;
        self.reporter.step("Sealights. Service enabled");
        for warning in config.warnings() {
            self.reporter.warn(&warning.to_string());
        }
        Some(config)
    }

    /// Download the agent archive and unpack it into the install directory.
    ///
    /// # Errors
    ///
    /// Returns `InjectError::Fetch` once every download attempt failed, or
    /// `InjectError::Extract` when the archive cannot be unpacked.
    pub fn install(&self, config: &ResolvedConfig) -> Result<(), InjectError> {
        let url = config.download_url();
        let proxy = config.proxy_settings();
        let settings = &self.settings;

        tracing::info!(%url, dest = %settings.archive_path.display(), "Sealights. Download package started");
        let request = DownloadRequest {
            url: &url,
            dest: &settings.archive_path,
            proxy: proxy.as_ref(),
        };
        fetch_with_retry(
            self.downloader,
            self.sleeper,
            &request,
            settings.max_retries,
            settings.base_wait,
        )?;

        tracing::info!(
            archive = %settings.archive_path.display(),
            target = %settings.install_dir.display(),
            "Sealights. Extract package"
        );
        self.extractor
            .extract(&settings.archive_path, &settings.install_dir)?;

        self.reporter.success("Sealights. Agent installed");
        Ok(())
    }

    /// Wrap the primary launch command with the agent and persist it.
    ///
    /// # Errors
    ///
    /// Returns `InjectError::Rewrite` when the command lacks its marker, and
    /// `InjectError::LaunchFile`/`Environment` on persistence failures. The
    /// environment is written before the launch command, so a failure leaves
    /// the launch command untouched.
    pub fn rewrite(&self, config: &ResolvedConfig) -> Result<String, InjectError> {
        let settings = &self.settings;
        let original = self.launch.load().map_err(InjectError::LaunchFile)?;

        let command = command::rewrite(
            &original.command,
            original.marker,
            config,
            &settings.runtime_agent_dir,
            &settings.runtime_working_dir,
        )?;

        // the launch file is the commit point: nothing after it may fail
        if !config.environment.is_empty() {
            self.environment
                .write_environment(&config.environment)
                .map_err(InjectError::Environment)?;
        }

        self.launch.save(&command).map_err(InjectError::LaunchFile)?;
        tracing::debug!(%command, "Sealights. New start command");
        self.reporter.step("Sealights. Start command updated");

        Ok(command)
    }
}

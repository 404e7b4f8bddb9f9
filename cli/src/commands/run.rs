//! Run command: install the agent and wrap the application's launch command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Args;

use crate::application::ports::{DownloadRequest, Downloader, ProgressReporter};
use crate::application::{InjectOutcome, InjectSettings, InjectionPipeline};
use crate::commands::BindingsArgs;
use crate::domain::FetchError;
use crate::domain::config;
use crate::domain::retry::{BASE_WAIT, DEFAULT_MAX_RETRIES};
use crate::infra::archive::TarGzExtractor;
use crate::infra::clock::ThreadSleeper;
use crate::infra::http::UreqDownloader;
use crate::infra::launch_file::{LaunchFile, LaunchFormat, LaunchLocator};
use crate::infra::profile::ProfileScript;
use crate::output::{OutputContext, TerminalReporter, progress};

/// Directory the agent is unpacked into, relative to the application root.
const AGENT_DIR: &str = "sealights";
/// File name of the downloaded agent archive.
const ARCHIVE_NAME: &str = "sealights-agent.tar.gz";

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Application build directory being staged
    #[arg(long, env = "BUILD_DIR")]
    pub build_dir: PathBuf,

    #[command(flatten)]
    pub bindings: BindingsArgs,

    /// Launch-command file (detected in the build directory when omitted)
    #[arg(long)]
    pub launch_file: Option<PathBuf>,

    /// Layout of --launch-file: release, procfile or manifest
    #[arg(long, requires = "launch_file")]
    pub format: Option<LaunchFormat>,

    /// Application language reported after setup
    #[arg(long, default_value = "dotnet-core")]
    pub language: String,

    /// Application root as seen by the running process
    #[arg(long, default_value = "${HOME}")]
    pub app_dir: String,

    /// Directory for the downloaded archive (system temp dir when omitted)
    #[arg(long)]
    pub download_dir: Option<PathBuf>,

    /// Download attempts before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Per-attempt download timeout in seconds
    #[arg(long, default_value_t = 300)]
    pub timeout_secs: u64,

    #[arg(long, hide = true, default_value_t = BASE_WAIT.as_secs())]
    pub retry_base_secs: u64,
}

impl RunArgs {
    fn settings(&self) -> InjectSettings {
        let download_dir = self
            .download_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        InjectSettings {
            install_dir: self.build_dir.join(AGENT_DIR),
            archive_path: download_dir.join(ARCHIVE_NAME),
            runtime_agent_dir: format!("{}/{AGENT_DIR}", self.app_dir),
            runtime_working_dir: self.app_dir.clone(),
            max_retries: self.max_retries,
            base_wait: Duration::from_secs(self.retry_base_secs),
        }
    }

    fn launch(&self) -> LaunchLocator {
        let explicit = self.launch_file.as_ref().map(|path| {
            let format = self
                .format
                .unwrap_or_else(|| LaunchFormat::from_path(path));
            LaunchFile::new(path.clone(), format)
        });
        LaunchLocator::new(self.build_dir.clone(), explicit)
    }
}

/// Entry point for `sl-inject run`.
///
/// # Errors
///
/// Returns an error once a Sealights binding was found and downloading,
/// unpacking, or rewriting the launch command fails.
pub fn run(ctx: &OutputContext, args: &RunArgs) -> Result<()> {
    let reporter = TerminalReporter::new(ctx);
    let downloader = SpinnerDownloader {
        inner: UreqDownloader::new(Duration::from_secs(args.timeout_secs)),
        ctx,
    };
    let launch = args.launch();
    let environment = ProfileScript::in_build_dir(&args.build_dir);

    let pipeline = InjectionPipeline {
        downloader: &downloader,
        sleeper: &ThreadSleeper,
        extractor: &TarGzExtractor,
        launch: &launch,
        environment: &environment,
        reporter: &reporter,
        settings: args.settings(),
    };

    let version = args.bindings.buildpack_version.as_deref();
    let tool_name = || {
        if version.is_none() {
            reporter.warn("Failed to get buildpack version");
        }
        config::tool_name(version)
    };

    match pipeline.run(args.bindings.document(), tool_name)? {
        InjectOutcome::NotConfigured => {}
        InjectOutcome::Injected { .. } => {
            reporter.step(&format!(
                "Sealights. Language: {}. Buildpack version: {}.",
                args.language,
                version.unwrap_or("unknown")
            ));
        }
    }
    Ok(())
}

/// Shows a spinner for the duration of each download attempt on a TTY.
struct SpinnerDownloader<'a, D> {
    inner: D,
    ctx: &'a OutputContext,
}

impl<D: Downloader> Downloader for SpinnerDownloader<'_, D> {
    fn download(&self, request: &DownloadRequest<'_>) -> Result<(), FetchError> {
        if !self.ctx.show_progress() {
            return self.inner.download(request);
        }
        let pb = progress::spinner("Sealights. Downloading agent...");
        let result = self.inner.download(request);
        pb.finish_and_clear();
        result
    }
}

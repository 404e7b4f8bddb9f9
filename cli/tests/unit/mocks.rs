//! Shared mock ports for unit tests.
//!
//! Each mock records what the pipeline asked of it so tests can assert on
//! call counts and arguments without touching the network.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use sealights_inject::application::ports::{
    ArchiveExtractor, DownloadRequest, Downloader, EnvironmentWriter, LaunchCommandStore,
    ProgressReporter, Sleeper, StoredCommand,
};
use sealights_inject::application::{InjectSettings, InjectionPipeline};
use sealights_inject::domain::{ExtractError, FetchError, Marker};

// ── Downloader ────────────────────────────────────────────────────────────────

/// Fails the first `failures` attempts with HTTP 503, then succeeds.
#[derive(Default)]
pub struct CountingDownloader {
    pub failures: u32,
    pub calls: Cell<u32>,
    pub urls: RefCell<Vec<String>>,
    pub proxies: RefCell<Vec<Option<String>>>,
}

impl CountingDownloader {
    pub fn failing(failures: u32) -> Self {
        Self {
            failures,
            ..Self::default()
        }
    }
}

impl Downloader for CountingDownloader {
    fn download(&self, request: &DownloadRequest<'_>) -> Result<(), FetchError> {
        let attempt = self.calls.get();
        self.calls.set(attempt + 1);
        self.urls.borrow_mut().push(request.url.to_string());
        self.proxies
            .borrow_mut()
            .push(request.proxy.map(|p| p.url.clone()));
        if attempt < self.failures {
            return Err(FetchError::Status {
                url: request.url.to_string(),
                status: 503,
            });
        }
        Ok(())
    }
}

// ── Sleeper ───────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSleeper {
    pub waits: RefCell<Vec<Duration>>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.waits.borrow_mut().push(duration);
    }
}

// ── Extractor ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingExtractor {
    pub fail: bool,
    pub calls: RefCell<Vec<(PathBuf, PathBuf)>>,
}

impl ArchiveExtractor for RecordingExtractor {
    fn extract(&self, archive: &Path, target: &Path) -> Result<(), ExtractError> {
        self.calls
            .borrow_mut()
            .push((archive.to_path_buf(), target.to_path_buf()));
        if self.fail {
            return Err(ExtractError::Unpack {
                archive: archive.to_path_buf(),
                target: target.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, "corrupt gzip"),
            });
        }
        Ok(())
    }
}

// ── Launch command ────────────────────────────────────────────────────────────

/// In-memory launch command. `loads` counts reads so tests can prove an
/// unconfigured build never looked at it.
pub struct MemoryLaunch {
    pub command: RefCell<String>,
    pub marker: Marker,
    pub loads: Cell<u32>,
}

impl MemoryLaunch {
    pub fn new(command: &str, marker: Marker) -> Self {
        Self {
            command: RefCell::new(command.to_string()),
            marker,
            loads: Cell::new(0),
        }
    }

    pub fn current(&self) -> String {
        self.command.borrow().clone()
    }
}

impl LaunchCommandStore for MemoryLaunch {
    fn load(&self) -> Result<StoredCommand> {
        self.loads.set(self.loads.get() + 1);
        Ok(StoredCommand {
            command: self.current(),
            marker: self.marker,
        })
    }

    fn save(&self, command: &str) -> Result<()> {
        *self.command.borrow_mut() = command.to_string();
        Ok(())
    }
}

// ── Environment ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingEnvironment {
    pub fail: bool,
    pub written: RefCell<Option<BTreeMap<String, String>>>,
}

impl EnvironmentWriter for RecordingEnvironment {
    fn write_environment(&self, environment: &BTreeMap<String, String>) -> Result<()> {
        if self.fail {
            anyhow::bail!("disk full");
        }
        *self.written.borrow_mut() = Some(environment.clone());
        Ok(())
    }
}

// ── Reporter ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    pub lines: RefCell<Vec<String>>,
}

impl RecordingReporter {
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|l| l.contains(needle))
    }

    pub fn warnings(&self) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter_map(|l| l.strip_prefix("warn: ").map(str::to_string))
            .collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.lines.borrow_mut().push(format!("step: {message}"));
    }

    fn success(&self, message: &str) {
        self.lines.borrow_mut().push(format!("ok: {message}"));
    }

    fn warn(&self, message: &str) {
        self.lines.borrow_mut().push(format!("warn: {message}"));
    }
}

// ── Harness ───────────────────────────────────────────────────────────────────

/// All mock ports for one pipeline run.
pub struct Harness {
    pub downloader: CountingDownloader,
    pub sleeper: RecordingSleeper,
    pub extractor: RecordingExtractor,
    pub launch: MemoryLaunch,
    pub environment: RecordingEnvironment,
    pub reporter: RecordingReporter,
}

impl Harness {
    pub fn new(command: &str, marker: Marker) -> Self {
        Self {
            downloader: CountingDownloader::default(),
            sleeper: RecordingSleeper::default(),
            extractor: RecordingExtractor::default(),
            launch: MemoryLaunch::new(command, marker),
            environment: RecordingEnvironment::default(),
            reporter: RecordingReporter::default(),
        }
    }

    pub fn pipeline(&self) -> InjectionPipeline<'_> {
        InjectionPipeline {
            downloader: &self.downloader,
            sleeper: &self.sleeper,
            extractor: &self.extractor,
            launch: &self.launch,
            environment: &self.environment,
            reporter: &self.reporter,
            settings: settings(),
        }
    }
}

pub fn settings() -> InjectSettings {
    InjectSettings {
        install_dir: PathBuf::from("/tmp/app/sealights"),
        archive_path: PathBuf::from("/tmp/sealights-agent.tar.gz"),
        runtime_agent_dir: "${HOME}/sealights".to_string(),
        runtime_working_dir: "${HOME}".to_string(),
        max_retries: 3,
        base_wait: Duration::from_secs(3),
    }
}

/// A `VCAP_SERVICES` document with one user-provided Sealights binding.
pub fn bindings(credentials: &str) -> String {
    format!(
        r#"{{"user-provided":[{{"name":"sealights-dotnet","credentials":{credentials}}}]}}"#
    )
}

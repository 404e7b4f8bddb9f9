//! HTTP infrastructure: implements `Downloader` with a blocking `ureq` agent.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use crate::application::ports::{DownloadRequest, Downloader};
use crate::domain::{FetchError, ProxySettings};

/// Per-attempt wall-clock cap used when the caller does not choose one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Production `Downloader`: one GET per call, body streamed to disk.
pub struct UreqDownloader {
    timeout: Duration,
}

impl UreqDownloader {
    /// Create a downloader whose attempts give up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for UreqDownloader {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Downloader for UreqDownloader {
    fn download(&self, request: &DownloadRequest<'_>) -> Result<(), FetchError> {
        let url = request.url;
        let transport = |reason: String| FetchError::Transport {
            url: url.to_string(),
            reason,
        };

        let mut builder = ureq::AgentBuilder::new().timeout(self.timeout);
        if let Some(proxy) = request.proxy {
            let proxy = ureq::Proxy::new(proxy_url(proxy))
                .map_err(|e| transport(format!("invalid proxy: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let response = match builder.build().get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status,
                });
            }
            Err(ureq::Error::Transport(e)) => return Err(transport(e.to_string())),
        };

        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        write_body(response.into_reader(), url, request.dest)
    }
}

/// Stream `body` into `dest`, creating parent directories and truncating any
/// existing file.
fn write_body(mut body: impl Read, url: &str, dest: &Path) -> Result<(), FetchError> {
    let write_err = |source| FetchError::Write {
        path: dest.to_path_buf(),
        source,
    };

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let mut file = File::create(dest).map_err(write_err)?;

    let mut buf = vec![0u8; 65536];
    loop {
        let n = body.read(&mut buf).map_err(|e| FetchError::Transport {
            url: url.to_string(),
            reason: format!("reading response body: {e}"),
        })?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_err)?;
    }
    file.flush().map_err(write_err)
}

/// Proxy URL with credentials embedded, as `ureq::Proxy` expects.
///
/// Credentials stay raw: `ureq` takes the userinfo up to the last `@`, splits
/// it on the first `:`, and sends both halves verbatim in the Basic
/// `Proxy-Authorization` header. Percent-encoding would change the password.
pub(crate) fn proxy_url(proxy: &ProxySettings) -> String {
    let Some(user) = &proxy.username else {
        return proxy.url.clone();
    };
    let (scheme, rest) = proxy
        .url
        .split_once("://")
        .unwrap_or(("http", proxy.url.as_str()));
    // ureq rejects userinfo without a ':'
    let password = proxy.password.as_deref().unwrap_or_default();
    format!("{scheme}://{user}:{password}@{rest}")
}

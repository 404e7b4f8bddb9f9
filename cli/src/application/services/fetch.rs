//! Application service: download with bounded exponential backoff.

use std::time::Duration;

use crate::application::ports::{DownloadRequest, Downloader, Sleeper};
use crate::domain::FetchError;
use crate::domain::retry::backoff_delay;

/// Download `request`, retrying every failure up to `max_retries` attempts in
/// total.
///
/// Waits `base_wait + 2^i` seconds before retry `i`; no wait follows the
/// final attempt. A `max_retries` of zero still makes one attempt.
///
/// # Errors
///
/// Returns the last `FetchError` once every attempt has failed.
pub fn fetch_with_retry(
    downloader: &(impl Downloader + ?Sized),
    sleeper: &(impl Sleeper + ?Sized),
    request: &DownloadRequest<'_>,
    max_retries: u32,
    base_wait: Duration,
) -> Result<(), FetchError> {
    let attempts = max_retries.max(1);
    let mut attempt = 0;
    loop {
        match downloader.download(request) {
            Ok(()) => {
                tracing::debug!(url = request.url, attempt, "Sealights. Download finished");
                return Ok(());
            }
            Err(e) if attempt + 1 >= attempts => {
                tracing::debug!(url = request.url, attempt, error = %e, "Sealights. Download failed, giving up");
                return Err(e);
            }
            Err(e) => {
                let wait = backoff_delay(base_wait, attempt);
                tracing::debug!(
                    url = request.url,
                    attempt,
                    wait_secs = wait.as_secs(),
                    error = %e,
                    "Sealights. Download failed, retrying"
                );
                sleeper.sleep(wait);
                attempt += 1;
            }
        }
    }
}

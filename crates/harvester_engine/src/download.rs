use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use harvest_logging::{harvest_debug, harvest_info, harvest_warn};
use harvester_core::DownloadOutcome;
use reqwest::StatusCode;

use crate::persist::PartialFile;
use crate::signature::{ContentSniffer, ContentVerdict};

#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Receives per-chunk progress as a fraction of the declared content length.
pub trait ProgressSink: Send + Sync {
    fn advance(&self, fraction: f64);
}

/// Sink that drops every tick.
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn advance(&self, _fraction: f64) {}
}

#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    /// Streams `url` into `destination`. Never leaves a partial destination
    /// behind for a non-success outcome.
    async fn download(
        &self,
        url: &str,
        destination: &Path,
        sink: &dyn ProgressSink,
    ) -> DownloadOutcome;
}

#[derive(Debug, Clone)]
pub struct StreamDownloader {
    settings: DownloadSettings,
}

enum TransferFailure {
    Quota,
    Transport(String),
}

impl From<crate::PersistError> for TransferFailure {
    fn from(err: crate::PersistError) -> Self {
        TransferFailure::Transport(err.to_string())
    }
}

impl StreamDownloader {
    pub fn new(settings: DownloadSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, TransferFailure> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|err| TransferFailure::Transport(err.to_string()))
    }

    async fn transfer(
        &self,
        url: &str,
        destination: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<u64, TransferFailure> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| TransferFailure::Transport(format!("invalid url: {err}")))?;
        let mut partial = PartialFile::create(destination)?;
        let client = self.build_client()?;

        let response = client
            .get(parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TransferFailure::Quota);
        }
        if !status.is_success() {
            return Err(TransferFailure::Transport(format!(
                "http status {}",
                status.as_u16()
            )));
        }

        let total = response.content_length().filter(|len| *len > 0);
        let mut sniffer = ContentSniffer::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            if sniffer.inspect(&chunk) == ContentVerdict::MarkupInterstitial {
                return Err(TransferFailure::Quota);
            }
            partial.write_chunk(&chunk)?;
            if let Some(total) = total {
                sink.advance(chunk.len() as f64 / total as f64);
            }
        }

        let written = partial.bytes_written();
        if written == 0 {
            return Err(TransferFailure::Transport("empty response body".into()));
        }
        partial.commit()?;
        Ok(written)
    }
}

impl Default for StreamDownloader {
    fn default() -> Self {
        Self::new(DownloadSettings::default())
    }
}

#[async_trait::async_trait]
impl Downloader for StreamDownloader {
    async fn download(
        &self,
        url: &str,
        destination: &Path,
        sink: &dyn ProgressSink,
    ) -> DownloadOutcome {
        harvest_debug!("Downloading {} -> {:?}", url, destination);
        match self.transfer(url, destination, sink).await {
            Ok(bytes_written) => {
                harvest_info!("Saved {:?} ({} bytes)", destination, bytes_written);
                DownloadOutcome::Success { bytes_written }
            }
            Err(TransferFailure::Quota) => {
                harvest_warn!("Quota interstitial returned for {}", url);
                discard_stale(destination);
                DownloadOutcome::QuotaExceeded
            }
            Err(TransferFailure::Transport(cause)) => {
                harvest_warn!("Transfer of {} failed: {}", url, cause);
                discard_stale(destination);
                DownloadOutcome::TransportError(cause)
            }
        }
    }
}

/// A failed attempt leaves no file at the destination, not even one from an
/// earlier run, so later steps see the item as missing.
fn discard_stale(destination: &Path) {
    match std::fs::remove_file(destination) {
        Ok(()) => harvest_debug!("Removed stale {:?}", destination),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => harvest_warn!("Could not remove {:?}: {}", destination, err),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransferFailure {
    if err.is_timeout() {
        return TransferFailure::Transport(format!("timeout: {err}"));
    }
    TransferFailure::Transport(err.to_string())
}

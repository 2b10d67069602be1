//! Media download service.
//!
//! Streams one remote file to disk at a time, reporting progress through a
//! [`ProgressObserver`]. The body is written to `<destination>.part` and
//! renamed into place once complete, so a destination path only ever holds
//! a finished file.
//!
//! Partial files: a failed transfer removes its `.part` file. A transfer
//! interrupted by dropping its future (Ctrl-C) leaves the `.part` file
//! behind; it is never resumed, the next attempt starts from zero.

mod types;

pub use types::{
    DownloadEvent, DownloadSummary, DownloadTarget, EventLog, NoProgress, ProgressObserver,
    MEDIA_EXTENSION, PART_SUFFIX,
};

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::{DownloadError, Result};
use crate::scrapers::{HttpClient, HttpResponse};

/// Write buffer size; media files are large.
const WRITE_BUFFER_BYTES: usize = 256 * 1024;

/// Streams media files to disk.
#[derive(Clone)]
pub struct MediaFetcher {
    client: HttpClient,
}

impl MediaFetcher {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Download `target`, retrying network failures per the client's policy.
    ///
    /// Returns the number of bytes written. `Completed` is only reported
    /// after the file is in place.
    pub async fn fetch(
        &self,
        target: &DownloadTarget,
        worker_id: usize,
        observer: &dyn ProgressObserver,
    ) -> Result<u64> {
        let bytes = self
            .client
            .retry_policy()
            .run(&target.source_url, || self.transfer(target, worker_id, observer))
            .await?;

        observer.notify(DownloadEvent::Completed {
            worker_id,
            path: target.destination.clone(),
            bytes,
        });
        Ok(bytes)
    }

    async fn transfer(
        &self,
        target: &DownloadTarget,
        worker_id: usize,
        observer: &dyn ProgressObserver,
    ) -> Result<u64> {
        let mut response = self
            .client
            .get(&target.source_url)
            .await?
            .error_for_status()?;
        let total = response.content_length();
        if let Some(content_type) = response.content_type() {
            if content_type.starts_with("text/html") {
                tracing::warn!("{} is served as {}", target.source_url, content_type);
            }
        }

        observer.notify(DownloadEvent::Started {
            worker_id,
            filename: target.file_name(),
            total,
        });

        let part = target.part_path();
        let file = File::create(&part)
            .await
            .map_err(|e| DownloadError::filesystem(&part, e))?;
        let mut writer = BufWriter::with_capacity(WRITE_BUFFER_BYTES, file);

        let written = copy_body(&mut response, &mut writer, &part, worker_id, total, observer).await;
        drop(writer);

        let bytes = match written {
            Ok(bytes) => bytes,
            Err(e) => {
                discard_part(&part).await;
                return Err(e);
            }
        };

        if let Err(e) = tokio::fs::rename(&part, &target.destination).await {
            discard_part(&part).await;
            return Err(DownloadError::filesystem(&target.destination, e));
        }

        tracing::debug!(
            "Wrote {} bytes to {}",
            bytes,
            target.destination.display()
        );
        Ok(bytes)
    }
}

/// Copy the response body into `writer` chunk by chunk.
async fn copy_body(
    response: &mut HttpResponse,
    writer: &mut BufWriter<File>,
    part: &Path,
    worker_id: usize,
    total: Option<u64>,
    observer: &dyn ProgressObserver,
) -> Result<u64> {
    let mut received: u64 = 0;

    while let Some(chunk) = response.chunk().await? {
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::filesystem(part, e))?;
        received += chunk.len() as u64;
        observer.notify(DownloadEvent::Progress {
            worker_id,
            bytes: received,
            total,
        });
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::filesystem(part, e))?;
    writer
        .get_ref()
        .sync_all()
        .await
        .map_err(|e| DownloadError::filesystem(part, e))?;

    if let Some(expected) = total {
        if received < expected {
            return Err(DownloadError::network(
                &response.url,
                format!("truncated body: {} of {} bytes", received, expected),
            ));
        }
    }

    Ok(received)
}

async fn discard_part(part: &Path) {
    if let Err(e) = tokio::fs::remove_file(part).await {
        tracing::debug!("Could not remove {}: {}", part.display(), e);
    }
}

//! Drives a download run from a classified identifier to files on disk.
//!
//! A video ID is resolved and fetched into the output directory. A
//! collection ID is enumerated first, its directory is created once, and
//! its videos are then fetched by a bounded set of workers that pull from a
//! shared queue in listing order.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::Settings;
use crate::error::{DownloadError, Result};
use crate::identifier::{CollectionId, Identifier, VideoId};
use crate::scrapers::{ArchiveScraper, HttpClient, Locators, PageSource};
use crate::services::download::{
    DownloadEvent, DownloadSummary, DownloadTarget, MediaFetcher, ProgressObserver,
};

/// What happens to the rest of a collection when one video fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failure and report it.
    #[default]
    Abort,
    /// Log the failure and keep going; the run still fails at the end.
    Continue,
}

impl FailurePolicy {
    pub fn from_keep_going(keep_going: bool) -> Self {
        if keep_going {
            Self::Continue
        } else {
            Self::Abort
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Directory the files were written to.
    pub directory: PathBuf,
    pub summary: DownloadSummary,
}

/// Listing position that last wrote a destination.
type DestinationGate = Arc<tokio::sync::Mutex<Option<usize>>>;

/// One gate per destination path; entries that share a file name are
/// written one at a time.
#[derive(Default)]
struct DestinationLocks {
    gates: Mutex<HashMap<PathBuf, DestinationGate>>,
}

impl DestinationLocks {
    fn gate(&self, destination: &Path) -> DestinationGate {
        let mut gates = self.gates.lock().unwrap_or_else(|e| e.into_inner());
        gates.entry(destination.to_path_buf()).or_default().clone()
    }
}

/// Shared state of the collection workers.
struct WorkQueue {
    pending: Mutex<VecDeque<(usize, VideoId)>>,
    stop: AtomicBool,
    destinations: DestinationLocks,
    /// Failures as (listing position, error).
    failures: Mutex<Vec<(usize, DownloadError)>>,
    summary: Mutex<DownloadSummary>,
}

impl WorkQueue {
    fn new(videos: &[VideoId]) -> Self {
        Self {
            pending: Mutex::new(videos.iter().cloned().enumerate().collect()),
            stop: AtomicBool::new(false),
            destinations: DestinationLocks::default(),
            failures: Mutex::new(Vec::new()),
            summary: Mutex::new(DownloadSummary::default()),
        }
    }

    fn claim(&self) -> Option<(usize, VideoId)> {
        if self.stop.load(Ordering::SeqCst) {
            return None;
        }
        self.pending.lock().ok()?.pop_front()
    }

    fn record_success(&self, bytes: u64) {
        if let Ok(mut summary) = self.summary.lock() {
            summary.downloaded += 1;
            summary.bytes += bytes;
        }
    }

    fn record_failure(&self, position: usize, error: DownloadError) {
        if let Ok(mut summary) = self.summary.lock() {
            summary.failed += 1;
        }
        if let Ok(mut failures) = self.failures.lock() {
            failures.push((position, error));
        }
    }

    fn into_parts(self) -> (DownloadSummary, Vec<(usize, DownloadError)>) {
        let summary = self.summary.into_inner().unwrap_or_default();
        let mut failures = self.failures.into_inner().unwrap_or_default();
        failures.sort_by_key(|(position, _)| *position);
        (summary, failures)
    }
}

/// Runs downloads for one identifier.
pub struct Orchestrator<S = HttpClient> {
    scraper: ArchiveScraper<S>,
    fetcher: MediaFetcher,
    policy: FailurePolicy,
    jobs: usize,
    output_dir: PathBuf,
}

impl Orchestrator<HttpClient> {
    /// Build an orchestrator that reads pages and media over HTTP.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let client = HttpClient::new(settings)?;
        let locators = Locators::from_config(&settings.locators)?;
        let scraper = ArchiveScraper::new(client.clone(), locators, settings.clone());
        Ok(Self::new(scraper, MediaFetcher::new(client), settings))
    }
}

impl<S: PageSource> Orchestrator<S> {
    pub fn new(scraper: ArchiveScraper<S>, fetcher: MediaFetcher, settings: &Settings) -> Self {
        Self {
            scraper,
            fetcher,
            policy: FailurePolicy::from_keep_going(settings.keep_going),
            jobs: settings.jobs.max(1),
            output_dir: settings.output_dir.clone(),
        }
    }

    /// Download everything `id` refers to.
    pub async fn run(&self, id: &Identifier, observer: &dyn ProgressObserver) -> Result<RunReport> {
        match id {
            Identifier::Video(video) => {
                tokio::fs::create_dir_all(&self.output_dir)
                    .await
                    .map_err(|e| DownloadError::filesystem(&self.output_dir, e))?;
                observer.notify(DownloadEvent::Planned { total: 1 });
                let bytes = match self.download_video(video, &self.output_dir, 0, observer).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        notify_failure(observer, 0, video, &e);
                        return Err(e);
                    }
                };
                Ok(RunReport {
                    directory: self.output_dir.clone(),
                    summary: DownloadSummary {
                        downloaded: 1,
                        failed: 0,
                        bytes,
                    },
                })
            }
            Identifier::Collection(collection) => {
                self.download_collection(collection, observer).await
            }
        }
    }

    /// Resolve a video's title and fetch it into `dir`.
    pub async fn download_video(
        &self,
        video: &VideoId,
        dir: &Path,
        worker_id: usize,
        observer: &dyn ProgressObserver,
    ) -> Result<u64> {
        let target = self.target_for(video, dir).await?;
        self.fetcher.fetch(&target, worker_id, observer).await
    }

    async fn target_for(&self, video: &VideoId, dir: &Path) -> Result<DownloadTarget> {
        let info = self.scraper.resolve(video).await?;
        let target = DownloadTarget::for_video(&info, self.scraper.settings(), dir);
        tracing::info!(
            "Downloading {} \"{}\" to {}",
            video,
            info.title,
            target.destination.display()
        );
        Ok(target)
    }

    /// Download one collection entry.
    ///
    /// Entries sharing a destination never transfer concurrently, and the
    /// file ends up holding the latest entry in listing order, as it would
    /// with a single worker.
    async fn download_entry(
        &self,
        position: usize,
        video: &VideoId,
        dir: &Path,
        worker_id: usize,
        queue: &WorkQueue,
        observer: &dyn ProgressObserver,
    ) -> Result<u64> {
        let target = self.target_for(video, dir).await?;
        let gate = queue.destinations.gate(&target.destination);
        let mut written_by = gate.lock().await;

        if let Some(later) = *written_by {
            if later > position {
                tracing::info!(
                    "{} already holds listing entry {}, skipping {}",
                    target.destination.display(),
                    later + 1,
                    video
                );
                observer.notify(DownloadEvent::Completed {
                    worker_id,
                    path: target.destination.clone(),
                    bytes: 0,
                });
                return Ok(0);
            }
        }

        let bytes = self.fetcher.fetch(&target, worker_id, observer).await?;
        *written_by = Some(position);
        Ok(bytes)
    }

    /// Enumerate a collection and download its videos into its directory.
    pub async fn download_collection(
        &self,
        collection: &CollectionId,
        observer: &dyn ProgressObserver,
    ) -> Result<RunReport> {
        let listing = self.scraper.enumerate(collection).await?;
        let directory = self.output_dir.join(&listing.name);

        tokio::fs::create_dir_all(&directory)
            .await
            .map_err(|e| DownloadError::filesystem(&directory, e))?;

        let total = listing.video_ids.len();
        observer.notify(DownloadEvent::Planned { total });

        let queue = WorkQueue::new(&listing.video_ids);
        let workers = (0..self.jobs.min(total.max(1)))
            .map(|worker_id| self.worker(worker_id, &queue, &directory, observer));
        futures::future::join_all(workers).await;

        let (summary, failures) = queue.into_parts();
        tracing::info!(
            "Collection {}: {} downloaded, {} failed",
            collection,
            summary.downloaded,
            summary.failed
        );

        match self.policy {
            FailurePolicy::Abort => {
                if let Some((_, first)) = failures.into_iter().next() {
                    return Err(first);
                }
            }
            FailurePolicy::Continue => {
                if summary.failed > 0 {
                    return Err(DownloadError::PartialFailure {
                        failed: summary.failed,
                        total,
                    });
                }
            }
        }

        Ok(RunReport { directory, summary })
    }

    async fn worker(
        &self,
        worker_id: usize,
        queue: &WorkQueue,
        directory: &Path,
        observer: &dyn ProgressObserver,
    ) {
        while let Some((position, video)) = queue.claim() {
            match self
                .download_entry(position, &video, directory, worker_id, queue, observer)
                .await
            {
                Ok(bytes) => queue.record_success(bytes),
                Err(e) => {
                    notify_failure(observer, worker_id, &video, &e);
                    if self.policy == FailurePolicy::Abort {
                        queue.stop.store(true, Ordering::SeqCst);
                    } else {
                        tracing::warn!("Skipping {}: {}", video, e);
                    }
                    queue.record_failure(position, e);
                }
            }
        }
    }
}

fn notify_failure(
    observer: &dyn ProgressObserver,
    worker_id: usize,
    video: &VideoId,
    error: &DownloadError,
) {
    observer.notify(DownloadEvent::Failed {
        worker_id,
        video_id: video.to_string(),
        error: error.to_string(),
    });
}

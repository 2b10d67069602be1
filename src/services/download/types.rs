//! Download targets, progress events and run summaries.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::Settings;
use crate::scrapers::VideoInfo;
use crate::utils::segment_or;

/// Extension of finished media files.
pub const MEDIA_EXTENSION: &str = "mp4";

/// Suffix of a file still being written.
pub const PART_SUFFIX: &str = ".part";

/// Events emitted while a run progresses.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    /// Number of videos the run will attempt
    Planned { total: usize },
    /// Transfer started; `total` comes from Content-Length
    Started {
        worker_id: usize,
        filename: String,
        total: Option<u64>,
    },
    /// Bytes received so far
    Progress {
        worker_id: usize,
        bytes: u64,
        total: Option<u64>,
    },
    /// File fully written and moved into place
    Completed {
        worker_id: usize,
        path: PathBuf,
        bytes: u64,
    },
    /// A video could not be downloaded
    Failed {
        worker_id: usize,
        video_id: String,
        error: String,
    },
}

/// Receives progress events. Passed explicitly into each download.
pub trait ProgressObserver: Send + Sync {
    fn notify(&self, event: DownloadEvent);
}

/// Observer that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn notify(&self, _event: DownloadEvent) {}
}

/// Observer that keeps every event, for inspection after a run.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<DownloadEvent>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<DownloadEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl ProgressObserver for EventLog {
    fn notify(&self, event: DownloadEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Where one video comes from and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub source_url: String,
    pub destination: PathBuf,
    /// Title before sanitizing.
    pub display_name: String,
}

impl DownloadTarget {
    /// Target for a resolved video inside `dir`, named after its title.
    pub fn for_video(info: &VideoInfo, settings: &Settings, dir: &Path) -> Self {
        let stem = segment_or(&info.title, info.id.as_str());
        Self {
            source_url: settings.media_file_url(info.id.as_str()),
            destination: dir.join(format!("{}.{}", stem, MEDIA_EXTENSION)),
            display_name: info.title.clone(),
        }
    }

    /// File name shown in progress output.
    pub fn file_name(&self) -> String {
        self.destination
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.display_name.clone())
    }

    /// Temporary path the transfer is written to.
    pub fn part_path(&self) -> PathBuf {
        let mut path = self.destination.clone().into_os_string();
        path.push(PART_SUFFIX);
        PathBuf::from(path)
    }
}

/// Totals for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub failed: usize,
    pub bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(id: &str, title: &str) -> VideoInfo {
        VideoInfo {
            id: id.parse().unwrap(),
            title: title.to_string(),
        }
    }

    #[test]
    fn test_target_for_video() {
        let target = DownloadTarget::for_video(
            &info("20200101", "A: Talk? Title"),
            &Settings::default(),
            Path::new("."),
        );
        assert_eq!(
            target.source_url,
            "http://streamer2.perimeterinstitute.ca/mp4-med/20200101.mp4"
        );
        assert_eq!(target.destination, PathBuf::from("./A-Talk-Title.mp4"));
        assert_eq!(target.display_name, "A: Talk? Title");
        assert_eq!(target.file_name(), "A-Talk-Title.mp4");
        assert_eq!(target.part_path(), PathBuf::from("./A-Talk-Title.mp4.part"));
    }

    #[test]
    fn test_target_falls_back_to_id() {
        let target = DownloadTarget::for_video(
            &info("20200101", "???"),
            &Settings::default(),
            Path::new("My-Series"),
        );
        assert_eq!(target.destination, PathBuf::from("My-Series/20200101.mp4"));
    }

    #[test]
    fn test_event_log_records_in_order() {
        let log = EventLog::default();
        log.notify(DownloadEvent::Planned { total: 2 });
        log.notify(DownloadEvent::Progress {
            worker_id: 0,
            bytes: 10,
            total: None,
        });
        assert_eq!(log.events().len(), 2);
        assert_eq!(log.events()[0], DownloadEvent::Planned { total: 2 });
    }
}

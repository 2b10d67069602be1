//! Multi-progress display for concurrent downloads.
//!
//! Also routes log output around the bars while a display is active.

use std::io::{self, Write};
use std::sync::{Mutex, OnceLock, RwLock};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use pirsa_dl::services::download::{DownloadEvent, ProgressObserver};
use pirsa_dl::utils::truncate_display_name;

/// Longest file name shown next to a bar.
const DISPLAY_NAME_CHARS: usize = 35;

/// Global reference to active progress display for coordinating output.
static ACTIVE_PROGRESS: OnceLock<RwLock<Option<MultiProgress>>> = OnceLock::new();

fn get_active_progress() -> &'static RwLock<Option<MultiProgress>> {
    ACTIVE_PROGRESS.get_or_init(|| RwLock::new(None))
}

/// Set the global active progress display.
pub fn set_active_progress(multi: Option<MultiProgress>) {
    if let Ok(mut guard) = get_active_progress().write() {
        *guard = multi;
    }
}

/// Print a message that coordinates with any active progress display.
/// Falls back to println! if no progress display is active.
pub fn progress_println(message: &str) {
    if let Ok(guard) = get_active_progress().read() {
        if let Some(ref multi) = *guard {
            let _ = multi.println(message);
            return;
        }
    }
    println!("{}", message);
}

/// Stderr writer for log lines; hides the bars while a line is written.
pub struct LogWriter;

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(guard) = get_active_progress().read() {
            if let Some(ref multi) = *guard {
                return multi.suspend(|| io::stderr().write(buf));
            }
        }
        io::stderr().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  {spinner:.cyan} {wide_msg} [{bar:25.cyan/blue}] {bytes}/{total_bytes}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸─")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("  {spinner:.cyan} {wide_msg} {bytes}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn idle_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  {spinner:.dim} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// One bar per worker plus a summary bar for the whole run.
pub struct DownloadProgress {
    multi: MultiProgress,
    slots: Vec<ProgressBar>,
    summary_bar: ProgressBar,
    counts: Mutex<(usize, usize)>,
}

impl DownloadProgress {
    /// Create a display with one slot per worker.
    pub fn new(num_workers: usize) -> Self {
        let multi = MultiProgress::new();

        let summary_bar = multi.add(ProgressBar::new(0));
        summary_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        summary_bar.set_message("Resolving");

        let slots = (0..num_workers.max(1))
            .map(|_| {
                let bar = multi.add(ProgressBar::new(0));
                bar.set_style(idle_style());
                bar.set_message("idle");
                bar
            })
            .collect();

        set_active_progress(Some(multi.clone()));

        Self {
            multi,
            slots,
            summary_bar,
            counts: Mutex::new((0, 0)),
        }
    }

    fn slot(&self, worker_id: usize) -> Option<&ProgressBar> {
        self.slots.get(worker_id)
    }

    fn release(&self, worker_id: usize) {
        if let Some(bar) = self.slot(worker_id) {
            bar.disable_steady_tick();
            bar.set_style(idle_style());
            bar.set_message("idle");
            bar.set_length(0);
            bar.set_position(0);
        }
    }

    fn record(&self, success: bool) {
        if let Ok(mut counts) = self.counts.lock() {
            if success {
                counts.0 += 1;
            } else {
                counts.1 += 1;
            }
            self.summary_bar
                .set_message(format!("Downloaded: {} | Failed: {}", counts.0, counts.1));
        }
        self.summary_bar.inc(1);
    }

    /// Finish all progress bars and clear the display.
    pub fn finish(&self) {
        for bar in &self.slots {
            bar.finish_and_clear();
        }
        self.summary_bar.finish_and_clear();
        set_active_progress(None);
    }
}

impl ProgressObserver for DownloadProgress {
    fn notify(&self, event: DownloadEvent) {
        match event {
            DownloadEvent::Planned { total } => {
                self.summary_bar.set_length(total as u64);
                self.summary_bar.set_message("Downloading");
            }
            DownloadEvent::Started {
                worker_id,
                filename,
                total,
            } => {
                if let Some(bar) = self.slot(worker_id) {
                    bar.set_style(if total.is_some() {
                        bar_style()
                    } else {
                        spinner_style()
                    });
                    bar.set_length(total.unwrap_or(0));
                    bar.set_position(0);
                    bar.set_message(truncate_display_name(&filename, DISPLAY_NAME_CHARS));
                    bar.enable_steady_tick(std::time::Duration::from_millis(100));
                }
            }
            DownloadEvent::Progress {
                worker_id, bytes, ..
            } => {
                if let Some(bar) = self.slot(worker_id) {
                    bar.set_position(bytes);
                }
            }
            DownloadEvent::Completed { worker_id, .. } => {
                self.release(worker_id);
                self.record(true);
            }
            DownloadEvent::Failed {
                worker_id,
                video_id,
                error,
            } => {
                self.release(worker_id);
                self.record(false);
                let _ = self
                    .multi
                    .println(format!("  {} {}: {}", console::style("✗").red(), video_id, error));
            }
        }
    }
}

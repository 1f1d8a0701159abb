//! Operator-facing progress for a fetch
//!
//! Pipeline milestones become numbered step lines on stdout. Download
//! progress drives an `indicatif` bar on stderr when it is a terminal;
//! otherwise a count line is printed at each reporting boundary.

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tracing::debug;

use crate::app::coordinator::PipelineEvent;
use crate::app::worker::DownloadProgress;

/// How progress is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressConfig {
    /// Suppress step lines and the bar
    pub quiet: bool,
    /// Draw an animated bar instead of count lines
    pub enable_progress_bar: bool,
}

impl ProgressConfig {
    /// Bar only when stderr is a terminal and output is not quiet
    pub fn detect(quiet: bool) -> Self {
        Self {
            quiet,
            enable_progress_bar: !quiet && atty::is(atty::Stream::Stderr),
        }
    }
}

/// Renders [`PipelineEvent`]s for the operator
#[derive(Debug)]
pub struct ProgressDisplay {
    config: ProgressConfig,
    bar: Option<ProgressBar>,
}

impl ProgressDisplay {
    pub fn new(config: ProgressConfig) -> Self {
        Self { config, bar: None }
    }

    /// Render events until the sender side closes
    pub async fn consume(mut self, mut events: mpsc::Receiver<PipelineEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(&event);
        }
        self.finish();
    }

    pub fn handle(&mut self, event: &PipelineEvent) {
        if let PipelineEvent::Download(progress) = event {
            self.download(progress);
            return;
        }
        if let Some(line) = step_line(event) {
            if !self.config.quiet {
                println!("{}", line);
            }
        }
    }

    fn download(&mut self, progress: &DownloadProgress) {
        if self.config.quiet {
            return;
        }

        if !self.config.enable_progress_bar {
            if progress.milestone {
                println!("   Downloaded: {}/{}", progress.completed, progress.total);
            }
            return;
        }

        let bar = self.bar.get_or_insert_with(|| new_bar(progress.total as u64));
        bar.set_position(progress.completed as u64);
        if progress.completed == progress.total {
            bar.finish_with_message("done");
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            if !bar.is_finished() {
                bar.abandon();
            }
        }
    }
}

fn new_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    match ProgressStyle::default_bar()
        .template("   {bar:40.cyan/blue} {pos}/{len} pages [{elapsed_precise}, ETA {eta}] {msg}")
    {
        Ok(style) => bar.set_style(style.progress_chars("=> ")),
        Err(e) => debug!("Progress bar template error: {}", e),
    }
    bar
}

/// Numbered step message for a milestone
pub fn step_line(event: &PipelineEvent) -> Option<String> {
    match event {
        PipelineEvent::WarmingUp => Some("1) Warming up session...".to_string()),
        PipelineEvent::WarmupFailed { reason } => {
            Some(format!("   Warm-up failed ({}), continuing", reason))
        }
        PipelineEvent::ResolvingManifest => Some("2) Fetching IIIF manifest...".to_string()),
        PipelineEvent::ManifestResolved { label, pages } => Some(match label {
            Some(label) => format!("   {}: {} pages", label, pages),
            None => format!("   Pages found: {}", pages),
        }),
        PipelineEvent::Planned {
            to_download,
            present,
        } => Some(if *present > 0 {
            format!(
                "3) Pages to download: {} ({} already present)",
                to_download, present
            )
        } else {
            format!("3) Pages to download: {}", to_download)
        }),
        PipelineEvent::Download(_) => None,
        PipelineEvent::Assembling { output } => {
            Some(format!("4) Creating PDF {} ...", output.display()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_step_lines_are_numbered() {
        assert_eq!(
            step_line(&PipelineEvent::WarmingUp).unwrap(),
            "1) Warming up session..."
        );
        assert!(step_line(&PipelineEvent::ResolvingManifest)
            .unwrap()
            .starts_with("2)"));
        assert_eq!(
            step_line(&PipelineEvent::Planned {
                to_download: 12,
                present: 0
            })
            .unwrap(),
            "3) Pages to download: 12"
        );
        assert!(step_line(&PipelineEvent::Assembling {
            output: PathBuf::from("x.pdf")
        })
        .unwrap()
        .contains("x.pdf"));
    }

    #[test]
    fn test_manifest_label_shown_when_present() {
        let line = step_line(&PipelineEvent::ManifestResolved {
            label: Some("Les Misérables".to_string()),
            pages: 410,
        })
        .unwrap();
        assert!(line.contains("Les Misérables"));
        assert!(line.contains("410"));
    }

    #[test]
    fn test_download_progress_has_no_step_line() {
        let progress = DownloadProgress {
            completed: 1,
            total: 2,
            milestone: false,
        };
        assert!(step_line(&PipelineEvent::Download(progress)).is_none());
    }

    #[tokio::test]
    async fn test_quiet_display_consumes_all_events() {
        let (tx, rx) = mpsc::channel(8);
        let display = ProgressDisplay::new(ProgressConfig {
            quiet: true,
            enable_progress_bar: false,
        });
        let handle = tokio::spawn(display.consume(rx));

        tx.send(PipelineEvent::WarmingUp).await.unwrap();
        tx.send(PipelineEvent::Download(DownloadProgress {
            completed: 1,
            total: 1,
            milestone: true,
        }))
        .await
        .unwrap();
        drop(tx);

        handle.await.unwrap();
    }
}

//! Progress display for parallel extraction

use apiscout_core::ChunkProgress;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress bar tracking chunk completion.
///
/// The dispatcher calls [`ExtractionProgress::update`] on its coordinating
/// task after each chunk; the bar only ever moves forward.
#[derive(Clone)]
pub struct ExtractionProgress {
    bar: ProgressBar,
}

impl ExtractionProgress {
    /// Create a bar drawing to stderr; its length is set by the first update.
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }

    /// A bar that never draws.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Record one finished chunk.
    pub fn update(&self, progress: &ChunkProgress) {
        if progress.attempt > 1 {
            self.bar.set_message(format!("retry {}/{}", progress.completed, progress.total));
            if progress.success {
                self.bar.println(format!(
                    "  {} chunk {} recovered on retry",
                    "✓".green(),
                    progress.chunk_id
                ));
            }
            return;
        }
        self.bar.set_length(progress.total as u64);
        self.bar.set_position(progress.completed as u64);
        if !progress.success {
            self.bar
                .println(format!("  {} chunk {} failed", "✗".red(), progress.chunk_id));
        }
    }

    /// Current position (completed chunks in the first pass).
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Total chunks in the first pass, once known.
    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }

    /// Remove the bar from the terminal.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

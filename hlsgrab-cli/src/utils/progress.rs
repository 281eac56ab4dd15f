use hlsgrab_engine::{OnSegmentProgress, OnSeriesProgress, SegmentProgress, SeriesProgress};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

fn download_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} {msg}\n[{elapsed_precise}] [{bar:40.green/white}] {pos:>3}%")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

/// Creates percentage bars and turns them into engine progress callbacks.
#[derive(Clone)]
pub struct ProgressManager {
    multi: MultiProgress,
    disabled: bool,
}

impl ProgressManager {
    pub fn new(multi: MultiProgress) -> Self {
        Self {
            multi,
            disabled: false,
        }
    }

    pub fn new_disabled(multi: MultiProgress) -> Self {
        Self {
            multi,
            disabled: true,
        }
    }

    #[inline]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn add_bar(&self, message: String) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new(100));
        bar.set_style(download_style());
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(500));
        bar
    }

    /// Callback driving one bar for a single playlist download.
    pub fn segment_callback(&self, name: &str) -> Option<OnSegmentProgress> {
        if self.disabled {
            return None;
        }

        let bar = self.add_bar(format!("Downloading {name}"));
        let name = name.to_string();
        Some(Arc::new(move |progress: SegmentProgress| {
            bar.set_position(u64::from(progress.percentage));
            if progress.completed == progress.total {
                bar.finish_with_message(format!("Finished {name}"));
            }
        }))
    }

    /// Callback driving one bar for a whole series; the message tracks the
    /// current item.
    pub fn series_callback(&self, base_name: &str) -> Option<OnSeriesProgress> {
        if self.disabled {
            return None;
        }

        let bar = self.add_bar(format!("Downloading {base_name}"));
        let base_name = base_name.to_string();
        Some(Arc::new(move |progress: SeriesProgress| {
            bar.set_message(format!(
                "{base_name} [{}/{}]",
                progress.item_index, progress.total_items
            ));
            bar.set_position(u64::from(progress.item_percentage));
            if progress.item_index == progress.total_items && progress.item_percentage == 100 {
                bar.finish_with_message(format!("Finished {base_name}"));
            }
        }))
    }
}

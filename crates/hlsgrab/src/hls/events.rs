use std::sync::Arc;

/// Progress of a single playlist download, reported after every completed segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentProgress {
    /// `round(completed / total * 100)`
    pub percentage: u8,
    pub completed: usize,
    pub total: usize,
}

impl SegmentProgress {
    pub fn new(completed: usize, total: usize) -> Self {
        Self {
            percentage: percentage(completed, total),
            completed,
            total,
        }
    }
}

/// Progress of a series download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesProgress {
    /// 1-based position of the item currently downloading
    pub item_index: usize,
    pub total_items: usize,
    pub item_percentage: u8,
}

/// A callback for per-segment progress updates.
pub type OnSegmentProgress = Arc<dyn Fn(SegmentProgress) + Send + Sync>;

/// A callback for series progress updates.
pub type OnSeriesProgress = Arc<dyn Fn(SeriesProgress) + Send + Sync>;

fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let completed = completed.min(total) as u64;
    let total = total as u64;
    // round half up
    ((completed * 200 + total) / (total * 2)) as u8
}

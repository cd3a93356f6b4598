//! # Grouping Module
//!
//! Splits a timeline of photos into candidate bursts.
//!
//! A photo joins the open group only if it is at most `max_gap` seconds after
//! the previous photo AND at most `time_window` seconds after the first one.
//! Both limits are enforced independently. Groups of one photo are dropped.
//!
//! Ties in capture time keep their input order.

use crate::core::media::{seconds_between, MediaItem};
use crate::error::ArgumentError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Time limits for a burst, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// Maximum span from the first to the last photo of a group
    pub time_window: f64,
    /// Maximum gap between consecutive photos of a group
    pub max_gap: f64,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            time_window: 3.0,
            max_gap: 2.0,
        }
    }
}

impl GroupingConfig {
    pub fn validate(&self) -> Result<(), ArgumentError> {
        if !(self.time_window.is_finite() && self.time_window > 0.0) {
            return Err(ArgumentError::InvalidConfig(format!(
                "time_window must be a positive number of seconds, got {}",
                self.time_window
            )));
        }
        if !(self.max_gap.is_finite() && self.max_gap > 0.0) {
            return Err(ArgumentError::InvalidConfig(format!(
                "max_gap must be a positive number of seconds, got {}",
                self.max_gap
            )));
        }
        Ok(())
    }
}

/// Two or more photos taken in quick succession, in capture order
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGroup {
    items: Vec<MediaItem>,
    capture_times: Vec<DateTime<Utc>>,
}

impl TimeGroup {
    /// Photos in capture order
    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    /// Capture times, parallel to [`TimeGroup::items`]
    pub fn capture_times(&self) -> &[DateTime<Utc>] {
        &self.capture_times
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.items.iter().map(|item| &item.path)
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.capture_times[0]
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.capture_times[self.capture_times.len() - 1]
    }

    pub fn duration(&self) -> Duration {
        self.end_time() - self.start_time()
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Consume the group, yielding its photos
    pub fn into_items(self) -> Vec<MediaItem> {
        self.items
    }
}

impl std::fmt::Display for TimeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TimeGroup({} photos, {:.1}s)",
            self.count(),
            seconds_between(self.start_time(), self.end_time())
        )
    }
}

/// Groups timestamped photos into bursts
#[derive(Debug, Clone)]
pub struct TimeWindowGrouper {
    config: GroupingConfig,
}

impl TimeWindowGrouper {
    pub fn new(config: GroupingConfig) -> Result<Self, ArgumentError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GroupingConfig {
        &self.config
    }

    /// Group items by capture time.
    ///
    /// Items without a capture time cannot be placed on the timeline and
    /// are left out.
    pub fn group(&self, items: Vec<MediaItem>) -> Vec<TimeGroup> {
        let total = items.len();
        let mut timed: Vec<(DateTime<Utc>, MediaItem)> = items
            .into_iter()
            .filter_map(|item| match item.capture_time {
                Some(time) => Some((time, item)),
                None => {
                    debug!(path = %item.path.display(), "No capture time, not grouped");
                    None
                }
            })
            .collect();

        // Stable: equal times keep input order
        timed.sort_by_key(|(time, _)| *time);

        let mut groups = Vec::new();
        let mut buffer: Vec<(DateTime<Utc>, MediaItem)> = Vec::new();

        for (time, item) in timed {
            let fits = match (buffer.first(), buffer.last()) {
                (Some((first, _)), Some((last, _))) => {
                    seconds_between(*last, time) <= self.config.max_gap
                        && seconds_between(*first, time) <= self.config.time_window
                }
                _ => true,
            };

            if !fits {
                flush(&mut buffer, &mut groups);
            }
            buffer.push((time, item));
        }
        flush(&mut buffer, &mut groups);

        info!(
            "Created {} time-based groups from {} photos",
            groups.len(),
            total
        );

        groups
    }

    /// Group parallel arrays of photos and capture times
    pub fn group_pairs(
        &self,
        photos: &[PathBuf],
        capture_times: &[DateTime<Utc>],
    ) -> Result<Vec<TimeGroup>, ArgumentError> {
        if photos.len() != capture_times.len() {
            return Err(ArgumentError::LengthMismatch {
                left: photos.len(),
                right: capture_times.len(),
            });
        }

        let items = photos
            .iter()
            .zip(capture_times)
            .map(|(path, time)| MediaItem::new(path.clone()).with_capture_time(Some(*time)))
            .collect();

        Ok(self.group(items))
    }
}

/// Emit the buffer as a group if it holds at least two photos, then reset it
fn flush(buffer: &mut Vec<(DateTime<Utc>, MediaItem)>, groups: &mut Vec<TimeGroup>) {
    let pending = std::mem::take(buffer);
    if pending.len() < 2 {
        return;
    }

    let (capture_times, items) = pending.into_iter().unzip();
    groups.push(TimeGroup {
        items,
        capture_times,
    });
}

/// Group parallel arrays with the given limits
pub fn group_by_time(
    photos: &[PathBuf],
    capture_times: &[DateTime<Utc>],
    config: GroupingConfig,
) -> Result<Vec<TimeGroup>, ArgumentError> {
    TimeWindowGrouper::new(config)?.group_pairs(photos, capture_times)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn photos_at(offsets_ms: &[i64]) -> (Vec<PathBuf>, Vec<DateTime<Utc>>) {
        let photos = (0..offsets_ms.len())
            .map(|i| PathBuf::from(format!("/burst/IMG_{:04}.jpg", i)))
            .collect();
        let times = offsets_ms
            .iter()
            .map(|ms| base() + Duration::milliseconds(*ms))
            .collect();
        (photos, times)
    }

    fn sizes(groups: &[TimeGroup]) -> Vec<usize> {
        groups.iter().map(|g| g.count()).collect()
    }

    #[test]
    fn empty_input_gives_no_groups() {
        let groups = group_by_time(&[], &[], GroupingConfig::default()).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn splits_two_bursts() {
        let (photos, times) = photos_at(&[0, 1_000, 2_000, 15_000, 16_000]);
        let groups = group_by_time(&photos, &times, GroupingConfig::default()).unwrap();

        assert_eq!(sizes(&groups), vec![3, 2]);
        assert_eq!(groups[1].paths().next(), Some(&photos[3]));
    }

    #[test]
    fn spaced_photos_form_no_groups() {
        let (photos, times) = photos_at(&[0, 10_000, 20_000, 30_000]);
        let groups = group_by_time(&photos, &times, GroupingConfig::default()).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn regrouping_output_is_stable() {
        let (photos, times) = photos_at(&[0, 400, 900, 1_700, 9_000, 9_300, 20_000]);
        let grouper = TimeWindowGrouper::new(GroupingConfig::default()).unwrap();
        let first = grouper.group_pairs(&photos, &times).unwrap();

        let flattened: Vec<MediaItem> = first.iter().flat_map(|g| g.items().to_vec()).collect();
        let second = grouper.group(flattened);

        assert_eq!(first, second);
    }

    #[test]
    fn groups_respect_both_limits() {
        let offsets = [0, 700, 1_900, 3_100, 3_400, 5_200, 5_900, 6_100, 8_000, 8_100];
        let (photos, times) = photos_at(&offsets);
        let config = GroupingConfig::default();
        let groups = group_by_time(&photos, &times, config).unwrap();

        let grouped: usize = groups.iter().map(|g| g.count()).sum();
        assert!(grouped <= photos.len());
        for group in &groups {
            assert!(group.count() >= 2);
            assert!(seconds_between(group.start_time(), group.end_time()) <= config.time_window);
            for pair in group.capture_times().windows(2) {
                assert!(pair[0] <= pair[1]);
                assert!(seconds_between(pair[0], pair[1]) <= config.max_gap);
            }
        }
    }

    #[test]
    fn gap_breaks_run_even_inside_window() {
        // Total span 2.5s fits the window, but the 2.5s gap does not
        let (photos, times) = photos_at(&[0, 2_500]);
        let groups = group_by_time(&photos, &times, GroupingConfig::default()).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn window_breaks_run_even_with_small_gaps() {
        // Every gap is 1s, but the run may span at most 3s
        let (photos, times) = photos_at(&[0, 1_000, 2_000, 3_000, 4_000, 5_000]);
        let groups = group_by_time(&photos, &times, GroupingConfig::default()).unwrap();

        assert_eq!(sizes(&groups), vec![4, 2]);
        assert_eq!(groups[0].duration(), Duration::seconds(3));
    }

    #[test]
    fn unsorted_input_is_sorted_first() {
        let (photos, times) = photos_at(&[1_000, 0, 500]);
        let groups = group_by_time(&photos, &times, GroupingConfig::default()).unwrap();

        assert_eq!(groups.len(), 1);
        let order: Vec<_> = groups[0].paths().cloned().collect();
        assert_eq!(order, vec![photos[1].clone(), photos[2].clone(), photos[0].clone()]);
    }

    #[test]
    fn equal_times_keep_input_order() {
        let (photos, times) = photos_at(&[0, 0, 0]);
        let groups = group_by_time(&photos, &times, GroupingConfig::default()).unwrap();

        let order: Vec<_> = groups[0].paths().cloned().collect();
        assert_eq!(order, photos);
    }

    #[test]
    fn undated_items_are_left_out() {
        let grouper = TimeWindowGrouper::new(GroupingConfig::default()).unwrap();
        let items = vec![
            MediaItem::new("/a.jpg").with_capture_time(Some(base())),
            MediaItem::new("/b.jpg"),
            MediaItem::new("/c.jpg").with_capture_time(Some(base() + Duration::seconds(1))),
        ];

        let groups = grouper.group(items);
        assert_eq!(sizes(&groups), vec![2]);
        assert!(groups[0].paths().all(|p| p != &PathBuf::from("/b.jpg")));
    }

    #[test]
    fn group_accessors() {
        let (photos, times) = photos_at(&[0, 1_500]);
        let group = group_by_time(&photos, &times, GroupingConfig::default())
            .unwrap()
            .remove(0);

        assert_eq!(group.start_time(), base());
        assert_eq!(group.end_time(), base() + Duration::milliseconds(1_500));
        assert_eq!(group.to_string(), "TimeGroup(2 photos, 1.5s)");
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let (photos, times) = photos_at(&[0, 1_000, 2_000]);
        let result = group_by_time(&photos, &times[..2], GroupingConfig::default());

        assert_eq!(result, Err(ArgumentError::LengthMismatch { left: 3, right: 2 }));
    }

    #[test]
    fn non_positive_limits_are_rejected() {
        let config = GroupingConfig {
            time_window: 0.0,
            max_gap: 2.0,
        };
        assert!(TimeWindowGrouper::new(config).is_err());

        let config = GroupingConfig {
            time_window: 3.0,
            max_gap: f64::NAN,
        };
        assert!(TimeWindowGrouper::new(config).is_err());
    }
}

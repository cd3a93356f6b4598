//! Integration tests for burst grouping and similarity clustering.
//!
//! These tests verify the library pipeline a caller would assemble:
//! - Time grouping of parallel photo/time arrays
//! - Star clustering with and without sharpness scores
//! - Clustering real image files inside time groups

use burst_curator::core::clustering::{
    best_index, build_star_clusters, ClusterConfig, ScoreMap, SimilarityClusterer,
};
use burst_curator::core::grouping::{group_by_time, GroupingConfig, TimeWindowGrouper};
use burst_curator::core::hasher::{HashVariant, PerceptualHash};
use burst_curator::core::media::MediaItem;
use burst_curator::core::sharpness::{SharpnessMethod, SharpnessScore};
use burst_curator::error::ArgumentError;
use chrono::{DateTime, Duration, TimeZone, Utc};
use image::{Rgb, RgbImage};
use std::path::PathBuf;
use tempfile::TempDir;

fn at(seconds: f64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
        + Duration::milliseconds((seconds * 1000.0) as i64)
}

fn photos(count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| PathBuf::from(format!("/trip/IMG_{:04}.jpg", i)))
        .collect()
}

fn hash(bits: u64) -> PerceptualHash {
    PerceptualHash::new(bits.to_be_bytes().to_vec(), HashVariant::Perceptual, 8)
}

#[test]
fn two_bursts_separated_by_a_pause() {
    let paths = photos(5);
    let times = [at(0.0), at(1.0), at(2.0), at(10.0), at(11.0)];

    let groups = group_by_time(&paths, &times, GroupingConfig::default()).unwrap();

    let sizes: Vec<usize> = groups.iter().map(|g| g.count()).collect();
    assert_eq!(sizes, vec![3, 2]);
    assert_eq!(groups[1].paths().next(), Some(&paths[3]));
}

#[test]
fn isolated_photos_form_no_groups() {
    let paths = photos(3);
    let times = [at(0.0), at(30.0), at(60.0)];

    let groups = group_by_time(&paths, &times, GroupingConfig::default()).unwrap();
    assert!(groups.is_empty());
}

#[test]
fn mismatched_inputs_are_rejected() {
    let result = group_by_time(&photos(3), &[at(0.0), at(1.0)], GroupingConfig::default());
    assert_eq!(
        result.unwrap_err(),
        ArgumentError::LengthMismatch { left: 3, right: 2 }
    );
}

#[test]
fn undated_items_never_join_a_group() {
    let grouper = TimeWindowGrouper::new(GroupingConfig::default()).unwrap();
    let items = vec![
        MediaItem::new("/trip/a.jpg").with_capture_time(Some(at(0.0))),
        MediaItem::new("/trip/undated.jpg"),
        MediaItem::new("/trip/b.jpg").with_capture_time(Some(at(0.5))),
    ];

    let groups = grouper.group(items);

    assert_eq!(groups.len(), 1);
    let names: Vec<_> = groups[0].items().iter().map(|i| i.file_name()).collect();
    assert_eq!(names, vec!["a.jpg", "b.jpg"]);
}

#[test]
fn star_cluster_picks_the_sharpest_member() {
    let paths = photos(4);
    // Seed at 0, two photos 4 bits away from it (8 from each other), one outlier
    let entries = vec![
        (paths[0].clone(), Some(hash(0))),
        (paths[1].clone(), Some(hash(0x0F))),
        (paths[2].clone(), Some(hash(0xF0))),
        (paths[3].clone(), Some(hash(u64::MAX))),
    ];
    let scores: ScoreMap = [(180.0, 0), (420.0, 2), (95.0, 3)]
        .into_iter()
        .map(|(value, i)| {
            (
                paths[i].clone(),
                SharpnessScore::new(value, SharpnessMethod::Laplacian),
            )
        })
        .collect();

    let clusters = build_star_clusters(entries, 6, Some(&scores)).unwrap();

    assert_eq!(clusters.len(), 1);
    let cluster = &clusters[0];
    assert_eq!(cluster.count(), 3);
    assert_eq!(cluster.seed().path, paths[0]);
    assert_eq!(cluster.scores(), vec![Some(180.0), None, Some(420.0)]);
    assert_eq!(cluster.best_photo(), paths[2].as_path());
}

#[test]
fn unscored_cluster_falls_back_to_the_seed() {
    assert_eq!(best_index(&[None, None, None]), 0);
    assert_eq!(best_index(&[None, Some(3.0), Some(3.0)]), 1);
}

#[test]
fn clusters_real_frames_within_time_groups() {
    let dir = TempDir::new().unwrap();
    let frame = RgbImage::from_fn(64, 64, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, 90]));
    let other = RgbImage::from_fn(64, 64, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    });

    // Burst one: three identical frames and a checkerboard. Burst two: two frames.
    let layout: [(f64, bool); 6] = [
        (0.0, true),
        (0.4, true),
        (0.8, false),
        (1.2, true),
        (20.0, true),
        (20.5, true),
    ];
    let items: Vec<MediaItem> = layout
        .iter()
        .enumerate()
        .map(|(i, (offset, same))| {
            let path = dir.path().join(format!("IMG_{:04}.png", i));
            let image = if *same { &frame } else { &other };
            image.save(&path).unwrap();
            MediaItem::new(path).with_capture_time(Some(at(*offset)))
        })
        .collect();

    let groups = TimeWindowGrouper::new(GroupingConfig::default())
        .unwrap()
        .group(items);
    assert_eq!(groups.len(), 2);

    let clusterer = SimilarityClusterer::new(ClusterConfig::default()).unwrap();
    let clusters = clusterer.cluster_groups(&groups, None).unwrap();

    let sizes: Vec<usize> = clusters.iter().map(|c| c.count()).collect();
    assert_eq!(sizes, vec![3, 2]);
    assert!(clusters[0]
        .paths()
        .all(|p| !p.ends_with("IMG_0002.png")));
}

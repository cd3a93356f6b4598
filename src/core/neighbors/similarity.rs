//! Pairwise visual similarity used by the neighbor graph.

use crate::core::hasher::fast_decode::FastDecoder;
use crate::core::hasher::fast_resize::resize_to_grayscale;
use crate::error::HashError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Edge length of the square both images are resized to
pub const COMPARE_SIZE: u32 = 256;

const BINS: usize = 256;

/// Similarity of two photos in `[0, 1]`
pub trait PairSimilarity: Send + Sync {
    /// Must not fail: unreadable photos score 0.0
    fn similarity(&self, a: &Path, b: &Path) -> f64;

    /// Forget anything remembered from an earlier batch.
    ///
    /// Called before each batch, since photos may have changed since.
    fn reset(&self) {}
}

type Histogram = Arc<[f64; BINS]>;

/// Grayscale histogram correlation.
///
/// Histograms are computed once per photo and reused for every pair it
/// takes part in, until the next [`PairSimilarity::reset`].
#[derive(Default)]
pub struct HistogramSimilarity {
    histograms: Mutex<HashMap<PathBuf, Option<Histogram>>>,
}

impl HistogramSimilarity {
    pub fn new() -> Self {
        Self::default()
    }

    fn histogram(&self, path: &Path) -> Option<Histogram> {
        if let Ok(cache) = self.histograms.lock() {
            if let Some(cached) = cache.get(path) {
                return cached.clone();
            }
        }

        let computed = match compute_histogram(path) {
            Ok(histogram) => Some(Arc::new(histogram)),
            Err(e) => {
                warn!(path = %path.display(), "Cannot compare photo: {}", e);
                None
            }
        };

        if let Ok(mut cache) = self.histograms.lock() {
            cache.insert(path.to_path_buf(), computed.clone());
        }
        computed
    }
}

impl PairSimilarity for HistogramSimilarity {
    fn similarity(&self, a: &Path, b: &Path) -> f64 {
        match (self.histogram(a), self.histogram(b)) {
            (Some(ha), Some(hb)) => {
                let score = correlation(&ha[..], &hb[..]).clamp(0.0, 1.0);
                debug!(a = %a.display(), b = %b.display(), score, "Histogram correlation");
                score
            }
            _ => 0.0,
        }
    }

    fn reset(&self) {
        if let Ok(mut cache) = self.histograms.lock() {
            cache.clear();
        }
    }
}

/// Min-max normalised 256-bin histogram of the resized grayscale image
fn compute_histogram(path: &Path) -> Result<[f64; BINS], HashError> {
    let image = FastDecoder::decode(path)?;
    let gray = resize_to_grayscale(&image, COMPARE_SIZE, COMPARE_SIZE).map_err(|e| match e {
        HashError::Decode { reason, .. } => HashError::Decode {
            path: path.to_path_buf(),
            reason,
        },
        other => other,
    })?;

    let mut histogram = [0.0; BINS];
    for pixel in gray.pixels() {
        histogram[pixel[0] as usize] += 1.0;
    }
    normalize_min_max(&mut histogram);
    Ok(histogram)
}

/// Rescale values linearly onto `[0, 1]`
fn normalize_min_max(values: &mut [f64]) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range <= 0.0 || !range.is_finite() {
        return;
    }
    for value in values.iter_mut() {
        *value = (*value - min) / range;
    }
}

/// Pearson correlation of two equally sized histograms.
///
/// Two flat histograms have nothing to correlate and count as identical.
pub fn correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }

    let mean_a = a[..n].iter().sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().sum::<f64>() / n as f64;

    let (mut numerator, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a[..n].iter().zip(&b[..n]) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        numerator += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denominator = (var_a * var_b).sqrt();
    if denominator > f64::EPSILON {
        numerator / denominator
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use std::fs;
    use tempfile::TempDir;

    fn save_gray(dir: &Path, name: &str, image: &GrayImage) -> PathBuf {
        let path = dir.join(name);
        image.save(&path).unwrap();
        path
    }

    #[test]
    fn correlation_of_identical_histograms_is_one() {
        let h = [0.0, 0.5, 1.0, 0.25];
        assert!((correlation(&h, &h) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn correlation_of_opposite_histograms_is_negative() {
        let a = [1.0, 0.0, 1.0, 0.0];
        let b = [0.0, 1.0, 0.0, 1.0];
        assert!((correlation(&a, &b) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn flat_histograms_count_as_identical() {
        assert_eq!(correlation(&[0.3; 8], &[0.3; 8]), 1.0);
    }

    #[test]
    fn identical_photos_are_fully_similar() {
        let dir = TempDir::new().unwrap();
        let image = GrayImage::from_fn(128, 96, |x, y| Luma([((x + y) % 256) as u8]));
        let a = save_gray(dir.path(), "a.png", &image);
        let b = save_gray(dir.path(), "b.png", &image);

        let similarity = HistogramSimilarity::new().similarity(&a, &b);
        assert!(similarity > 0.99, "similarity was {}", similarity);
    }

    #[test]
    fn dark_and_bright_photos_are_dissimilar() {
        let dir = TempDir::new().unwrap();
        let dark = save_gray(dir.path(), "dark.png", &GrayImage::from_pixel(64, 64, Luma([20])));
        let bright = save_gray(dir.path(), "bright.png", &GrayImage::from_pixel(64, 64, Luma([230])));

        assert_eq!(HistogramSimilarity::new().similarity(&dark, &bright), 0.0);
    }

    #[test]
    fn unreadable_photo_scores_zero() {
        let dir = TempDir::new().unwrap();
        let good = save_gray(dir.path(), "good.png", &GrayImage::from_pixel(32, 32, Luma([128])));
        let broken = dir.path().join("broken.jpg");
        fs::write(&broken, b"garbage").unwrap();

        let similarity = HistogramSimilarity::new();
        assert_eq!(similarity.similarity(&good, &broken), 0.0);
        assert_eq!(similarity.similarity(&broken, &good), 0.0);
    }

    #[test]
    fn histograms_are_memoized() {
        let dir = TempDir::new().unwrap();
        let path = save_gray(dir.path(), "a.png", &GrayImage::from_pixel(32, 32, Luma([90])));
        let similarity = HistogramSimilarity::new();

        assert_eq!(similarity.similarity(&path, &path), 1.0);
        // Still answers from memory once the file is gone
        fs::remove_file(&path).unwrap();
        assert_eq!(similarity.similarity(&path, &path), 1.0);
    }

    #[test]
    fn reset_rereads_changed_photos() {
        let dir = TempDir::new().unwrap();
        let dark = GrayImage::from_pixel(64, 64, Luma([20]));
        let a = save_gray(dir.path(), "a.png", &dark);
        let b = save_gray(dir.path(), "b.png", &dark);
        let similarity = HistogramSimilarity::new();
        assert_eq!(similarity.similarity(&a, &b), 1.0);

        save_gray(dir.path(), "b.png", &GrayImage::from_pixel(64, 64, Luma([230])));
        assert_eq!(similarity.similarity(&a, &b), 1.0);

        similarity.reset();
        assert_eq!(similarity.similarity(&a, &b), 0.0);
    }
}

//! # Sharpness Module
//!
//! Scores how sharp an image is. Higher is sharper.
//!
//! ## Methods
//! - **Laplacian** - variance of the Laplacian response, general purpose
//! - **Tenengrad** - mean Sobel gradient magnitude, robust on skies and flat areas
//! - **Roi** - Laplacian variance inside the most detailed edge regions only
//! - **Variance** - raw intensity variance, cheapest and least discriminating
//!
//! Scores from different methods live on different scales and must never be
//! compared with each other. Every stored score carries its method.

mod edges;

use crate::core::hasher::fast_decode::FastDecoder;
use crate::error::HashError;
use image::{imageops, DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Laplacian variance below this is considered blurry
pub const DEFAULT_BLUR_THRESHOLD: f64 = 120.0;

/// Version tag stored next to every persisted score
pub const METHOD_VERSION: &str = "1.0";

/// Minimum bounding-box area (px²) for a region to count in the ROI method
const MIN_REGION_AREA: u32 = 100;

/// Available sharpness methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharpnessMethod {
    Laplacian,
    Tenengrad,
    Roi,
    Variance,
}

impl SharpnessMethod {
    /// Every method, in declaration order
    pub const ALL: [SharpnessMethod; 4] = [
        SharpnessMethod::Laplacian,
        SharpnessMethod::Tenengrad,
        SharpnessMethod::Roi,
        SharpnessMethod::Variance,
    ];

    /// Key used in sidecar records
    pub fn name(&self) -> &'static str {
        match self {
            SharpnessMethod::Laplacian => "laplacian",
            SharpnessMethod::Tenengrad => "tenengrad",
            SharpnessMethod::Roi => "roi",
            SharpnessMethod::Variance => "variance",
        }
    }

    /// Look a method up by its record key
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

impl std::fmt::Display for SharpnessMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A sharpness value tagged with the method that produced it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SharpnessScore {
    pub value: f64,
    pub method: SharpnessMethod,
}

impl SharpnessScore {
    pub fn new(value: f64, method: SharpnessMethod) -> Self {
        Self { value, method }
    }
}

/// Whether a score falls below the blur threshold
pub fn is_blurry(score: f64, threshold: f64) -> bool {
    score < threshold
}

/// Computes sharpness scores on a grayscale conversion of an image
#[derive(Debug, Clone, Copy, Default)]
pub struct SharpnessScorer {
    /// Longest edge to downscale to before scoring (None = full resolution)
    analysis_size: Option<u32>,
}

impl SharpnessScorer {
    /// Score at full resolution
    pub fn new() -> Self {
        Self::default()
    }

    /// Downscale so the longest edge is at most `size` before scoring.
    ///
    /// Faster, but scores shrink and [`DEFAULT_BLUR_THRESHOLD`] no longer applies.
    pub fn with_analysis_size(mut self, size: u32) -> Self {
        self.analysis_size = Some(size);
        self
    }

    /// Decode a file and score it
    pub fn score_file(
        &self,
        path: &Path,
        method: SharpnessMethod,
    ) -> Result<SharpnessScore, HashError> {
        let image = FastDecoder::decode(path)?;
        Ok(self.score_image(&image, method))
    }

    /// Score a decoded image
    pub fn score_image(&self, image: &DynamicImage, method: SharpnessMethod) -> SharpnessScore {
        let gray = self.prepare(image);
        SharpnessScore::new(self.score_gray(&gray, method), method)
    }

    /// Grayscale (and optionally downscaled) copy used by every method
    pub fn prepare(&self, image: &DynamicImage) -> GrayImage {
        match self.analysis_size {
            Some(size) if image.width().max(image.height()) > size => image
                .resize(size, size, imageops::FilterType::Triangle)
                .to_luma8(),
            _ => image.to_luma8(),
        }
    }

    /// Score a prepared grayscale image
    pub fn score_gray(&self, gray: &GrayImage, method: SharpnessMethod) -> f64 {
        match method {
            SharpnessMethod::Laplacian => laplacian_variance(gray),
            SharpnessMethod::Tenengrad => tenengrad(gray),
            SharpnessMethod::Roi => roi_laplacian(gray),
            SharpnessMethod::Variance => intensity_variance(gray),
        }
    }
}

/// Variance of the 4-neighbour Laplacian over interior pixels
///
/// The Laplacian operator detects edges. Sharp images have more defined edges,
/// resulting in higher variance in the Laplacian output.
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (width, height) = gray.dimensions();

    if width < 3 || height < 3 {
        return 0.0;
    }

    // Laplacian kernel: [0, 1, 0; 1, -4, 1; 0, 1, 0]
    let mut values: Vec<f64> = Vec::with_capacity(((width - 2) * (height - 2)) as usize);
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let center = gray.get_pixel(x, y)[0] as f64;
            let top = gray.get_pixel(x, y - 1)[0] as f64;
            let bottom = gray.get_pixel(x, y + 1)[0] as f64;
            let left = gray.get_pixel(x - 1, y)[0] as f64;
            let right = gray.get_pixel(x + 1, y)[0] as f64;

            values.push(top + bottom + left + right - 4.0 * center);
        }
    }

    variance(&values)
}

/// Mean Sobel gradient magnitude `sqrt(gx² + gy²)` over interior pixels
pub fn tenengrad(gray: &GrayImage) -> f64 {
    let (width, height) = gray.dimensions();

    if width < 3 || height < 3 {
        return 0.0;
    }

    let gradients = edges::sobel(gray);
    let mut sum = 0.0;
    let mut count = 0usize;
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let (gx, gy) = gradients.at(x, y);
            sum += (gx * gx + gy * gy).sqrt();
            count += 1;
        }
    }

    sum / count as f64
}

/// Plain variance of pixel intensities
pub fn intensity_variance(gray: &GrayImage) -> f64 {
    let pixels: Vec<f64> = gray.pixels().map(|p| p[0] as f64).collect();
    variance(&pixels)
}

/// Laplacian variance averaged over the top half of detailed regions.
///
/// Regions are the bounding boxes of connected edge components with an
/// area above 100 px². Falls back to the whole-image Laplacian variance
/// when no region qualifies.
pub fn roi_laplacian(gray: &GrayImage) -> f64 {
    let edge_map = edges::canny(gray, edges::LOW_THRESHOLD, edges::HIGH_THRESHOLD);

    let mut region_scores: Vec<f64> = edges::edge_regions(&edge_map)
        .into_iter()
        .filter(|r| r.area() > MIN_REGION_AREA)
        .map(|r| {
            let roi = imageops::crop_imm(gray, r.x, r.y, r.width, r.height).to_image();
            laplacian_variance(&roi)
        })
        .collect();

    if region_scores.is_empty() {
        return laplacian_variance(gray);
    }

    region_scores.sort_by(|a, b| b.total_cmp(a));
    let keep = (region_scores.len() / 2).max(1);
    region_scores[..keep].iter().sum::<f64>() / keep as f64
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / n
}

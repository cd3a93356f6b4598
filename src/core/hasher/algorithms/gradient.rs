//! Difference Hash (dHash) implementation.
//!
//! dHash works by:
//! 1. Resizing the image to (hash_size+1) x hash_size
//! 2. Converting to grayscale
//! 3. Comparing each pixel to the one to its right
//! 4. If left pixel is brighter, set bit to 1, else 0
//!
//! This captures the relative gradient of brightness changes.

use super::super::fast_resize::resize_to_grayscale;
use super::super::traits::{HashAlgorithm, HashVariant, PerceptualHash};
use super::pack_bits;
use crate::error::HashError;
use image::DynamicImage;

/// Gradient (difference) hash implementation
pub struct GradientHasher {
    /// Size of the hash (width and height of comparison grid)
    hash_size: u32,
}

impl GradientHasher {
    /// Create a new dHash hasher
    pub fn new(hash_size: u32) -> Self {
        Self { hash_size }
    }
}

impl HashAlgorithm for GradientHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<PerceptualHash, HashError> {
        // One extra column to compute differences
        let gray = resize_to_grayscale(image, self.hash_size + 1, self.hash_size)?;

        let size = self.hash_size;
        let gray = &gray;
        let bits = (0..size).flat_map(move |y| {
            // Set bit if left is brighter than right
            (0..size).map(move |x| gray.get_pixel(x, y)[0] > gray.get_pixel(x + 1, y)[0])
        });

        Ok(PerceptualHash::new(
            pack_bits(bits),
            HashVariant::Gradient,
            self.hash_size,
        ))
    }

    fn variant(&self) -> HashVariant {
        HashVariant::Gradient
    }

    fn hash_size(&self) -> u32 {
        self.hash_size
    }
}

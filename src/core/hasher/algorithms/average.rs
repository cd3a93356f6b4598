//! Average Hash (aHash) implementation.
//!
//! aHash works by:
//! 1. Resizing the image to hash_size x hash_size
//! 2. Converting to grayscale
//! 3. Computing the average brightness
//! 4. For each pixel: if brighter than average, set bit to 1, else 0
//!
//! This is the fastest hash but less robust to edits.

use super::super::fast_resize::resize_to_grayscale;
use super::super::traits::{HashAlgorithm, HashVariant, PerceptualHash};
use super::pack_bits;
use crate::error::HashError;
use image::DynamicImage;

/// Average Hash (aHash) implementation
pub struct AverageHasher {
    /// Size of the hash (width and height)
    hash_size: u32,
}

impl AverageHasher {
    /// Create a new aHash hasher
    pub fn new(hash_size: u32) -> Self {
        Self { hash_size }
    }
}

impl HashAlgorithm for AverageHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<PerceptualHash, HashError> {
        let gray = resize_to_grayscale(image, self.hash_size, self.hash_size)?;

        let total: u64 = gray.pixels().map(|p| p[0] as u64).sum();
        let count = (self.hash_size * self.hash_size) as u64;
        let average = (total / count) as u8;

        let bytes = pack_bits(gray.pixels().map(|p| p[0] > average));

        Ok(PerceptualHash::new(bytes, HashVariant::Average, self.hash_size))
    }

    fn variant(&self) -> HashVariant {
        HashVariant::Average
    }

    fn hash_size(&self) -> u32 {
        self.hash_size
    }
}

//! Perceptual Hash (pHash) implementation.
//!
//! pHash uses the Discrete Cosine Transform (DCT) to extract
//! frequency information from the image. This makes it more
//! robust to:
//! - Scaling
//! - Minor rotations
//! - Brightness/contrast changes
//! - Compression artifacts
//!
//! The DCT pass and mean thresholding come from the image_hasher crate.

use super::super::traits::{HashAlgorithm, HashVariant, PerceptualHash};
use crate::error::HashError;
use image::DynamicImage;
use image_hasher::{HashAlg, HasherConfig as ImageHasherConfig};

/// Perceptual Hash (pHash) implementation using DCT
pub struct PerceptualHasher {
    hash_size: u32,
    hasher: image_hasher::Hasher,
}

impl PerceptualHasher {
    /// Create a new pHash hasher
    pub fn new(hash_size: u32) -> Self {
        let hasher = ImageHasherConfig::new()
            .hash_size(hash_size, hash_size)
            .hash_alg(HashAlg::Mean)
            .preproc_dct()
            .to_hasher();

        Self { hash_size, hasher }
    }
}

impl HashAlgorithm for PerceptualHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<PerceptualHash, HashError> {
        let hash = self.hasher.hash_image(image);
        let bytes = hash.as_bytes().to_vec();

        Ok(PerceptualHash::new(bytes, HashVariant::Perceptual, self.hash_size))
    }

    fn variant(&self) -> HashVariant {
        HashVariant::Perceptual
    }

    fn hash_size(&self) -> u32 {
        self.hash_size
    }
}

//! Hash value and hasher trait definitions.

use super::fast_decode::FastDecoder;
use crate::error::HashError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Available hash variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashVariant {
    /// Perceptual Hash (pHash) - DCT-based, robust to edits
    #[serde(alias = "phash")]
    Perceptual,
    /// Difference Hash (dHash) - brightness gradients between neighbours
    #[serde(alias = "dhash")]
    Gradient,
    /// Average Hash (aHash) - brightness against the mean
    #[serde(alias = "ahash")]
    Average,
}

impl HashVariant {
    /// Get a human-readable description of the variant
    pub fn description(&self) -> &'static str {
        match self {
            HashVariant::Average => {
                "Average Hash (aHash) - Fast comparison based on average brightness"
            }
            HashVariant::Gradient => {
                "Difference Hash (dHash) - Compares brightness gradients between pixels"
            }
            HashVariant::Perceptual => {
                "Perceptual Hash (pHash) - DCT-based, robust to edits and transformations"
            }
        }
    }
}

impl std::fmt::Display for HashVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashVariant::Average => write!(f, "aHash"),
            HashVariant::Gradient => write!(f, "dHash"),
            HashVariant::Perceptual => write!(f, "pHash"),
        }
    }
}

/// Trait for hash algorithm implementations
pub trait HashAlgorithm: Send + Sync {
    /// Compute a hash from an already-loaded image
    fn hash_image(&self, image: &DynamicImage) -> Result<PerceptualHash, HashError>;

    /// Compute a hash directly from a file path.
    ///
    /// Uses fast decoders for optimal performance:
    /// - JPEG: zune-jpeg (1.5-2x faster)
    /// - Other formats: image crate fallback
    fn hash_file(&self, path: &Path) -> Result<PerceptualHash, HashError> {
        let image = FastDecoder::decode(path)?;
        self.hash_image(&image)
    }

    /// Get the variant this hasher produces
    fn variant(&self) -> HashVariant;

    /// Get the hash edge length
    fn hash_size(&self) -> u32;
}

/// A fixed-width perceptual fingerprint tied to the variant and size that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerceptualHash {
    /// The raw hash bytes, most significant bit first
    bytes: Vec<u8>,
    /// The variant that produced this hash
    variant: HashVariant,
    /// Edge length of the hash grid
    hash_size: u32,
}

impl PerceptualHash {
    /// Create a new hash value
    pub fn new(bytes: Vec<u8>, variant: HashVariant, hash_size: u32) -> Self {
        Self {
            bytes,
            variant,
            hash_size,
        }
    }

    /// Parse a hash from its hexadecimal form (for cache restoration)
    pub fn from_hex(value: &str, variant: HashVariant, hash_size: u32) -> Result<Self, HashError> {
        let invalid = || HashError::InvalidHex {
            value: value.to_string(),
        };

        if value.len() % 2 != 0 {
            return Err(invalid());
        }

        let bytes = (0..value.len())
            .step_by(2)
            .map(|i| {
                value
                    .get(i..i + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or_else(invalid)
            })
            .collect::<Result<Vec<u8>, HashError>>()?;

        Ok(Self::new(bytes, variant, hash_size))
    }

    /// Get the variant that produced this hash
    pub fn variant(&self) -> HashVariant {
        self.variant
    }

    /// Get the hash edge length
    pub fn hash_size(&self) -> u32 {
        self.hash_size
    }

    /// Get the raw hash bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get the hash as a hexadecimal string
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Get the total number of bits in this hash
    pub fn bit_count(&self) -> u32 {
        (self.bytes.len() * 8) as u32
    }

    /// Whether two hashes were produced by the same variant and size
    pub fn is_comparable(&self, other: &Self) -> bool {
        self.variant == other.variant
            && self.hash_size == other.hash_size
            && self.bytes.len() == other.bytes.len()
    }

    /// Compute the Hamming distance to another hash
    ///
    /// Returns the number of bits that differ between the two hashes.
    /// Lower distance = more similar images.
    pub fn distance(&self, other: &Self) -> Result<u32, HashError> {
        if !self.is_comparable(other) {
            return Err(HashError::mismatch(
                (self.variant, self.hash_size),
                (other.variant, other.hash_size),
            ));
        }

        Ok(self
            .bytes
            .iter()
            .zip(other.bytes.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum())
    }
}

impl std::fmt::Display for PerceptualHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.variant, self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_hash(bytes: &[u8]) -> PerceptualHash {
        PerceptualHash::new(bytes.to_vec(), HashVariant::Gradient, 8)
    }

    #[test]
    fn distance_to_self_is_zero() {
        let hash = create_test_hash(&[0xFF, 0x00, 0xAA, 0x55]);
        assert_eq!(hash.distance(&hash).unwrap(), 0);
    }

    #[test]
    fn distance_is_symmetric() {
        let hash_a = create_test_hash(&[0xFF, 0x00]);
        let hash_b = create_test_hash(&[0x00, 0xFF]);

        assert_eq!(
            hash_a.distance(&hash_b).unwrap(),
            hash_b.distance(&hash_a).unwrap()
        );
    }

    #[test]
    fn distance_counts_differing_bits() {
        let hash_a = create_test_hash(&[0b11111111]);
        let hash_b = create_test_hash(&[0b00000000]);

        assert_eq!(hash_a.distance(&hash_b).unwrap(), 8);
    }

    #[test]
    fn distance_rejects_other_variant() {
        let gradient = create_test_hash(&[0xFF]);
        let average = PerceptualHash::new(vec![0xFF], HashVariant::Average, 8);

        let err = gradient.distance(&average).unwrap_err();
        assert!(matches!(err, HashError::VariantMismatch { .. }));
    }

    #[test]
    fn distance_rejects_other_size() {
        let small = create_test_hash(&[0xFF; 8]);
        let large = PerceptualHash::new(vec![0xFF; 32], HashVariant::Gradient, 16);

        assert!(small.distance(&large).is_err());
    }

    #[test]
    fn hex_round_trips() {
        let hash = create_test_hash(&[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(hash.to_hex(), "deadbeef");

        let parsed = PerceptualHash::from_hex("deadbeef", HashVariant::Gradient, 8).unwrap();
        assert_eq!(parsed, hash);
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(PerceptualHash::from_hex("abc", HashVariant::Average, 8).is_err());
        assert!(PerceptualHash::from_hex("zz", HashVariant::Average, 8).is_err());
    }

    #[test]
    fn variant_display() {
        assert_eq!(HashVariant::Average.to_string(), "aHash");
        assert_eq!(HashVariant::Gradient.to_string(), "dHash");
        assert_eq!(HashVariant::Perceptual.to_string(), "pHash");
    }

    #[test]
    fn variant_accepts_short_names() {
        let variant: HashVariant = serde_json::from_str("\"dhash\"").unwrap();
        assert_eq!(variant, HashVariant::Gradient);
    }
}

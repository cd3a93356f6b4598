//! Fast image decoding with format-specific optimizations.
//!
//! Uses zune-jpeg for JPEG files (1.5-2x faster than image crate),
//! falls back to image crate for other formats. Every failure is a
//! [`HashError::Decode`] or [`HashError::Io`] carrying the file path.

use crate::error::HashError;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use std::fs;
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Image containers with a dedicated decoding path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeFormat {
    Jpeg,
    Other,
}

impl DecodeFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("jpg" | "jpeg") => Self::Jpeg,
            _ => Self::Other,
        }
    }
}

/// Fast image decoder that uses optimized decoders per format
pub struct FastDecoder;

impl FastDecoder {
    /// Decode an image from a file path using the fastest available decoder.
    pub fn decode(path: &Path) -> Result<DynamicImage, HashError> {
        match DecodeFormat::from_path(path) {
            DecodeFormat::Jpeg => Self::decode_jpeg(path).or_else(|_| Self::decode_fallback(path)),
            DecodeFormat::Other => Self::decode_fallback(path),
        }
    }

    /// Fast JPEG decoding using zune-jpeg
    fn decode_jpeg(path: &Path) -> Result<DynamicImage, HashError> {
        let file_bytes = fs::read(path).map_err(|e| HashError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(&file_bytes, options);

        let pixels = decoder.decode().map_err(|e| HashError::Decode {
            path: path.to_path_buf(),
            reason: format!("zune-jpeg decode failed: {:?}", e),
        })?;

        let info = decoder.info().ok_or_else(|| HashError::Decode {
            path: path.to_path_buf(),
            reason: "Failed to get image info".to_string(),
        })?;

        let width = info.width as u32;
        let height = info.height as u32;
        let buffer_error = || HashError::Decode {
            path: path.to_path_buf(),
            reason: "Decoded buffer does not match image dimensions".to_string(),
        };

        // Output colorspace can differ from the requested one for grayscale sources
        let image = match decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB) {
            ColorSpace::RGB => {
                let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(buffer_error)?;
                DynamicImage::ImageRgb8(buffer)
            }
            ColorSpace::RGBA => {
                let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(buffer_error)?;
                DynamicImage::ImageRgba8(buffer)
            }
            ColorSpace::Luma => {
                let buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(buffer_error)?;
                DynamicImage::ImageLuma8(buffer)
            }
            _ => return Self::decode_fallback(path),
        };

        Ok(image)
    }

    /// Fallback to image crate for non-JPEG formats
    fn decode_fallback(path: &Path) -> Result<DynamicImage, HashError> {
        image::open(path).map_err(|e| match e {
            image::ImageError::IoError(source) => HashError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => HashError::Decode {
                path: path.to_path_buf(),
                reason: other.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use tempfile::TempDir;

    #[test]
    fn format_detection_jpeg() {
        assert_eq!(DecodeFormat::from_path(Path::new("photo.jpg")), DecodeFormat::Jpeg);
        assert_eq!(DecodeFormat::from_path(Path::new("photo.JPEG")), DecodeFormat::Jpeg);
        assert_eq!(DecodeFormat::from_path(Path::new("photo.JPG")), DecodeFormat::Jpeg);
    }

    #[test]
    fn format_detection_other() {
        assert_eq!(DecodeFormat::from_path(Path::new("photo.png")), DecodeFormat::Other);
        assert_eq!(DecodeFormat::from_path(Path::new("photo.nef")), DecodeFormat::Other);
        assert_eq!(DecodeFormat::from_path(Path::new("no_extension")), DecodeFormat::Other);
    }

    #[test]
    fn decodes_jpeg_written_by_image_crate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame.jpg");
        let img = ImageBuffer::from_fn(32, 24, |x, _| Rgb([(x * 8) as u8, 10, 10]));
        img.save(&path).unwrap();

        let decoded = FastDecoder::decode(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 24));
    }

    #[test]
    fn corrupt_file_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        fs::write(&path, b"this is not a valid image file").unwrap();

        let err = FastDecoder::decode(&path).unwrap_err();
        assert!(err.is_decode());
        assert!(err.to_string().contains("broken.jpg"));
    }
}

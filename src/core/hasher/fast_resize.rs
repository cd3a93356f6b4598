//! Grayscale downsampling for hash grids and histogram frames.
//!
//! Only the luma channel is resized, with a bilinear convolution from
//! fast_image_resize (SIMD where the CPU has it).

use crate::error::HashError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GrayImage};
use std::path::PathBuf;

/// Convert `image` to luma and resize it to exactly `width` x `height`.
///
/// Fails on an empty source or target.
pub fn resize_to_grayscale(
    image: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<GrayImage, HashError> {
    let luma = image.to_luma8();
    let (src_width, src_height) = luma.dimensions();
    if src_width == 0 || src_height == 0 {
        return Err(resize_error(format!("empty photo ({}x{})", src_width, src_height)));
    }
    if width == 0 || height == 0 {
        return Err(resize_error(format!("empty target ({}x{})", width, height)));
    }

    let source = Image::from_vec_u8(src_width, src_height, luma.into_raw(), PixelType::U8)
        .map_err(|e| resize_error(e.to_string()))?;
    let mut target = Image::new(width, height, PixelType::U8);

    let bilinear = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
    Resizer::new()
        .resize(&source, &mut target, &bilinear)
        .map_err(|e| resize_error(e.to_string()))?;

    GrayImage::from_raw(width, height, target.into_vec())
        .ok_or_else(|| resize_error("resized buffer has the wrong length".to_string()))
}

/// Callers that know the photo path fill it in
fn resize_error(reason: String) -> HashError {
    HashError::Decode {
        path: PathBuf::new(),
        reason: format!("resize failed: {}", reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    #[test]
    fn gradient_hash_grid_is_one_column_wider() {
        let photo = DynamicImage::ImageRgb8(RgbImage::from_fn(120, 80, |x, y| {
            Rgb([(x * 2) as u8, (y * 3) as u8, 40])
        }));
        let grid = resize_to_grayscale(&photo, 9, 8).unwrap();
        assert_eq!(grid.dimensions(), (9, 8));
    }

    #[test]
    fn small_photo_is_upscaled_to_histogram_frame() {
        let photo = DynamicImage::ImageLuma8(GrayImage::from_pixel(40, 30, Luma([77])));
        let frame = resize_to_grayscale(&photo, 256, 256).unwrap();

        assert_eq!(frame.dimensions(), (256, 256));
        // A flat photo stays flat, so its histogram is a single spike
        assert!(frame.pixels().all(|p| p[0].abs_diff(77) <= 1));
    }

    #[test]
    fn empty_photo_or_target_is_rejected() {
        let empty = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        assert!(resize_to_grayscale(&empty, 8, 8).is_err());

        let photo = DynamicImage::ImageLuma8(GrayImage::from_pixel(10, 10, Luma([0])));
        let err = resize_to_grayscale(&photo, 0, 8).unwrap_err();
        assert!(err.to_string().contains("empty target"));
    }
}

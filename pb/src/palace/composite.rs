//! Mask compositing
//!
//! Blends the complete palace over a flat grey background using the layer
//! mask as per-pixel alpha.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageFormat, Rgb, RgbImage};
use tracing::debug;

use super::PalaceError;

/// Blend one channel: `m` = 255 keeps the palace, 0 keeps the background
fn blend(img: u8, grey: u8, m: u8) -> u8 {
    let m = u32::from(m);
    ((u32::from(img) * m + u32::from(grey) * (255 - m)) / 255) as u8
}

/// Reveal the masked parts of `palace` over `grey`
///
/// The mask is resized to the palace size when they differ.
pub fn apply_mask(palace: &RgbImage, mask: &GrayImage, grey: [u8; 3]) -> RgbImage {
    let (width, height) = palace.dimensions();
    debug!(width, height, mask_width = mask.width(), mask_height = mask.height(), "apply_mask: called");

    let resized;
    let mask = if mask.dimensions() == (width, height) {
        mask
    } else {
        resized = imageops::resize(mask, width, height, FilterType::Triangle);
        &resized
    };

    RgbImage::from_fn(width, height, |x, y| {
        let m = mask.get_pixel(x, y).0[0];
        let p = palace.get_pixel(x, y).0;
        Rgb([blend(p[0], grey[0], m), blend(p[1], grey[1], m), blend(p[2], grey[2], m)])
    })
}

/// Decode the complete palace, apply the mask and re-encode as PNG
pub fn composite_png(palace_png: &[u8], mask: &GrayImage, grey: [u8; 3]) -> Result<Vec<u8>, PalaceError> {
    debug!(bytes = palace_png.len(), "composite_png: called");
    let palace = image::load_from_memory(palace_png)?.to_rgb8();
    let revealed = apply_mask(&palace, mask, grey);
    encode_png(DynamicImage::ImageRgb8(revealed))
}

/// Encode any image as PNG bytes
pub fn encode_png(image: impl Into<DynamicImage>) -> Result<Vec<u8>, PalaceError> {
    let mut buf = Cursor::new(Vec::new());
    image.into().write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palace::build_layer_mask;

    fn red_palace(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([200, 10, 10]))
    }

    #[test]
    fn test_blend_extremes() {
        assert_eq!(blend(200, 128, 255), 200);
        assert_eq!(blend(200, 128, 0), 128);
        assert_eq!(blend(0, 128, 128), 63);
    }

    #[test]
    fn test_apply_mask_bottom_half() {
        let mask = build_layer_mask(&[1], 2, 8, 8, 0.0);
        let out = apply_mask(&red_palace(8, 8), &mask, [128, 128, 128]);

        assert_eq!(out.get_pixel(0, 0).0, [128, 128, 128]);
        assert_eq!(out.get_pixel(7, 3).0, [128, 128, 128]);
        assert_eq!(out.get_pixel(0, 4).0, [200, 10, 10]);
        assert_eq!(out.get_pixel(7, 7).0, [200, 10, 10]);
    }

    #[test]
    fn test_apply_mask_resizes() {
        let mask = GrayImage::from_pixel(4, 4, image::Luma([255]));
        let out = apply_mask(&red_palace(16, 8), &mask, [128, 128, 128]);
        assert_eq!(out.dimensions(), (16, 8));
        assert!(out.pixels().all(|p| p.0 == [200, 10, 10]));
    }

    #[test]
    fn test_composite_png_round_trip() {
        let palace = encode_png(red_palace(8, 8)).unwrap();
        let mask = build_layer_mask(&[], 2, 8, 8, 2.0);

        let out = composite_png(&palace, &mask, [128, 128, 128]).unwrap();
        let decoded = image::load_from_memory(&out).unwrap().to_rgb8();
        assert!(decoded.pixels().all(|p| p.0 == [128, 128, 128]));
    }

    #[test]
    fn test_composite_png_rejects_garbage() {
        let mask = GrayImage::new(4, 4);
        assert!(matches!(
            composite_png(b"not an image", &mask, [128, 128, 128]),
            Err(PalaceError::Image(_))
        ));
    }
}

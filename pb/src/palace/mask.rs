//! Layer mask construction
//!
//! The palace is cut into `total` horizontal bands of `height / total` rows.
//! Order 1 is the bottom band and order `total` the top one. A completed
//! sub-task paints its own band white; nothing else is revealed.

use std::ops::Range;

use image::{GrayImage, Luma, imageops};
use tracing::{debug, warn};

/// Mask value for a revealed pixel
pub const REVEALED: u8 = 255;

/// Rows covered by the band of `order`, or `None` when it is not drawable
///
/// The band is `[height - order*h, height - (order-1)*h)` with
/// `h = height / total`, clamped to `[0, height)`.
pub fn band_rows(order: i64, total: usize, height: u32) -> Option<Range<u32>> {
    if total == 0 || order < 1 || order as u64 > total as u64 {
        return None;
    }
    let layer_height = i64::from(height) / total as i64;
    let height = i64::from(height);

    let start = (height - order * layer_height).clamp(0, height);
    let end = (height - (order - 1) * layer_height).clamp(0, height);
    if start >= end {
        return None;
    }
    Some(start as u32..end as u32)
}

/// Build the reveal mask for the completed orders
///
/// An empty completed set, or `total == 0`, yields an all-zero mask. Otherwise
/// each drawable band is saturated and the result is softened with a Gaussian
/// blur of `blur_sigma` (skipped when the sigma is not positive).
pub fn build_layer_mask(completed_orders: &[i64], total: usize, width: u32, height: u32, blur_sigma: f32) -> GrayImage {
    debug!(?completed_orders, total, width, height, blur_sigma, "build_layer_mask: called");
    let mut mask = GrayImage::new(width, height);
    if completed_orders.is_empty() || total == 0 {
        debug!("build_layer_mask: nothing to reveal");
        return mask;
    }

    let mut drawn = false;
    for &order in completed_orders {
        let Some(rows) = band_rows(order, total, height) else {
            warn!(order, total, "Order outside the layer range, not revealed");
            continue;
        };
        debug!(order, start = rows.start, end = rows.end, "build_layer_mask: revealing layer");
        for y in rows {
            for x in 0..width {
                mask.put_pixel(x, y, Luma([REVEALED]));
            }
        }
        drawn = true;
    }

    if drawn && blur_sigma > 0.0 && width > 0 && height > 0 {
        mask = imageops::blur(&mask, blur_sigma);
    }
    mask
}

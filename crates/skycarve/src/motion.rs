//! Temporal-difference motion extraction.

use crate::error::{Error, Result};
use crate::frame::ImageView;

/// Pixels where the two frames differ by more than `threshold`, in
/// row-major order.
///
/// The per-pixel absolute difference is reduced to luminance by an
/// equal-weighted average over the color channels (the alpha channel of
/// 4-channel input is ignored), then binarized with a strict `> threshold`
/// compare on the 8-bit scale. An empty result is legal and means no
/// motion was observed this frame.
pub fn motion_pixels(
    current: &ImageView<'_>,
    previous: &ImageView<'_>,
    threshold: u8,
) -> Result<Vec<(u32, u32)>> {
    if !current.same_layout(previous) {
        return Err(Error::InvalidInput(format!(
            "frame layouts differ: {}x{}x{} vs {}x{}x{}",
            current.width(),
            current.height(),
            current.channels(),
            previous.width(),
            previous.height(),
            previous.channels(),
        )));
    }

    let color_channels = current.channels().min(3);
    // avg(diff) > threshold, kept in integer math as sum(diff) > threshold * n.
    let limit = u32::from(threshold) * color_channels;

    let mut pixels = Vec::new();
    for y in 0..current.height() {
        for x in 0..current.width() {
            let c = current.pixel(x, y);
            let p = previous.pixel(x, y);
            let sum: u32 = (0..color_channels as usize)
                .map(|i| u32::from(c[i].abs_diff(p[i])))
                .sum();
            if sum > limit {
                pixels.push((x, y));
            }
        }
    }
    Ok(pixels)
}

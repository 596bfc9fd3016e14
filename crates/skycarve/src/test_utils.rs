//! Shared helpers for image-based unit tests: synthetic stimulus frames
//! and forward projection (the inverse of what ray generation does).

use image::{GrayImage, Luma};
use nalgebra::{Point3, Vector4};

use crate::camera::Camera;

/// Uniform gray frame.
pub(crate) fn gray_frame(width: u32, height: u32, value: u8) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([value]))
}

/// Paint a `size`×`size` square with its top-left corner at `(x, y)`,
/// clipped to the image.
pub(crate) fn draw_square(image: &mut GrayImage, x: u32, y: u32, size: u32, value: u8) {
    let (w, h) = image.dimensions();
    for dy in 0..size {
        for dx in 0..size {
            let (px, py) = (x + dx, y + dy);
            if px < w && py < h {
                image.put_pixel(px, py, Luma([value]));
            }
        }
    }
}

/// Project a world point into pixel coordinates of a `width`×`height`
/// frame rendered through `camera`.
pub(crate) fn project_pixel(
    camera: &Camera,
    width: u32,
    height: u32,
    point: &Point3<f64>,
) -> (f64, f64) {
    let clip = camera.view_projection() * Vector4::new(point.x, point.y, point.z, 1.0);
    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    (
        (ndc_x + 1.0) / 2.0 * f64::from(width),
        (1.0 - ndc_y) / 2.0 * f64::from(height),
    )
}

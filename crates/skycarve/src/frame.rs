//! Borrowed image views and per-camera frame pairs.

use image::{GrayImage, RgbImage};

use crate::camera::Camera;
use crate::error::{Error, Result};

/// Read-only view over row-major 8-bit pixel data.
///
/// `stride` is the distance between row starts in bytes and may exceed
/// `width × channels` for padded buffers. Supported channel counts are 1
/// (gray), 3 (color) and 4 (color + alpha).
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    width: u32,
    height: u32,
    channels: u32,
    stride: usize,
    data: &'a [u8],
}

impl<'a> ImageView<'a> {
    pub fn new(
        width: u32,
        height: u32,
        channels: u32,
        stride: usize,
        data: &'a [u8],
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidInput("image dimensions must be non-zero".into()));
        }
        if !matches!(channels, 1 | 3 | 4) {
            return Err(Error::InvalidInput(format!(
                "unsupported channel count {channels} (expected 1, 3 or 4)"
            )));
        }
        let row_bytes = width as usize * channels as usize;
        if stride < row_bytes {
            return Err(Error::InvalidInput(format!(
                "stride {stride} smaller than row width {row_bytes}"
            )));
        }
        // The last row need not be padded out to the full stride.
        let needed = stride * (height as usize - 1) + row_bytes;
        if data.len() < needed {
            return Err(Error::InvalidInput(format!(
                "pixel buffer holds {} bytes, {} required",
                data.len(),
                needed
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            stride,
            data,
        })
    }

    /// Tightly packed single-channel view over a [`GrayImage`].
    pub fn from_gray(image: &'a GrayImage) -> Self {
        let (w, h) = image.dimensions();
        Self::new(w, h, 1, w as usize, image.as_raw())
            .expect("GrayImage buffers are always tightly packed")
    }

    /// Tightly packed three-channel view over an [`RgbImage`].
    pub fn from_rgb(image: &'a RgbImage) -> Self {
        let (w, h) = image.dimensions();
        Self::new(w, h, 3, 3 * w as usize, image.as_raw())
            .expect("RgbImage buffers are always tightly packed")
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    /// Channel slice of the pixel at `(x, y)`, zero-based, (0, 0) top-left.
    pub(crate) fn pixel(&self, x: u32, y: u32) -> &[u8] {
        debug_assert!(x < self.width && y < self.height);
        let start = y as usize * self.stride + x as usize * self.channels as usize;
        &self.data[start..start + self.channels as usize]
    }

    /// Whether two views can be temporally differenced.
    pub(crate) fn same_layout(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.channels == other.channels
    }
}

/// One camera's contribution to a detection call: the camera plus two
/// consecutive frames of identical layout.
///
/// Callers that have no previous frame yet (first capture) pass the current
/// image twice, which yields zero motion for that camera.
#[derive(Debug, Clone, Copy)]
pub struct CameraFrame<'a> {
    pub camera: Camera,
    pub current: ImageView<'a>,
    pub previous: ImageView<'a>,
}

impl<'a> CameraFrame<'a> {
    pub fn new(camera: Camera, current: ImageView<'a>, previous: ImageView<'a>) -> Self {
        Self {
            camera,
            current,
            previous,
        }
    }
}

//! Observation camera model: look-at extrinsics and a depth-[0,1]
//! perspective projection.
//!
//! Matches the renderer's conventions: right-handed world with +Y up and
//! WebGPU-style clip space (z in [0, 1]). Pixel unprojection goes through
//! the inverse view-projection, so detection works with exactly the
//! matrices the frames were rendered with.

use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A statically placed, calibrated camera.
///
/// Immutable during a detection call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Optical center in world coordinates (meters).
    pub position: Point3<f64>,
    /// Point the camera looks at.
    pub target: Point3<f64>,
    /// Up hint; need not be orthogonal to the view direction.
    pub up: Vector3<f64>,
    /// Vertical field of view in degrees.
    pub fov: f64,
    /// Width / height aspect ratio.
    pub aspect: f64,
    /// Near clip distance.
    pub near: f64,
    /// Far clip distance.
    pub far: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 3.0),
            target: Point3::origin(),
            up: Vector3::y(),
            fov: 45.0,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    /// Camera at `position` looking at `target` with the default lens and
    /// a +Y up hint.
    pub fn looking_at(position: Point3<f64>, target: Point3<f64>) -> Self {
        Self {
            position,
            target,
            ..Self::default()
        }
    }

    /// Right-handed look-at view matrix.
    pub fn view_matrix(&self) -> Matrix4<f64> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Perspective projection with clip-space depth in [0, 1].
    pub fn projection_matrix(&self) -> Matrix4<f64> {
        let tan_half = (self.fov.to_radians() / 2.0).tan();
        Matrix4::new(
            1.0 / (self.aspect * tan_half),
            0.0,
            0.0,
            0.0,
            0.0,
            1.0 / tan_half,
            0.0,
            0.0,
            0.0,
            0.0,
            self.far / (self.near - self.far),
            self.near * self.far / (self.near - self.far),
            0.0,
            0.0,
            -1.0,
            0.0,
        )
    }

    /// Combined view-projection matrix.
    pub fn view_projection(&self) -> Matrix4<f64> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Validated inverse view-projection for pixel unprojection.
    pub(crate) fn inverse_view_projection(&self) -> Result<Matrix4<f64>> {
        self.validate()?;
        let inv = self
            .view_projection()
            .try_inverse()
            .ok_or_else(|| Error::InvalidCamera("view-projection is not invertible".into()))?;
        if !inv.iter().all(|c| c.is_finite()) {
            return Err(Error::NumericOverflow(
                "inverse view-projection has non-finite entries".into(),
            ));
        }
        Ok(inv)
    }

    /// Angular footprint of one pixel (radians): vertical FOV divided by
    /// vertical resolution. Assumes square pixels; sufficient for the
    /// ~1-pixel footprints this detector works with.
    pub(crate) fn pixel_footprint(&self, height: u32) -> f64 {
        self.fov.to_radians() / f64::from(height)
    }

    fn validate(&self) -> Result<()> {
        let finite = self.position.iter().all(|c| c.is_finite())
            && self.target.iter().all(|c| c.is_finite())
            && self.up.iter().all(|c| c.is_finite())
            && self.fov.is_finite()
            && self.aspect.is_finite()
            && self.near.is_finite()
            && self.far.is_finite();
        if !finite {
            return Err(Error::InvalidCamera("non-finite camera attribute".into()));
        }
        if self.fov <= 0.0 || self.fov >= 180.0 {
            return Err(Error::InvalidCamera(format!(
                "vertical fov {} outside (0, 180)",
                self.fov
            )));
        }
        if self.aspect <= 0.0 {
            return Err(Error::InvalidCamera("aspect ratio must be positive".into()));
        }
        if self.near <= 0.0 || self.far <= self.near {
            return Err(Error::InvalidCamera(
                "clip planes must satisfy 0 < near < far".into(),
            ));
        }
        let forward = self.target - self.position;
        if forward.norm() == 0.0 || forward.cross(&self.up).norm() <= 1e-12 {
            return Err(Error::InvalidCamera(
                "view direction is degenerate or parallel to up".into(),
            ));
        }
        Ok(())
    }
}

//! skycarve — geometric multi-view voxel-carving detector for small moving
//! aerial objects.
//!
//! Localizes a moving object (e.g. a drone) inside a bounded search volume
//! from synchronized frame pairs of several static, calibrated cameras
//! surrounding the scene. Tolerates occlusion by background geometry and
//! per-camera visual distractors because a detection requires consistent
//! observations from a quorum of distinct cameras. The pipeline stages are:
//!
//! 1. **Motion** – per-camera temporal differencing → motion pixel list.
//! 2. **Rays** – unproject motion pixels into world-space rays tagged with
//!    the source camera and a per-pixel angular footprint.
//! 3. **Carve** – hierarchical subdivided-grid carving: one 3D DDA sweep per
//!    ray per level, with footprint-adaptive ray subdivision far from the
//!    camera.
//! 4. **Cluster** – single-link grouping of leaf voxels into candidates.
//! 5. **Track** – greedy nearest-neighbor association across frames.
//!
//! # Public API
//! The surface is intentionally small:
//! - [`Detector`] and [`DetectorConfig`] as primary entry points
//! - [`ClusterTracker`] for cross-frame association (caller-owned state)
//! - value types [`Voxel`], [`Cluster`], [`Track`]
//!
//! # Conventions
//! The world is right-handed with +Y up; distances are meters. Images are
//! row-major 8-bit with (0, 0) at the top-left. Clip space uses depth in
//! [0, 1]. For identical inputs the detection sequence is deterministic.

mod camera;
mod carve;
mod cluster;
mod detector;
mod error;
mod frame;
mod motion;
mod ray;
#[cfg(test)]
mod test_utils;
mod tracker;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

pub use camera::Camera;
pub use carve::{carve, CarveConfig};
pub use cluster::{cluster_detections, Cluster, ClusterConfig};
pub use detector::{detect_objects, Detector, DetectorConfig};
pub use error::{Error, Result};
pub use frame::{CameraFrame, ImageView};
pub use motion::motion_pixels;
pub use ray::{generate_rays, Ray};
pub use tracker::{ClusterTracker, TimedPosition, Track, TrackerConfig};

/// An axis-aligned cube given by its center and half-extent.
///
/// Used both for the search volume handed to the carver and for the leaf
/// detections it returns. The cube is closed on all faces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Voxel {
    /// Cube center in world coordinates (meters).
    pub center: Point3<f64>,
    /// Half of the cube side.
    pub half_extent: f64,
}

impl Voxel {
    pub fn new(center: Point3<f64>, half_extent: f64) -> Self {
        Self {
            center,
            half_extent,
        }
    }

    /// Full side length (2 × half-extent).
    pub fn side(&self) -> f64 {
        2.0 * self.half_extent
    }

    /// Corner with the smallest coordinate on every axis.
    pub fn min_corner(&self) -> Point3<f64> {
        self.center - Vector3::repeat(self.half_extent)
    }

    /// Whether `point` lies inside the cube (faces included).
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|i| (point[i] - self.center[i]).abs() <= self.half_extent)
    }
}

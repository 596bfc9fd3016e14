//! High-level detection API.
//!
//! [`Detector`] is the primary entry point: it wraps a [`DetectorConfig`]
//! and runs motion extraction, ray generation and carving over a set of
//! camera frames. Create once, detect on many frame sets.

use serde::{Deserialize, Serialize};

use crate::carve::{carve, CarveConfig};
use crate::cluster::{cluster_detections, Cluster, ClusterConfig};
use crate::error::Result;
use crate::frame::CameraFrame;
use crate::motion::motion_pixels;
use crate::ray::{generate_rays, Ray};
use crate::Voxel;

/// Full pipeline configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Threshold on the per-pixel temporal difference (8-bit scale).
    pub motion_threshold: u8,
    /// Carving parameters (voxel floor, camera quorum, subdivision).
    pub carve: CarveConfig,
    /// Spatial grouping of leaf detections.
    pub cluster: ClusterConfig,
}

impl Default for DetectorConfig {
    /// Defaults tuned for the reference rig: τ = 5, 0.1 m voxel floor,
    /// three-camera quorum, 8³ subdivision.
    fn default() -> Self {
        Self {
            motion_threshold: 5,
            carve: CarveConfig::default(),
            cluster: ClusterConfig::default(),
        }
    }
}

/// Multi-view voxel-carving detector.
pub struct Detector {
    config: DetectorConfig,
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector {
    pub fn new() -> Self {
        Self::with_config(DetectorConfig::default())
    }

    pub fn with_config(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Access the current configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Mutable access to configuration for post-construction tuning.
    pub fn config_mut(&mut self) -> &mut DetectorConfig {
        &mut self.config
    }

    /// Detect moving objects inside `target_zone`.
    ///
    /// Returns the leaf voxels consistent with motion seen from at least
    /// the configured camera quorum, in deterministic order.
    pub fn detect(&self, target_zone: Voxel, frames: &[CameraFrame<'_>]) -> Result<Vec<Voxel>> {
        detect_objects(target_zone, frames, &self.config)
    }

    /// Detect and group the result into spatial clusters.
    pub fn detect_clusters(
        &self,
        target_zone: Voxel,
        frames: &[CameraFrame<'_>],
    ) -> Result<Vec<Cluster>> {
        let detections = self.detect(target_zone, frames)?;
        Ok(cluster_detections(
            &detections,
            self.config.carve.min_voxel_size,
            &self.config.cluster,
        ))
    }
}

/// Run the detection pipeline: per-camera temporal differencing and ray
/// generation, then carving of the concatenated ray set.
pub fn detect_objects(
    target_zone: Voxel,
    frames: &[CameraFrame<'_>],
    config: &DetectorConfig,
) -> Result<Vec<Voxel>> {
    let mut rays: Vec<Ray> = Vec::new();
    for (camera_id, frame) in frames.iter().enumerate() {
        let pixels = motion_pixels(&frame.current, &frame.previous, config.motion_threshold)?;
        let camera_rays = generate_rays(
            &frame.camera,
            frame.current.width(),
            frame.current.height(),
            &pixels,
            camera_id,
        )?;
        tracing::debug!(
            camera = camera_id,
            motion_pixels = pixels.len(),
            rays = camera_rays.len(),
            "camera pass"
        );
        rays.extend(camera_rays);
    }
    carve(target_zone, rays, &config.carve)
}

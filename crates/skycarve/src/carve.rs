//! Hierarchical subdivided-grid ray carving.
//!
//! The search volume is partitioned into n'×n'×n' cells per level. Instead
//! of a slab test against every child, each ray runs a single 3D DDA sweep
//! that visits exactly the cells it crosses, dropping the ray into those
//! cells' buckets. Cells reached by rays from enough distinct cameras are
//! pushed onto an explicit work stack and carved further until the cell
//! side reaches the configured floor.
//!
//! Rays whose pixel footprint has grown past a fraction of the child side
//! are replaced by a 2×2 pencil of sub-rays before traversal; without this
//! a single distant pixel is thinner than a fine-level cell and valid hits
//! are missed.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ray::Ray;
use crate::Voxel;

/// Carving parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CarveConfig {
    /// Minimum voxel side (meters); recursion stops at or below this side.
    pub min_voxel_size: f64,
    /// Minimum number of distinct cameras whose rays must reach a voxel.
    pub min_cameras: usize,
    /// Subdivision factor per axis. Must be ≥ 2.
    pub subdivision: usize,
    /// Footprint-to-cell-side ratio above which a ray is subdivided.
    pub footprint_ratio: f64,
}

impl Default for CarveConfig {
    fn default() -> Self {
        Self {
            min_voxel_size: 0.1,
            min_cameras: 3,
            subdivision: 8,
            footprint_ratio: 0.2,
        }
    }
}

impl CarveConfig {
    fn validate(&self) -> Result<()> {
        if !(self.min_voxel_size > 0.0) || !self.min_voxel_size.is_finite() {
            return Err(Error::InvalidParameters(
                "minimum voxel size must be positive and finite".into(),
            ));
        }
        if self.min_cameras < 1 {
            return Err(Error::InvalidParameters(
                "camera quorum must be at least 1".into(),
            ));
        }
        if self.subdivision < 2 {
            return Err(Error::InvalidParameters(
                "subdivision factor must be at least 2".into(),
            ));
        }
        if !(self.footprint_ratio > 0.0) || !self.footprint_ratio.is_finite() {
            return Err(Error::InvalidParameters(
                "footprint ratio must be positive and finite".into(),
            ));
        }
        Ok(())
    }
}

/// A pending voxel together with the rays that entered it.
struct WorkItem {
    voxel: Voxel,
    rays: Vec<Ray>,
}

/// Carve `target_zone` down to leaf voxels consistent with the ray set.
///
/// Returns the leaves (side ≤ `min_voxel_size`) reached by rays from at
/// least `min_cameras` distinct cameras, in deterministic depth-first
/// order with children visited in increasing (ix, iy, iz).
///
/// An empty ray set is not an error; it produces an empty result.
pub fn carve(target_zone: Voxel, rays: Vec<Ray>, config: &CarveConfig) -> Result<Vec<Voxel>> {
    config.validate()?;
    if !target_zone.center.iter().all(|c| c.is_finite()) {
        return Err(Error::NumericOverflow("target zone center is non-finite".into()));
    }
    if !(target_zone.half_extent > 0.0) || !target_zone.half_extent.is_finite() {
        return Err(Error::InvalidParameters(
            "target zone half-extent must be positive and finite".into(),
        ));
    }
    if let Some(bad) = rays.iter().find(|r| !r.is_finite()) {
        return Err(Error::InvalidParameters(format!(
            "ray from camera {} has non-finite components",
            bad.camera_id
        )));
    }
    if rays.is_empty() {
        return Ok(Vec::new());
    }

    // Root gate: only rays that actually enter the zone count, and the
    // zone itself must satisfy the camera quorum.
    let entering: Vec<Ray> = rays
        .into_iter()
        .filter(|ray| ray.intersect(&target_zone).is_some())
        .collect();
    tracing::trace!(
        rays = entering.len(),
        cameras = distinct_cameras(&entering),
        "rays entering target zone"
    );
    if distinct_cameras(&entering) < config.min_cameras {
        return Ok(Vec::new());
    }

    let mut detections = Vec::new();
    let mut stack = vec![WorkItem {
        voxel: target_zone,
        rays: entering,
    }];

    while let Some(WorkItem { voxel, rays }) = stack.pop() {
        if voxel.side() <= config.min_voxel_size {
            // The quorum held when this voxel was pushed; it is a leaf.
            detections.push(voxel);
            continue;
        }

        let n = effective_subdivision(voxel.side(), config);
        let buckets = sweep_level(&voxel, n, &rays, config);

        // Push children in decreasing flat index so the stack pops them in
        // increasing (ix, iy, iz), matching plain depth-first recursion.
        for (cell, bucket) in buckets.into_iter().enumerate().rev() {
            if distinct_cameras(&bucket) >= config.min_cameras {
                stack.push(WorkItem {
                    voxel: child_voxel(&voxel, n, cell),
                    rays: bucket,
                });
            }
        }
    }

    tracing::debug!(detections = detections.len(), "carve finished");
    Ok(detections)
}

/// Subdivision factor for a voxel of the given side, clamped so children
/// do not overshoot the minimum side: min(n, max(2, ⌊side / s_min⌋)).
fn effective_subdivision(side: f64, config: &CarveConfig) -> usize {
    let fit = (side / config.min_voxel_size).floor() as usize;
    config.subdivision.min(fit.max(2))
}

/// One carving level: route every ray (or its footprint pencil) through
/// the n×n×n grid over `parent`, collecting per-cell ray buckets.
fn sweep_level(parent: &Voxel, n: usize, rays: &[Ray], config: &CarveConfig) -> Vec<Vec<Ray>> {
    let cell_side = parent.side() / n as f64;
    let mut buckets: Vec<Vec<Ray>> = vec![Vec::new(); n * n * n];

    for ray in rays {
        let Some((t_enter, _)) = ray.intersect(parent) else {
            continue;
        };
        if ray.needs_split(t_enter, cell_side, config.footprint_ratio) {
            for sub in ray.split() {
                if let Some((t_sub, _)) = sub.intersect(parent) {
                    traverse_grid(parent, n, &sub, t_sub, &mut |cell| {
                        buckets[cell].push(sub);
                    });
                }
            }
        } else {
            traverse_grid(parent, n, ray, t_enter, &mut |cell| {
                buckets[cell].push(*ray);
            });
        }
    }
    buckets
}

/// Visit every cell of the n×n×n grid over `parent` crossed by `ray`,
/// entering at parametric distance `t_enter`, in traversal order.
///
/// Classic 3D DDA: per axis, `t_max` is the ray parameter at the next cell
/// boundary and `t_delta` the parameter width of one cell. Each step
/// advances the axis with the smallest `t_max` (lowest axis wins ties)
/// until an index leaves [0, n). Axes with zero direction never advance.
fn traverse_grid(
    parent: &Voxel,
    n: usize,
    ray: &Ray,
    t_enter: f64,
    visit: &mut impl FnMut(usize),
) {
    let cell_side = parent.side() / n as f64;
    let min = parent.min_corner();
    let entry = ray.origin + ray.direction * t_enter;

    let mut index = [0_i64; 3];
    let mut step = [0_i64; 3];
    let mut t_max = [f64::INFINITY; 3];
    let mut t_delta = [f64::INFINITY; 3];

    for i in 0..3 {
        let rel = (entry[i] - min[i]) / cell_side;
        index[i] = (rel.floor() as i64).clamp(0, n as i64 - 1);
        let d = ray.direction[i];
        step[i] = if d < 0.0 { -1 } else { 1 };
        if d != 0.0 {
            t_delta[i] = cell_side / d.abs();
            let next_boundary = if d > 0.0 {
                min[i] + (index[i] + 1) as f64 * cell_side
            } else {
                min[i] + index[i] as f64 * cell_side
            };
            t_max[i] = (next_boundary - ray.origin[i]) / d;
        }
    }

    loop {
        let flat = index[0] + index[1] * n as i64 + index[2] * (n * n) as i64;
        visit(flat as usize);

        let mut axis = 0;
        for i in 1..3 {
            if t_max[i] < t_max[axis] {
                axis = i;
            }
        }
        index[axis] += step[axis];
        if index[axis] < 0 || index[axis] >= n as i64 {
            return;
        }
        t_max[axis] += t_delta[axis];
    }
}

/// Center and half-extent of grid cell `cell` (flattened ix + iy·n + iz·n²).
fn child_voxel(parent: &Voxel, n: usize, cell: usize) -> Voxel {
    let ix = cell % n;
    let iy = (cell / n) % n;
    let iz = cell / (n * n);
    let cell_side = parent.side() / n as f64;
    let min = parent.min_corner();
    Voxel::new(
        nalgebra::Point3::new(
            min.x + (ix as f64 + 0.5) * cell_side,
            min.y + (iy as f64 + 0.5) * cell_side,
            min.z + (iz as f64 + 0.5) * cell_side,
        ),
        cell_side / 2.0,
    )
}

/// Number of distinct camera ids in the ray set.
fn distinct_cameras(rays: &[Ray]) -> usize {
    let mut ids: Vec<usize> = rays.iter().map(|r| r.camera_id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids.len()
}

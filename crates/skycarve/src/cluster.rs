//! Single-link spatial grouping of leaf detections.
//!
//! Voxels within epsilon of each other are neighbors; connected components
//! form clusters, filtered by a minimum size to reject stray leaves.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::Voxel;

/// Clustering parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Neighbor distance as a multiple of the minimum voxel side.
    pub epsilon_factor: f64,
    /// Components with fewer voxels are discarded as noise.
    pub min_cluster_size: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            epsilon_factor: 2.5,
            min_cluster_size: 3,
        }
    }
}

/// A group of nearby detections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Member voxels, in detection order.
    pub voxels: Vec<Voxel>,
    /// Arithmetic mean of the member centers.
    pub centroid: Point3<f64>,
}

/// Group detections into clusters by single-link connectivity.
///
/// Two voxels are linked when their centers are within
/// `epsilon_factor × min_voxel_size`. Components are found by BFS, so the
/// output order follows the first member of each component in detection
/// order; pairwise comparison is quadratic, which is fine at the detection
/// counts the carver produces.
pub fn cluster_detections(
    detections: &[Voxel],
    min_voxel_size: f64,
    config: &ClusterConfig,
) -> Vec<Cluster> {
    if detections.is_empty() {
        return Vec::new();
    }

    let epsilon_sq = (config.epsilon_factor * min_voxel_size).powi(2);
    let n = detections.len();

    let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        for j in i + 1..n {
            let d = detections[i].center - detections[j].center;
            if d.norm_squared() <= epsilon_sq {
                neighbors[i].push(j);
                neighbors[j].push(i);
            }
        }
    }

    let mut label = vec![usize::MAX; n];
    let mut components = 0;
    for start in 0..n {
        if label[start] != usize::MAX {
            continue;
        }
        label[start] = components;
        let mut queue = vec![start];
        let mut head = 0;
        while head < queue.len() {
            let current = queue[head];
            head += 1;
            for &next in &neighbors[current] {
                if label[next] == usize::MAX {
                    label[next] = components;
                    queue.push(next);
                }
            }
        }
        components += 1;
    }

    let mut members: Vec<Vec<Voxel>> = vec![Vec::new(); components];
    for (voxel, &component) in detections.iter().zip(&label) {
        members[component].push(*voxel);
    }

    members
        .into_iter()
        .filter(|voxels| voxels.len() >= config.min_cluster_size)
        .map(|voxels| {
            let sum: Vector3<f64> = voxels.iter().map(|v| v.center.coords).sum();
            Cluster {
                centroid: Point3::from(sum / voxels.len() as f64),
                voxels,
            }
        })
        .collect()
}

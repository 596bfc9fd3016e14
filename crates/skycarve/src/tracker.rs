//! Cross-frame track association.
//!
//! Matches incoming clusters to active tracks by minimum displacement.
//! Tracks must survive `min_age` frames before they are confirmed, which
//! rejects one-off noise; tracks unmatched for too long are erased.
//! Greedy matching in cluster input order is deliberate: the detector
//! handles at most a handful of simultaneous objects, and an assignment
//! solver could be substituted without changing this interface.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::cluster::Cluster;

/// Tracker parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Matched frames before a track is confirmed.
    pub min_age: usize,
    /// Consecutive unmatched frames before a track is erased.
    pub max_missing: usize,
    /// Maximum displacement (meters) to consider a match.
    pub max_distance: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_age: 3,
            max_missing: 5,
            max_distance: 5.0,
        }
    }
}

/// A position observed at a given frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedPosition {
    pub frame: u64,
    pub position: Point3<f64>,
}

/// A tracked object across frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Stable identifier; never reused within one tracker.
    pub id: u64,
    /// Observed positions, ordered by frame.
    pub positions: Vec<TimedPosition>,
    /// Number of frames this track was matched.
    pub age: usize,
    /// Consecutive frames without a match.
    pub missing: usize,
    /// Whether the track has survived `min_age` frames.
    pub confirmed: bool,
}

impl Track {
    /// Most recent observed position.
    pub fn last_position(&self) -> Point3<f64> {
        self.positions
            .last()
            .expect("tracks always hold at least one position")
            .position
    }
}

/// Associates clusters across frames. Exclusively owned by the caller;
/// one instance per camera rig.
#[derive(Debug, Default)]
pub struct ClusterTracker {
    config: TrackerConfig,
    tracks: Vec<Track>,
    next_id: u64,
}

impl ClusterTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TrackerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Process one frame of clusters. Call once per frame, in frame order.
    ///
    /// Never errors: clusters that match nothing simply spawn fresh
    /// tracks, and tracks that match nothing age toward erasure.
    pub fn update(&mut self, clusters: &[Cluster], frame: u64) {
        let mut track_matched = vec![false; self.tracks.len()];
        let mut cluster_matched = vec![false; clusters.len()];

        // Greedy: each cluster takes the closest still-unmatched track
        // within the displacement gate.
        for (ci, cluster) in clusters.iter().enumerate() {
            let mut best_distance = self.config.max_distance;
            let mut best_track = None;
            for (ti, track) in self.tracks.iter().enumerate() {
                if track_matched[ti] {
                    continue;
                }
                let distance = (cluster.centroid - track.last_position()).norm();
                if distance < best_distance {
                    best_distance = distance;
                    best_track = Some(ti);
                }
            }

            if let Some(ti) = best_track {
                track_matched[ti] = true;
                cluster_matched[ci] = true;
                let track = &mut self.tracks[ti];
                track.positions.push(TimedPosition {
                    frame,
                    position: cluster.centroid,
                });
                track.age += 1;
                track.missing = 0;
                if track.age >= self.config.min_age {
                    track.confirmed = true;
                }
            }
        }

        // Unmatched tracks age out.
        for (track, matched) in self.tracks.iter_mut().zip(&track_matched) {
            if !matched {
                track.missing += 1;
            }
        }
        let max_missing = self.config.max_missing;
        self.tracks.retain(|t| t.missing <= max_missing);

        // Unmatched clusters spawn tentative tracks.
        for (ci, cluster) in clusters.iter().enumerate() {
            if cluster_matched[ci] {
                continue;
            }
            self.tracks.push(Track {
                id: self.next_id,
                positions: vec![TimedPosition {
                    frame,
                    position: cluster.centroid,
                }],
                age: 1,
                missing: 0,
                confirmed: false,
            });
            self.next_id += 1;
        }
    }

    /// Tracks that have persisted long enough to be reported as real
    /// objects.
    pub fn confirmed_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(|t| t.confirmed)
    }

    /// All tracks, including tentative ones (useful for debug overlays).
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }
}

// src/detection/candidate_selector.rs

use crate::types::{DepthFrame, HandSample, Region};

/// Nearest detected region for this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub sample: HandSample,
    pub region: Region,
    pub index: usize,
    /// Whether the nearest distance lies inside the clipping distance
    pub within_clip: bool,
}

pub struct CandidateSelector {
    clipping_distance: f32,
    reject_beyond_clip: bool,
}

impl CandidateSelector {
    pub fn new(clipping_distance: f32, reject_beyond_clip: bool) -> Self {
        Self {
            clipping_distance,
            reject_beyond_clip,
        }
    }

    /// Pick the region whose center is nearest to the sensor.
    ///
    /// Returns `None` when there are no regions, or when the nearest one is
    /// beyond the clip and `reject_beyond_clip` is set. Ties keep the first
    /// region encountered.
    pub fn select(&self, regions: &[Region], depth: &DepthFrame) -> Option<Candidate> {
        let mut nearest: Option<(usize, f32)> = None;

        for (i, region) in regions.iter().enumerate() {
            let (cx, cy) = region.center();
            let distance = depth.distance_at(cx, cy);
            match nearest {
                Some((_, best)) if best <= distance => {}
                _ => nearest = Some((i, distance)),
            }
        }

        let (index, distance) = nearest?;
        let region = regions[index];
        let (x, y) = region.center();
        let within_clip = distance <= self.clipping_distance;

        if !within_clip && self.reject_beyond_clip {
            return None;
        }

        Some(Candidate {
            sample: HandSample { distance, x, y },
            region,
            index,
            within_clip,
        })
    }
}

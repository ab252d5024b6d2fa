// src/pipeline/frame_context.rs
//
// Everything the pipeline decided about one frame.

use crate::analysis::Delivery;
use crate::detection::Candidate;
use crate::types::{GestureEvent, Region};

#[derive(Debug, Clone)]
pub struct FrameContext {
    pub frame_id: u64,
    pub timestamp_ms: f64,
    pub had_depth: bool,
    pub gated_pixels: usize,
    pub regions: Vec<Region>,
    pub candidate: Option<Candidate>,
    pub gesture: GestureEvent,
    pub delivery: Delivery,
}

impl FrameContext {
    pub fn new(frame_id: u64, timestamp_ms: f64) -> Self {
        Self {
            frame_id,
            timestamp_ms,
            had_depth: false,
            gated_pixels: 0,
            regions: Vec::new(),
            candidate: None,
            gesture: GestureEvent::NoMotion,
            delivery: Delivery::Skipped,
        }
    }

    /// Did this frame produce a sample for the motion detectors?
    #[cfg(test)]
    pub fn has_hand(&self) -> bool {
        self.candidate.is_some()
    }

    /// The region to highlight, if the hand is inside the clipping distance
    pub fn highlighted_region(&self) -> Option<Region> {
        self.candidate
            .as_ref()
            .filter(|c| c.within_clip)
            .map(|c| c.region)
    }
}

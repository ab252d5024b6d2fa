// src/detection/mod.rs
//
// Hand localization. A detector turns the gated color image into
// candidate regions; the selector reduces them to one HandSample.

mod candidate_selector;
mod cascade;
mod onnx;

pub use candidate_selector::{Candidate, CandidateSelector};
pub use cascade::CascadeHandDetector;
pub use onnx::OnnxHandDetector;

use crate::types::{ColorFrame, DetectorConfig, DetectorKind, Region};
use anyhow::Result;

/// Finds candidate hand regions in a color image
pub trait HandDetector {
    fn detect(&mut self, image: &ColorFrame) -> Result<Vec<Region>>;
}

pub fn build_detector(config: &DetectorConfig) -> Result<Box<dyn HandDetector>> {
    let detector: Box<dyn HandDetector> = match config.kind {
        DetectorKind::Cascade => Box::new(CascadeHandDetector::new(config)?),
        DetectorKind::Onnx => Box::new(OnnxHandDetector::new(config)?),
    };
    Ok(detector)
}

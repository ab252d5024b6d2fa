// src/pipeline/orchestrator.rs
//
// One frame end to end:
//   FramePair → DepthGate → HandDetector → CandidateSelector
//             → GestureDispatcher → EventSink

use super::event_sink::EventSink;
use super::frame_context::FrameContext;
use super::metrics::{MetricsSummary, PipelineMetrics};
use crate::analysis::{Delivery, GestureDispatcher};
use crate::depth_gate::DepthGate;
use crate::detection::{CandidateSelector, HandDetector};
use crate::frame_source::FrameSource;
use crate::types::{Config, FramePair};
use anyhow::Result;
use std::time::Instant;
use tracing::{debug, info, warn};

const PROGRESS_EVERY_FRAMES: u64 = 300;

pub struct PipelineOrchestrator {
    gate: DepthGate,
    detector: Box<dyn HandDetector>,
    selector: CandidateSelector,
    dispatcher: GestureDispatcher,
    sink: Box<dyn EventSink>,
    metrics: PipelineMetrics,
    next_frame_id: u64,
}

impl PipelineOrchestrator {
    pub fn new(
        config: &Config,
        detector: Box<dyn HandDetector>,
        sink: Box<dyn EventSink>,
    ) -> Result<Self> {
        let gate = DepthGate::new(&config.depth_gate);
        let selector = CandidateSelector::new(
            config.depth_gate.clipping_distance,
            config.selector.reject_beyond_clip,
        );
        let dispatcher = GestureDispatcher::new(&config.motion)?;

        Ok(Self {
            gate,
            detector,
            selector,
            dispatcher,
            sink,
            metrics: PipelineMetrics::new(),
            next_frame_id: 0,
        })
    }

    #[cfg(test)]
    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    pub fn process_frame(&mut self, pair: FramePair) -> Result<FrameContext> {
        let frame_id = self.next_frame_id;
        self.next_frame_id += 1;
        self.metrics.inc(&self.metrics.total_frames);

        let FramePair { mut color, depth } = pair;
        let mut ctx = FrameContext::new(frame_id, color.timestamp_ms);
        ctx.had_depth = depth.is_some();
        if ctx.had_depth {
            self.metrics.inc(&self.metrics.frames_with_depth);
        }

        let t = Instant::now();
        ctx.gated_pixels = self.gate.segment(&mut color, depth.as_ref())?;
        self.metrics
            .set_timing(&self.metrics.gate_time_us, t.elapsed().as_micros() as u64);

        let t = Instant::now();
        ctx.regions = self.detector.detect(&color)?;
        self.metrics
            .set_timing(&self.metrics.detect_time_us, t.elapsed().as_micros() as u64);

        // Without usable depth there is no distance to rank candidates by;
        // the frame is dropped for windowing purposes. Same rule as the gate.
        ctx.candidate = match depth.as_ref().filter(|d| d.matches(&color)) {
            Some(d) => self.selector.select(&ctx.regions, d),
            None => {
                if !ctx.regions.is_empty() {
                    debug!(
                        "Frame {}: {} regions but no usable depth, skipping",
                        frame_id,
                        ctx.regions.len()
                    );
                }
                None
            }
        };

        let Some(candidate) = ctx.candidate else {
            return Ok(ctx);
        };

        self.metrics.inc(&self.metrics.frames_with_hand);
        match ctx.highlighted_region() {
            Some(region) => debug!(
                "Frame {}: hand #{} at {:?}, {:.3}m",
                frame_id, candidate.index, region, candidate.sample.distance
            ),
            None => {
                self.metrics.inc(&self.metrics.frames_beyond_clip);
                debug!(
                    "Frame {}: nearest hand {:.3}m is beyond the clip",
                    frame_id, candidate.sample.distance
                );
            }
        }

        let outcome = self
            .dispatcher
            .dispatch(&candidate.sample, self.sink.as_mut());
        ctx.gesture = outcome.gesture;
        ctx.delivery = outcome.delivery;

        self.metrics.record_gesture(outcome.gesture);
        match outcome.delivery {
            Delivery::Delivered => self.metrics.inc(&self.metrics.deliveries_ok),
            Delivery::Failed => self.metrics.inc(&self.metrics.delivery_failures),
            Delivery::Skipped => {}
        }

        Ok(ctx)
    }

    /// Process frames until the source ends. A frame that fails is logged
    /// and skipped; a failing source ends the run.
    pub fn run(&mut self, source: &mut dyn FrameSource) -> Result<MetricsSummary> {
        while let Some(pair) = source.next_frame()? {
            let ctx = match self.process_frame(pair) {
                Ok(ctx) => ctx,
                Err(e) => {
                    warn!("Frame {} failed: {:#}", self.next_frame_id - 1, e);
                    continue;
                }
            };
            debug!(
                "Frame {} @ {:.0}ms | depth: {} | gated: {} | regions: {} | {} ({:?})",
                ctx.frame_id,
                ctx.timestamp_ms,
                ctx.had_depth,
                ctx.gated_pixels,
                ctx.regions.len(),
                ctx.gesture,
                ctx.delivery
            );

            if self.next_frame_id % PROGRESS_EVERY_FRAMES == 0 {
                let summary = self.metrics.summary();
                info!(
                    "Frames: {} | hand: {} | gestures: {} | {:.1} FPS",
                    summary.total_frames,
                    summary.frames_with_hand,
                    summary.gestures.total(),
                    summary.fps
                );
            }
        }

        Ok(self.metrics.summary())
    }
}

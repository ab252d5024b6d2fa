// src/pipeline/metrics.rs
//
// Counters and last-frame timings for the gesture pipeline. A summary
// is logged as JSON when the source is exhausted.

use crate::types::GestureEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub total_frames: Arc<AtomicU64>,
    pub frames_with_depth: Arc<AtomicU64>,
    pub frames_with_hand: Arc<AtomicU64>,
    pub frames_beyond_clip: Arc<AtomicU64>,
    pub pull: Arc<AtomicU64>,
    pub push: Arc<AtomicU64>,
    pub left: Arc<AtomicU64>,
    pub right: Arc<AtomicU64>,
    pub down: Arc<AtomicU64>,
    pub up: Arc<AtomicU64>,
    pub deliveries_ok: Arc<AtomicU64>,
    pub delivery_failures: Arc<AtomicU64>,
    pub gate_time_us: Arc<AtomicU64>,
    pub detect_time_us: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: Arc::new(AtomicU64::new(0)),
            frames_with_depth: Arc::new(AtomicU64::new(0)),
            frames_with_hand: Arc::new(AtomicU64::new(0)),
            frames_beyond_clip: Arc::new(AtomicU64::new(0)),
            pull: Arc::new(AtomicU64::new(0)),
            push: Arc::new(AtomicU64::new(0)),
            left: Arc::new(AtomicU64::new(0)),
            right: Arc::new(AtomicU64::new(0)),
            down: Arc::new(AtomicU64::new(0)),
            up: Arc::new(AtomicU64::new(0)),
            deliveries_ok: Arc::new(AtomicU64::new(0)),
            delivery_failures: Arc::new(AtomicU64::new(0)),
            gate_time_us: Arc::new(AtomicU64::new(0)),
            detect_time_us: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_timing(&self, counter: &AtomicU64, duration_us: u64) {
        counter.store(duration_us, Ordering::Relaxed);
    }

    pub fn record_gesture(&self, gesture: GestureEvent) {
        let counter = match gesture {
            GestureEvent::NoMotion => return,
            GestureEvent::Pull => &self.pull,
            GestureEvent::Push => &self.push,
            GestureEvent::Left => &self.left,
            GestureEvent::Right => &self.right,
            GestureEvent::Down => &self.down,
            GestureEvent::Up => &self.up,
        };
        self.inc(counter);
    }

    pub fn fps(&self) -> f64 {
        let frames = self.total_frames.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSummary {
            total_frames: load(&self.total_frames),
            fps: self.fps(),
            frames_with_depth: load(&self.frames_with_depth),
            frames_with_hand: load(&self.frames_with_hand),
            frames_beyond_clip: load(&self.frames_beyond_clip),
            gestures: GestureCounts {
                pull: load(&self.pull),
                push: load(&self.push),
                left: load(&self.left),
                right: load(&self.right),
                down: load(&self.down),
                up: load(&self.up),
            },
            deliveries_ok: load(&self.deliveries_ok),
            delivery_failures: load(&self.delivery_failures),
            last_gate_us: load(&self.gate_time_us),
            last_detect_us: load(&self.detect_time_us),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct GestureCounts {
    pub pull: u64,
    pub push: u64,
    pub left: u64,
    pub right: u64,
    pub down: u64,
    pub up: u64,
}

impl GestureCounts {
    pub fn total(&self) -> u64 {
        self.pull + self.push + self.left + self.right + self.down + self.up
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub fps: f64,
    pub frames_with_depth: u64,
    pub frames_with_hand: u64,
    pub frames_beyond_clip: u64,
    pub gestures: GestureCounts,
    pub deliveries_ok: u64,
    pub delivery_failures: u64,
    pub last_gate_us: u64,
    pub last_detect_us: u64,
    pub elapsed_secs: f64,
}

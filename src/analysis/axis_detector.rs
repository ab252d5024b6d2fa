// src/analysis/axis_detector.rs
//
// Sliding-window directional classifier for a single axis. A gesture
// fires only when every consecutive step in the window moves past the
// threshold in the same direction.

use crate::types::GestureEvent;
use anyhow::{bail, Result};
use std::collections::VecDeque;
use std::fmt;
use tracing::debug;

// ============================================================================
// AXIS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Pixel column
    X,
    /// Pixel row
    Y,
    /// Distance from the sensor
    Z,
}

impl Axis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
        }
    }

    /// Gesture for an increasing coordinate
    pub fn positive(&self) -> GestureEvent {
        match self {
            Self::X => GestureEvent::Right,
            Self::Y => GestureEvent::Down,
            Self::Z => GestureEvent::Push,
        }
    }

    /// Gesture for a decreasing coordinate
    pub fn negative(&self) -> GestureEvent {
        match self {
            Self::X => GestureEvent::Left,
            Self::Y => GestureEvent::Up,
            Self::Z => GestureEvent::Pull,
        }
    }
}

// ============================================================================
// SCALAR
// ============================================================================

/// Scalar a motion window can hold
pub trait AxisValue: Copy + PartialOrd + fmt::Debug {
    /// `next - self`
    fn delta_to(self, next: Self) -> Self;
    fn negated(self) -> Self;
    fn is_positive(self) -> bool;
}

impl AxisValue for i32 {
    fn delta_to(self, next: Self) -> Self {
        next.saturating_sub(self)
    }

    fn negated(self) -> Self {
        self.saturating_neg()
    }

    fn is_positive(self) -> bool {
        self > 0
    }
}

impl AxisValue for f32 {
    fn delta_to(self, next: Self) -> Self {
        next - self
    }

    fn negated(self) -> Self {
        -self
    }

    fn is_positive(self) -> bool {
        self.is_finite() && self > 0.0
    }
}

// ============================================================================
// DETECTOR
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    NoMotion,
    Positive(GestureEvent),
    Negative(GestureEvent),
}

impl Verdict {
    pub fn gesture(&self) -> GestureEvent {
        match self {
            Self::NoMotion => GestureEvent::NoMotion,
            Self::Positive(g) | Self::Negative(g) => *g,
        }
    }
}

pub struct AxisMotionDetector<T: AxisValue> {
    axis: Axis,
    window: VecDeque<T>,
    window_size: usize,
    threshold: T,
}

impl<T: AxisValue> AxisMotionDetector<T> {
    pub fn new(axis: Axis, window_size: usize, threshold: T) -> Result<Self> {
        if window_size < 2 {
            bail!(
                "{} axis: window size must be at least 2 (got {})",
                axis.as_str(),
                window_size
            );
        }
        if !threshold.is_positive() {
            bail!(
                "{} axis: threshold must be positive (got {:?})",
                axis.as_str(),
                threshold
            );
        }

        Ok(Self {
            axis,
            window: VecDeque::with_capacity(window_size + 1),
            window_size,
            threshold,
        })
    }

    /// Feed one observation and classify the current window.
    ///
    /// The window is cleared only when a gesture fires. A rejected window
    /// keeps its last `window_size` values so the next frame re-tests it.
    pub fn observe(&mut self, value: T) -> Verdict {
        self.window.push_back(value);

        if self.window.len() <= self.window_size {
            return Verdict::NoMotion;
        }
        self.window.pop_front();

        let lower = self.threshold.negated();
        let mut steps: i64 = 0;
        for (prev, next) in self.window.iter().zip(self.window.iter().skip(1)) {
            let delta = prev.delta_to(*next);
            if delta > self.threshold {
                steps += 1;
            } else if delta < lower {
                steps -= 1;
            } else {
                return Verdict::NoMotion;
            }
        }

        let full_run = (self.window_size - 1) as i64;
        let verdict = if steps == full_run {
            Verdict::Positive(self.axis.positive())
        } else if steps == -full_run {
            Verdict::Negative(self.axis.negative())
        } else {
            // Steps of mixed sign: not a sweep, keep accumulating
            return Verdict::NoMotion;
        };

        debug!(
            "{} axis fired {} over {:?}",
            self.axis.as_str(),
            verdict.gesture(),
            self.window
        );
        self.window.clear();
        verdict
    }

    #[cfg(test)]
    pub fn window_len(&self) -> usize {
        self.window.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed<T: AxisValue>(detector: &mut AxisMotionDetector<T>, values: &[T]) -> Vec<Verdict> {
        values.iter().map(|&v| detector.observe(v)).collect()
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(AxisMotionDetector::new(Axis::X, 1, 10).is_err());
        assert!(AxisMotionDetector::new(Axis::X, 5, 0).is_err());
        assert!(AxisMotionDetector::new(Axis::Y, 5, -3).is_err());
        assert!(AxisMotionDetector::new(Axis::Z, 5, 0.0f32).is_err());
        assert!(AxisMotionDetector::new(Axis::Z, 5, f32::NAN).is_err());
        assert!(AxisMotionDetector::new(Axis::Z, 5, 0.015f32).is_ok());
    }

    #[test]
    fn test_insufficient_history_never_fires() {
        let mut det = AxisMotionDetector::new(Axis::X, 5, 10).unwrap();
        let verdicts = feed(&mut det, &[0, 100, 200, 300, 400]);
        assert!(verdicts.iter().all(|v| *v == Verdict::NoMotion));
        assert_eq!(det.window_len(), 5);
    }

    #[test]
    fn test_scenario_right_fires_after_trim() {
        let mut det = AxisMotionDetector::new(Axis::X, 5, 10).unwrap();
        let verdicts = feed(&mut det, &[0, 0, 0, 0, 0, 20, 35, 50, 65, 80]);

        for (i, v) in verdicts.iter().enumerate() {
            if i == 8 {
                assert_eq!(*v, Verdict::Positive(GestureEvent::Right), "sample {}", i + 1);
            } else {
                assert_eq!(*v, Verdict::NoMotion, "sample {}", i + 1);
            }
        }
        // Cleared on sample 9, then sample 10 starts a fresh window
        assert_eq!(det.window_len(), 1);
    }

    #[test]
    fn test_scenario_reversal_keeps_window() {
        let mut det = AxisMotionDetector::new(Axis::X, 5, 10).unwrap();
        let verdicts = feed(&mut det, &[0, 20, 40, 25, 60]);
        assert!(verdicts.iter().all(|v| *v == Verdict::NoMotion));
        assert_eq!(det.window_len(), 5);

        // Window fills: [20, 40, 25, 60, 80] has a -15 step, mixed signs
        assert_eq!(det.observe(80), Verdict::NoMotion);
        assert_eq!(det.window_len(), 5);
    }

    #[test]
    fn test_monotonic_run_fires_and_clears() {
        let mut det = AxisMotionDetector::new(Axis::Y, 5, 10).unwrap();
        let verdicts = feed(&mut det, &[0, 11, 22, 33, 44, 55]);
        assert_eq!(verdicts[5], Verdict::Positive(GestureEvent::Down));
        assert_eq!(det.window_len(), 0);

        // A fresh window needs another N + 1 samples
        let verdicts = feed(&mut det, &[66, 77, 88, 99, 110]);
        assert!(verdicts.iter().all(|v| *v == Verdict::NoMotion));
        assert_eq!(det.observe(121), Verdict::Positive(GestureEvent::Down));
    }

    #[test]
    fn test_single_small_step_suppresses() {
        // Each position of the quiet step inside the evaluated window
        for quiet in 2..=5 {
            let mut det = AxisMotionDetector::new(Axis::X, 5, 10).unwrap();
            let mut value = 0;
            let mut values = vec![value];
            for step in 1..=5 {
                value += if step == quiet { 10 } else { 20 };
                values.push(value);
            }
            let verdicts = feed(&mut det, &values);
            assert!(
                verdicts.iter().all(|v| *v == Verdict::NoMotion),
                "quiet step at {} should suppress",
                quiet
            );
            assert_eq!(det.window_len(), 5);
        }
    }

    #[test]
    fn test_rejected_frame_can_age_out() {
        let mut det = AxisMotionDetector::new(Axis::X, 5, 10).unwrap();
        // Quiet pair (20, 25) inside the first full window
        let verdicts = feed(&mut det, &[0, 20, 25, 40, 60, 80]);
        assert_eq!(verdicts[5], Verdict::NoMotion);
        // Once (20, 25) ages out the window is [25, 40, 60, 80, 100]
        assert_eq!(det.observe(100), Verdict::Positive(GestureEvent::Right));
    }

    #[test]
    fn test_negated_run_flips_label_on_same_axis() {
        let run = [0, 15, 30, 45, 60, 75];
        let negated: Vec<i32> = run.iter().map(|v| -v).collect();

        for axis in [Axis::X, Axis::Y] {
            let mut up = AxisMotionDetector::new(axis, 5, 10).unwrap();
            let mut down = AxisMotionDetector::new(axis, 5, 10).unwrap();
            let pos = *feed(&mut up, &run).last().unwrap();
            let neg = *feed(&mut down, &negated).last().unwrap();
            assert_eq!(pos, Verdict::Positive(axis.positive()));
            assert_eq!(neg, Verdict::Negative(axis.negative()));
        }
    }

    #[test]
    fn test_depth_axis_labels() {
        let mut away = AxisMotionDetector::new(Axis::Z, 5, 0.015f32).unwrap();
        let verdicts = feed(&mut away, &[0.50, 0.52, 0.54, 0.56, 0.58, 0.60]);
        assert_eq!(verdicts[5], Verdict::Positive(GestureEvent::Push));

        let mut toward = AxisMotionDetector::new(Axis::Z, 5, 0.015f32).unwrap();
        let verdicts = feed(&mut toward, &[0.60, 0.58, 0.56, 0.54, 0.52, 0.50]);
        assert_eq!(verdicts[5], Verdict::Negative(GestureEvent::Pull));
    }

    #[test]
    fn test_depth_jitter_is_noise() {
        let mut det = AxisMotionDetector::new(Axis::Z, 5, 0.015f32).unwrap();
        let verdicts = feed(&mut det, &[0.50, 0.51, 0.50, 0.51, 0.50, 0.51, 0.50]);
        assert!(verdicts.iter().all(|v| *v == Verdict::NoMotion));
    }

    #[test]
    fn test_missing_depth_spike_never_reverses_direction() {
        // 0.0 is a center pixel without a sensor return
        let mut away = AxisMotionDetector::new(Axis::Z, 5, 0.015f32).unwrap();
        let verdicts = feed(
            &mut away,
            &[0.50, 0.53, 0.56, 0.0, 0.62, 0.65, 0.68, 0.71, 0.74],
        );
        assert!(verdicts[..7].iter().all(|v| *v == Verdict::NoMotion));
        assert_eq!(verdicts[7], Verdict::Positive(GestureEvent::Push));
        assert_eq!(verdicts[8], Verdict::NoMotion);

        let mut toward = AxisMotionDetector::new(Axis::Z, 5, 0.015f32).unwrap();
        let verdicts = feed(
            &mut toward,
            &[0.80, 0.77, 0.74, 0.0, 0.68, 0.65, 0.62, 0.59, 0.56],
        );
        assert!(verdicts[..8].iter().all(|v| *v == Verdict::NoMotion));
        assert_eq!(verdicts[8], Verdict::Negative(GestureEvent::Pull));
    }

    #[test]
    fn test_nan_distance_is_rejected() {
        let mut det = AxisMotionDetector::new(Axis::Z, 3, 0.015f32).unwrap();
        let verdicts = feed(&mut det, &[0.50, 0.60, f32::NAN, 0.80]);
        assert!(verdicts.iter().all(|v| *v == Verdict::NoMotion));
    }

    #[test]
    fn test_step_equal_to_threshold_is_noise() {
        let mut det = AxisMotionDetector::new(Axis::X, 3, 10).unwrap();
        let verdicts = feed(&mut det, &[0, 10, 20, 30]);
        assert!(verdicts.iter().all(|v| *v == Verdict::NoMotion));
    }
}

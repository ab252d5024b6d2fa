// src/analysis/gesture_dispatcher.rs

use super::axis_detector::{Axis, AxisMotionDetector};
use crate::pipeline::EventSink;
use crate::types::{GestureEvent, HandSample, MotionConfig};
use anyhow::Result;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Nothing to send this frame
    Skipped,
    Delivered,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub gesture: GestureEvent,
    pub delivery: Delivery,
}

/// Runs the X, Y and Z detectors in priority order on each sample
pub struct GestureDispatcher {
    x: AxisMotionDetector<i32>,
    y: AxisMotionDetector<i32>,
    z: AxisMotionDetector<f32>,
}

impl GestureDispatcher {
    pub fn new(config: &MotionConfig) -> Result<Self> {
        Ok(Self {
            x: AxisMotionDetector::new(Axis::X, config.window_size, config.threshold_x)?,
            y: AxisMotionDetector::new(Axis::Y, config.window_size, config.threshold_y)?,
            z: AxisMotionDetector::new(Axis::Z, config.window_size, config.threshold_z)?,
        })
    }

    /// Advance all three windows and return the highest-priority gesture.
    ///
    /// Every detector observes the sample even when an earlier axis already
    /// fired, so no window skips a frame.
    pub fn classify(&mut self, sample: &HandSample) -> GestureEvent {
        let verdicts = [
            self.x.observe(sample.x),
            self.y.observe(sample.y),
            self.z.observe(sample.distance),
        ];

        verdicts
            .iter()
            .map(|v| v.gesture())
            .find(GestureEvent::is_motion)
            .unwrap_or(GestureEvent::NoMotion)
    }

    /// Classify the sample and forward any gesture to `sink`.
    /// A delivery failure is logged and reported, never propagated.
    pub fn dispatch(&mut self, sample: &HandSample, sink: &mut dyn EventSink) -> DispatchOutcome {
        let gesture = self.classify(sample);
        if !gesture.is_motion() {
            return DispatchOutcome {
                gesture,
                delivery: Delivery::Skipped,
            };
        }

        info!(
            "✋ {} at ({}, {}) {:.3}m",
            gesture, sample.x, sample.y, sample.distance
        );

        let delivery = match sink.deliver(gesture) {
            Ok(()) => Delivery::Delivered,
            Err(e) => {
                warn!("Failed to deliver '{}': {:#}", gesture, e);
                Delivery::Failed
            }
        };

        DispatchOutcome { gesture, delivery }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    #[derive(Default)]
    struct RecordingSink {
        delivered: Vec<GestureEvent>,
        fail: bool,
    }

    impl EventSink for RecordingSink {
        fn deliver(&mut self, event: GestureEvent) -> Result<()> {
            assert!(event.is_motion(), "NoMotion must never reach the sink");
            if self.fail {
                bail!("consumer went away");
            }
            self.delivered.push(event);
            Ok(())
        }
    }

    fn config() -> MotionConfig {
        MotionConfig {
            window_size: 5,
            threshold_x: 10,
            threshold_y: 10,
            threshold_z: 0.015,
        }
    }

    fn sample(x: i32, y: i32, distance: f32) -> HandSample {
        HandSample { distance, x, y }
    }

    #[test]
    fn test_still_hand_is_no_motion() {
        let mut dispatcher = GestureDispatcher::new(&config()).unwrap();
        let mut sink = RecordingSink::default();
        for _ in 0..20 {
            let outcome = dispatcher.dispatch(&sample(100, 100, 0.5), &mut sink);
            assert_eq!(outcome.gesture, GestureEvent::NoMotion);
            assert_eq!(outcome.delivery, Delivery::Skipped);
        }
        assert!(sink.delivered.is_empty());
    }

    #[test]
    fn test_horizontal_sweep_delivers_left() {
        let mut dispatcher = GestureDispatcher::new(&config()).unwrap();
        let mut sink = RecordingSink::default();
        let mut last = None;
        for i in 0..6 {
            last = Some(dispatcher.dispatch(&sample(300 - i * 20, 200, 0.5), &mut sink));
        }
        assert_eq!(
            last,
            Some(DispatchOutcome {
                gesture: GestureEvent::Left,
                delivery: Delivery::Delivered,
            })
        );
        assert_eq!(sink.delivered, vec![GestureEvent::Left]);
    }

    #[test]
    fn test_x_outranks_y_and_z() {
        let mut dispatcher = GestureDispatcher::new(&config()).unwrap();
        let mut result = GestureEvent::NoMotion;
        // Diagonal push: all three axes sweep together
        for i in 0..6 {
            result = dispatcher.classify(&sample(i * 20, i * 20, 0.3 + i as f32 * 0.05));
        }
        assert_eq!(result, GestureEvent::Right);
    }

    #[test]
    fn test_lower_priority_axes_still_advance() {
        let mut dispatcher = GestureDispatcher::new(&config()).unwrap();
        for i in 0..6 {
            dispatcher.classify(&sample(i * 20, i * 20, 0.5));
        }
        // Y fired alongside X and was cleared too; Z kept its trimmed window
        assert_eq!(dispatcher.x.window_len(), 0);
        assert_eq!(dispatcher.y.window_len(), 0);
        assert_eq!(dispatcher.z.window_len(), 5);
    }

    #[test]
    fn test_y_wins_when_x_is_still() {
        let mut dispatcher = GestureDispatcher::new(&config()).unwrap();
        let mut result = GestureEvent::NoMotion;
        for i in 0..6 {
            result = dispatcher.classify(&sample(320, 400 - i * 15, 0.3 + i as f32 * 0.05));
        }
        assert_eq!(result, GestureEvent::Up);
    }

    #[test]
    fn test_depth_only_motion_is_pull() {
        let mut dispatcher = GestureDispatcher::new(&config()).unwrap();
        let mut result = GestureEvent::NoMotion;
        for i in 0..6 {
            result = dispatcher.classify(&sample(320, 240, 0.8 - i as f32 * 0.05));
        }
        assert_eq!(result, GestureEvent::Pull);
    }

    #[test]
    fn test_delivery_failure_is_not_fatal() {
        let mut dispatcher = GestureDispatcher::new(&config()).unwrap();
        let mut sink = RecordingSink {
            fail: true,
            ..Default::default()
        };

        let mut last = None;
        for i in 0..6 {
            last = Some(dispatcher.dispatch(&sample(i * 20, 0, 0.5), &mut sink));
        }
        assert_eq!(last.unwrap().delivery, Delivery::Failed);

        // Consumer recovers; processing simply continues
        sink.fail = false;
        let outcomes: Vec<DispatchOutcome> = (0..6)
            .map(|i| dispatcher.dispatch(&sample(0, i * 20, 0.5), &mut sink))
            .collect();
        assert!(outcomes.contains(&DispatchOutcome {
            gesture: GestureEvent::Down,
            delivery: Delivery::Delivered,
        }));
        assert_eq!(sink.delivered, vec![GestureEvent::Down]);
    }

    #[test]
    fn test_bad_config_fails_fast() {
        let mut bad = config();
        bad.threshold_z = 0.0;
        assert!(GestureDispatcher::new(&bad).is_err());

        let mut bad = config();
        bad.window_size = 1;
        assert!(GestureDispatcher::new(&bad).is_err());
    }
}

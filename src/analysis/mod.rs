// src/analysis/mod.rs
//
// Gesture classification.
//
// Signal flow:
//   HandSample.x        → X detector ─┐
//   HandSample.y        → Y detector ─┼→ gesture_dispatcher → EventSink
//   HandSample.distance → Z detector ─┘

pub mod axis_detector;
pub mod gesture_dispatcher;

pub use gesture_dispatcher::{Delivery, GestureDispatcher};

// src/pipeline/mod.rs

pub mod event_sink;
pub mod frame_context;
pub mod metrics;
pub mod orchestrator;

pub use event_sink::{build_sink, EventSink};
pub use orchestrator::PipelineOrchestrator;

// src/pipeline/event_sink.rs
//
// Outbound transport for gesture events. The consumer reads bare
// tokens ("push", "left", ...) from a named pipe or FIFO.

use crate::types::{GestureEvent, TransportConfig, TransportKind};
use anyhow::{bail, Context, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

pub trait EventSink {
    /// Deliver one gesture. Never called with `NoMotion`.
    fn deliver(&mut self, event: GestureEvent) -> Result<()>;
}

pub fn build_sink(config: &TransportConfig) -> Box<dyn EventSink> {
    match config.kind {
        TransportKind::Pipe => Box::new(PipeSink::connect(&config.pipe_path)),
        TransportKind::Log => {
            info!("Gesture events will only be logged");
            Box::new(LogSink)
        }
    }
}

// ============================================================================
// NAMED PIPE
// ============================================================================

/// Writes wire tokens to a pipe the consumer created beforehand.
///
/// A failed connect or write drops the handle; the next delivery
/// reopens the pipe.
pub struct PipeSink {
    path: PathBuf,
    handle: Option<File>,
}

impl PipeSink {
    pub fn connect(path: &str) -> Self {
        let mut sink = Self {
            path: PathBuf::from(path),
            handle: None,
        };
        match sink.open() {
            Ok(()) => info!("✓ Connected to event pipe {}", path),
            Err(e) => warn!("Failed to connect to event pipe {}: {:#}", path, e),
        }
        sink
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    fn open(&mut self) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .with_context(|| format!("Cannot open {}", self.path.display()))?;
        self.handle = Some(file);
        Ok(())
    }
}

impl EventSink for PipeSink {
    fn deliver(&mut self, event: GestureEvent) -> Result<()> {
        let Some(token) = event.wire_token() else {
            bail!("NoMotion is not a deliverable gesture");
        };

        if !self.is_connected() {
            self.open()?;
            info!("✓ Reconnected to event pipe {}", self.path.display());
        }
        let Some(file) = self.handle.as_mut() else {
            bail!("Event pipe {} is not connected", self.path.display());
        };

        let written = file
            .write_all(token.as_bytes())
            .and_then(|_| file.flush());
        if let Err(e) = written {
            self.handle = None;
            return Err(e).with_context(|| format!("Failed to send '{}'", token));
        }
        Ok(())
    }
}

// ============================================================================
// LOG ONLY
// ============================================================================

/// Dry-run sink for running without a consumer process
pub struct LogSink;

impl EventSink for LogSink {
    fn deliver(&mut self, event: GestureEvent) -> Result<()> {
        if !event.is_motion() {
            bail!("NoMotion is not a deliverable gesture");
        }
        info!("👋 Gesture: {}", event);
        Ok(())
    }
}

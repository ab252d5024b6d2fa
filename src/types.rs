// src/types.rs

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub depth_gate: DepthGateConfig,
    pub detector: DetectorConfig,
    pub motion: MotionConfig,
    pub selector: SelectorConfig,
    pub transport: TransportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Video file path, or a camera index such as "0"
    pub color: String,
    /// Directory of 16-bit depth PNGs aligned to the color stream
    pub depth_dir: String,
    /// Meters per raw depth unit
    pub depth_scale: f32,
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthGateConfig {
    /// Maximum foreground distance in meters
    pub clipping_distance: f32,
    /// Byte written over every channel of a background pixel
    pub fill_value: u8,
    /// Row-band worker threads
    pub workers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    Cascade,
    Onnx,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub kind: DetectorKind,
    pub model_path: String,
    // Cascade parameters
    pub scale_factor: f64,
    pub min_neighbors: i32,
    pub min_size: i32,
    // ONNX parameters
    pub confidence_threshold: f32,
    pub nms_iou: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub window_size: usize,
    pub threshold_x: i32,
    pub threshold_y: i32,
    pub threshold_z: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Drop the frame's sample when the nearest candidate lies beyond the clip
    pub reject_beyond_clip: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Pipe,
    Log,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub kind: TransportKind,
    pub pipe_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

// ============================================================================
// FRAMES
// ============================================================================

/// Interleaved 8-bit image, BGR order when it comes from OpenCV
#[derive(Debug, Clone)]
pub struct ColorFrame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub bytes_per_pixel: usize,
    pub timestamp_ms: f64,
}

impl ColorFrame {
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    pub fn row_stride(&self) -> usize {
        self.width * self.bytes_per_pixel
    }
}

/// Raw 16-bit depth map aligned pixel-for-pixel to the color frame
#[derive(Debug, Clone)]
pub struct DepthFrame {
    pub data: Vec<u16>,
    pub width: usize,
    pub height: usize,
    /// Meters per raw unit
    pub depth_scale: f32,
}

impl DepthFrame {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() || self.width == 0 || self.height == 0
    }

    /// Usable as a per-pixel map for `color`: non-empty, same size, fully populated
    pub fn matches(&self, color: &ColorFrame) -> bool {
        !self.is_empty()
            && self.width == color.width
            && self.height == color.height
            && self.data.len() >= color.pixel_count()
    }

    /// Distance in meters at (x, y). Out-of-bounds reads as 0.0 (no return).
    pub fn distance_at(&self, x: i32, y: i32) -> f32 {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return 0.0;
        }
        self.data
            .get(y as usize * self.width + x as usize)
            .map(|&raw| raw as f32 * self.depth_scale)
            .unwrap_or(0.0)
    }
}

/// One synchronized capture from the sensor
#[derive(Debug, Clone)]
pub struct FramePair {
    pub color: ColorFrame,
    pub depth: Option<DepthFrame>,
}

// ============================================================================
// DETECTION
// ============================================================================

/// Axis-aligned bounding region in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}

/// Position of the tracked hand on one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HandSample {
    /// Meters; 0.0 means the sensor had no return at the center
    pub distance: f32,
    pub x: i32,
    pub y: i32,
}

// ============================================================================
// GESTURES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureEvent {
    NoMotion,
    Pull,
    Push,
    Left,
    Right,
    Down,
    Up,
}

impl GestureEvent {
    /// Token written to the transport. `NoMotion` is never transmitted.
    pub fn wire_token(&self) -> Option<&'static str> {
        match self {
            Self::NoMotion => None,
            Self::Pull => Some("pull"),
            Self::Push => Some("push"),
            Self::Left => Some("left"),
            Self::Right => Some("right"),
            Self::Down => Some("down"),
            Self::Up => Some("up"),
        }
    }

    pub fn is_motion(&self) -> bool {
        !matches!(self, Self::NoMotion)
    }
}

impl fmt::Display for GestureEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_token().unwrap_or("none"))
    }
}

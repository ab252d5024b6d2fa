// src/config.rs

use crate::types::{
    Config, DepthGateConfig, DetectorConfig, DetectorKind, LoggingConfig, MotionConfig,
    SourceConfig, TransportConfig, TransportKind,
};
use anyhow::{bail, Context, Result};
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
        let config = Self::from_yaml(&contents)?;
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents).context("Invalid config YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with. Called once at startup.
    pub fn validate(&self) -> Result<()> {
        let m = &self.motion;
        if m.window_size < 2 {
            bail!("motion.window_size must be at least 2 (got {})", m.window_size);
        }
        if m.threshold_x <= 0 || m.threshold_y <= 0 {
            bail!(
                "motion.threshold_x/threshold_y must be positive (got {}, {})",
                m.threshold_x,
                m.threshold_y
            );
        }
        if !(m.threshold_z.is_finite() && m.threshold_z > 0.0) {
            bail!("motion.threshold_z must be positive (got {})", m.threshold_z);
        }

        let g = &self.depth_gate;
        if !(g.clipping_distance.is_finite() && g.clipping_distance > 0.0) {
            bail!(
                "depth_gate.clipping_distance must be positive (got {})",
                g.clipping_distance
            );
        }
        if g.workers == 0 {
            bail!("depth_gate.workers must be at least 1");
        }

        let s = &self.source;
        if s.width == 0 || s.height == 0 {
            bail!("source.width/height must be non-zero");
        }
        if !(s.depth_scale.is_finite() && s.depth_scale > 0.0) {
            bail!("source.depth_scale must be positive (got {})", s.depth_scale);
        }

        let d = &self.detector;
        if d.kind == DetectorKind::Onnx && !(0.0..=1.0).contains(&d.confidence_threshold) {
            bail!(
                "detector.confidence_threshold must be within [0, 1] (got {})",
                d.confidence_threshold
            );
        }
        if d.kind == DetectorKind::Cascade && d.scale_factor <= 1.0 {
            bail!(
                "detector.scale_factor must be greater than 1 (got {})",
                d.scale_factor
            );
        }

        Ok(())
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            color: "0".to_string(),
            depth_dir: "depth".to_string(),
            depth_scale: 0.001,
            width: 640,
            height: 480,
        }
    }
}

impl Default for DepthGateConfig {
    fn default() -> Self {
        Self {
            clipping_distance: 1.0,
            fill_value: 0x99,
            workers: 4,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            kind: DetectorKind::Cascade,
            model_path: "aGest.xml".to_string(),
            scale_factor: 1.2,
            min_neighbors: 3,
            min_size: 30,
            confidence_threshold: 0.5,
            nms_iou: 0.45,
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            window_size: 5,
            threshold_x: 10,
            threshold_y: 10,
            threshold_z: 0.015,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        let pipe_path = if cfg!(windows) {
            r"\\.\pipe\mypipe"
        } else {
            "/tmp/hand_gesture.pipe"
        };
        Self {
            kind: TransportKind::Pipe,
            pipe_path: pipe_path.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

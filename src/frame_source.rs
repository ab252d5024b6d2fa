// src/frame_source.rs
//
// Recorded color+depth sessions. Color comes from any OpenCV capture
// (file or camera index); depth is a directory of 16-bit PNGs, one per
// color frame, already aligned to the color stream.

use crate::types::{ColorFrame, DepthFrame, FramePair, SourceConfig};
use anyhow::{bail, Context, Result};
use opencv::{
    core::{Mat, CV_16UC1},
    imgcodecs,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureTrait, VideoCaptureTraitConst},
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Producer of synchronized frame pairs
pub trait FrameSource {
    /// `Ok(None)` when the stream has ended
    fn next_frame(&mut self) -> Result<Option<FramePair>>;
}

pub struct RecordedSession {
    cap: VideoCapture,
    fps: f64,
    current_frame: u64,
    depth_files: Vec<PathBuf>,
    depth_scale: f32,
    expected_width: usize,
    expected_height: usize,
}

impl RecordedSession {
    pub fn open(config: &SourceConfig) -> Result<Self> {
        let cap = match config.color.parse::<i32>() {
            Ok(index) => {
                info!("Opening camera {}", index);
                VideoCapture::new(index, videoio::CAP_ANY)?
            }
            Err(_) => {
                info!("Opening video: {}", config.color);
                VideoCapture::from_file(&config.color, videoio::CAP_ANY)?
            }
        };

        if !cap.is_opened()? {
            bail!("Failed to open color source {}", config.color);
        }

        let fps = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FPS)?;
        let fps = if fps > 0.0 { fps } else { 30.0 };

        let depth_files = find_depth_files(Path::new(&config.depth_dir));
        if depth_files.is_empty() {
            warn!(
                "No depth frames in {}; every frame will be gated",
                config.depth_dir
            );
        } else {
            info!("Found {} depth frames", depth_files.len());
        }

        Ok(Self {
            cap,
            fps,
            current_frame: 0,
            depth_files,
            depth_scale: config.depth_scale,
            expected_width: config.width,
            expected_height: config.height,
        })
    }

    fn read_depth(&self, index: usize) -> Option<DepthFrame> {
        let path = self.depth_files.get(index)?;
        match load_depth_png(path, self.depth_scale) {
            Ok(depth) => Some(depth),
            Err(e) => {
                warn!("Skipping depth frame {}: {:#}", path.display(), e);
                None
            }
        }
    }
}

impl FrameSource for RecordedSession {
    fn next_frame(&mut self) -> Result<Option<FramePair>> {
        let mut mat = Mat::default();
        if !VideoCaptureTrait::read(&mut self.cap, &mut mat)? || mat.empty() {
            return Ok(None);
        }

        let index = self.current_frame as usize;
        self.current_frame += 1;
        let timestamp_ms = (self.current_frame as f64 / self.fps) * 1000.0;

        let width = mat.cols() as usize;
        let height = mat.rows() as usize;
        if width != self.expected_width || height != self.expected_height {
            warn!(
                "Color frame is {}x{}, expected {}x{}",
                width, height, self.expected_width, self.expected_height
            );
        }

        let color = ColorFrame {
            data: mat.data_bytes()?.to_vec(),
            width,
            height,
            bytes_per_pixel: mat.elem_size()?,
            timestamp_ms,
        };

        Ok(Some(FramePair {
            color,
            depth: self.read_depth(index),
        }))
    }
}

fn find_depth_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
        })
        .collect();
    files.sort();
    files
}

fn load_depth_png(path: &Path, depth_scale: f32) -> Result<DepthFrame> {
    let path_str = path
        .to_str()
        .with_context(|| format!("Non UTF-8 path {}", path.display()))?;
    let mat = imgcodecs::imread(path_str, imgcodecs::IMREAD_ANYDEPTH)?;
    if mat.empty() {
        bail!("unreadable image");
    }
    if mat.typ() != CV_16UC1 {
        bail!("expected 16-bit single channel depth, got type {}", mat.typ());
    }

    Ok(DepthFrame {
        data: mat.data_typed::<u16>()?.to_vec(),
        width: mat.cols() as usize,
        height: mat.rows() as usize,
        depth_scale,
    })
}

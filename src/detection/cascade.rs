// src/detection/cascade.rs

use super::HandDetector;
use crate::types::{ColorFrame, DetectorConfig, Region};
use anyhow::{bail, Context, Result};
use opencv::{
    core::{self, Mat, Rect, Vector},
    imgproc,
    objdetect::CascadeClassifier,
    prelude::*,
};
use tracing::{debug, info};

/// Haar cascade hand detector. The classifier is loaded once and reused.
pub struct CascadeHandDetector {
    classifier: CascadeClassifier,
    scale_factor: f64,
    min_neighbors: i32,
    min_size: i32,
}

impl CascadeHandDetector {
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        info!("Loading hand cascade: {}", config.model_path);

        let classifier = CascadeClassifier::new(&config.model_path)
            .with_context(|| format!("Failed to load cascade {}", config.model_path))?;
        if classifier.empty()? {
            bail!("Cascade file {} is empty or unreadable", config.model_path);
        }

        info!("✓ Cascade hand detector initialized");
        Ok(Self {
            classifier,
            scale_factor: config.scale_factor,
            min_neighbors: config.min_neighbors,
            min_size: config.min_size,
        })
    }
}

impl HandDetector for CascadeHandDetector {
    fn detect(&mut self, image: &ColorFrame) -> Result<Vec<Region>> {
        let gray = to_gray(image)?;

        let mut hits = Vector::<Rect>::new();
        self.classifier.detect_multi_scale(
            &gray,
            &mut hits,
            self.scale_factor,
            self.min_neighbors,
            0,
            core::Size::new(self.min_size, self.min_size),
            core::Size::default(),
        )?;

        let regions: Vec<Region> = hits
            .iter()
            .map(|r| Region::new(r.x, r.y, r.width, r.height))
            .collect();

        debug!("Cascade found {} hand candidates", regions.len());
        Ok(regions)
    }
}

fn to_gray(image: &ColorFrame) -> Result<Mat> {
    let code = match image.bytes_per_pixel {
        1 => None,
        3 => Some(imgproc::COLOR_BGR2GRAY),
        4 => Some(imgproc::COLOR_BGRA2GRAY),
        n => bail!("Unsupported pixel size for cascade input: {} bytes", n),
    };

    let mat = Mat::from_slice(&image.data)?;
    let mat = mat.reshape(image.bytes_per_pixel as i32, image.height as i32)?;

    let Some(code) = code else {
        return Ok(mat.try_clone()?);
    };

    let mut gray = Mat::default();
    imgproc::cvt_color(&mat, &mut gray, code, 0)?;
    Ok(gray)
}

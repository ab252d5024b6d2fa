// src/depth_gate.rs
//
// Foreground/background segmentation by depth cutoff. Pixels with no
// sensor return or beyond the clipping distance are painted with a
// neutral fill so the hand detector only sees the near field.

use crate::types::{ColorFrame, DepthFrame, DepthGateConfig};
use anyhow::{anyhow, bail, Result};
use std::thread;
use tracing::{debug, warn};

pub struct DepthGate {
    clipping_distance: f32,
    fill_value: u8,
    workers: usize,
}

impl DepthGate {
    pub fn new(config: &DepthGateConfig) -> Self {
        Self {
            clipping_distance: config.clipping_distance,
            fill_value: config.fill_value,
            workers: config.workers.max(1),
        }
    }

    /// Mask background pixels of `color` in place. Returns the number of
    /// pixels that were filled.
    ///
    /// A missing, empty or misaligned depth frame gates every pixel.
    pub fn segment(&self, color: &mut ColorFrame, depth: Option<&DepthFrame>) -> Result<usize> {
        let stride = color.row_stride();
        let limit = stride * color.height;
        if color.data.len() < limit {
            bail!(
                "Color buffer too short: {} bytes for {}x{}x{}",
                color.data.len(),
                color.width,
                color.height,
                color.bytes_per_pixel
            );
        }
        if limit == 0 {
            return Ok(0);
        }

        let depth = match depth {
            Some(d) if d.matches(color) => d,
            Some(d) => {
                warn!(
                    "Depth frame {}x{} ({} samples) does not match color {}x{}, gating whole frame",
                    d.width,
                    d.height,
                    d.data.len(),
                    color.width,
                    color.height
                );
                color.data[..limit].fill(self.fill_value);
                return Ok(color.pixel_count());
            }
            None => {
                debug!("No depth frame, gating whole frame");
                color.data[..limit].fill(self.fill_value);
                return Ok(color.pixel_count());
            }
        };

        let bpp = color.bytes_per_pixel;
        let band = BandParams {
            bytes_per_pixel: bpp,
            depth_scale: depth.depth_scale,
            clipping_distance: self.clipping_distance,
            fill_value: self.fill_value,
        };
        let pixels = color.pixel_count();
        let color_data = &mut color.data[..limit];
        let depth_data = &depth.data[..pixels];

        if self.workers == 1 || color.height < 2 {
            return Ok(gate_band(color_data, depth_data, &band));
        }

        let rows_per_band = color.height.div_ceil(self.workers);
        let band_bytes = rows_per_band * stride;
        let band_pixels = rows_per_band * color.width;

        thread::scope(|s| {
            let handles: Vec<_> = color_data
                .chunks_mut(band_bytes)
                .zip(depth_data.chunks(band_pixels))
                .map(|(pixels, depths)| {
                    let band = &band;
                    s.spawn(move || gate_band(pixels, depths, band))
                })
                .collect();

            handles.into_iter().try_fold(0usize, |total, handle| {
                handle
                    .join()
                    .map(|gated| total + gated)
                    .map_err(|_| anyhow!("Depth gate worker panicked"))
            })
        })
    }
}

struct BandParams {
    bytes_per_pixel: usize,
    depth_scale: f32,
    clipping_distance: f32,
    fill_value: u8,
}

fn gate_band(pixels: &mut [u8], depths: &[u16], band: &BandParams) -> usize {
    let mut gated = 0;
    for (pixel, &raw) in pixels.chunks_exact_mut(band.bytes_per_pixel).zip(depths) {
        let distance = band.depth_scale * raw as f32;
        if distance <= 0.0 || distance > band.clipping_distance {
            pixel.fill(band.fill_value);
            gated += 1;
        }
    }
    gated
}

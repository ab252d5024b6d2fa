// src/detection/onnx.rs
//
// Single-class YOLO-style hand detector run through ONNX Runtime.
// Output layout is [1, 5, N]: cx, cy, w, h, score per anchor.

use super::HandDetector;
use crate::types::{ColorFrame, DetectorConfig, Region};
use anyhow::{bail, Context, Result};
use opencv::{
    core::{self, Mat},
    imgproc,
    prelude::*,
};
use ort::session::{builder::GraphOptimizationLevel, Session};
use tracing::{debug, info};

const INPUT_SIZE: usize = 640;
const LETTERBOX_FILL: u8 = 114;
const VALUES_PER_ANCHOR: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScoredBox {
    bbox: [f32; 4], // [x1, y1, x2, y2] in source image coordinates
    score: f32,
}

/// Scale and padding applied when fitting the source into the square input
#[derive(Debug, Clone, Copy, PartialEq)]
struct Letterbox {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

pub struct OnnxHandDetector {
    session: Session,
    confidence_threshold: f32,
    nms_iou: f32,
}

impl OnnxHandDetector {
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        info!("Loading ONNX hand model: {}", config.model_path);

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(2)?
            .commit_from_file(&config.model_path)
            .context("Failed to load hand model")?;

        info!("✓ ONNX hand detector initialized");
        Ok(Self {
            session,
            confidence_threshold: config.confidence_threshold,
            nms_iou: config.nms_iou,
        })
    }

    fn infer(&mut self, input: Vec<f32>) -> Result<Vec<f32>> {
        let shape = [1, 3, INPUT_SIZE, INPUT_SIZE];
        let input_value =
            ort::value::Value::from_array((shape.as_slice(), input.into_boxed_slice()))?;

        let outputs = self.session.run(ort::inputs!["images" => input_value])?;
        let (_, data) = outputs[0].try_extract_tensor::<f32>()?;

        Ok(data.to_vec())
    }
}

impl HandDetector for OnnxHandDetector {
    fn detect(&mut self, image: &ColorFrame) -> Result<Vec<Region>> {
        let (input, letterbox) = preprocess(image)?;
        let output = self.infer(input)?;
        let boxes = decode(&output, letterbox, self.confidence_threshold)?;
        let boxes = nms(boxes, self.nms_iou);

        debug!("ONNX model found {} hand candidates", boxes.len());
        Ok(boxes.iter().map(to_region).collect())
    }
}

/// Letterbox the BGR/BGRA/gray frame into a normalized RGB CHW tensor
fn preprocess(image: &ColorFrame) -> Result<(Vec<f32>, Letterbox)> {
    let (src_w, src_h) = (image.width, image.height);
    if src_w == 0 || src_h == 0 {
        bail!("Cannot run hand model on an empty frame");
    }
    let rgb = to_rgb(image)?;

    let scale = (INPUT_SIZE as f32 / src_w as f32).min(INPUT_SIZE as f32 / src_h as f32);
    let scaled_w = ((src_w as f32 * scale) as usize).clamp(1, INPUT_SIZE);
    let scaled_h = ((src_h as f32 * scale) as usize).clamp(1, INPUT_SIZE);
    let pad_x = (INPUT_SIZE - scaled_w) / 2;
    let pad_y = (INPUT_SIZE - scaled_h) / 2;

    let resized = resize_rgb(&rgb, src_w, src_h, scaled_w, scaled_h)?;

    let mut canvas = vec![LETTERBOX_FILL; INPUT_SIZE * INPUT_SIZE * 3];
    for y in 0..scaled_h {
        let src = &resized[y * scaled_w * 3..(y + 1) * scaled_w * 3];
        let dst_start = ((y + pad_y) * INPUT_SIZE + pad_x) * 3;
        canvas[dst_start..dst_start + scaled_w * 3].copy_from_slice(src);
    }

    let plane = INPUT_SIZE * INPUT_SIZE;
    let mut input = vec![0.0f32; 3 * plane];
    for (i, px) in canvas.chunks_exact(3).enumerate() {
        for c in 0..3 {
            input[c * plane + i] = px[c] as f32 / 255.0;
        }
    }

    Ok((
        input,
        Letterbox {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
        },
    ))
}

fn to_rgb(image: &ColorFrame) -> Result<Vec<u8>> {
    let bpp = image.bytes_per_pixel;
    let pixels = image.pixel_count();
    if image.data.len() < pixels * bpp {
        bail!("Color buffer too short for {}x{}", image.width, image.height);
    }
    let rgb = match bpp {
        1 => image.data[..pixels].iter().flat_map(|&v| [v, v, v]).collect(),
        3 | 4 => image.data[..pixels * bpp]
            .chunks_exact(bpp)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect(),
        n => bail!("Unsupported pixel size for hand model: {} bytes", n),
    };
    Ok(rgb)
}

fn resize_rgb(rgb: &[u8], src_w: usize, src_h: usize, dst_w: usize, dst_h: usize) -> Result<Vec<u8>> {
    let src = Mat::from_slice(rgb)?;
    let src = src.reshape(3, src_h as i32)?;
    if src.cols() as usize != src_w {
        bail!("RGB buffer does not match {}x{}", src_w, src_h);
    }

    let mut dst = Mat::default();
    imgproc::resize(
        &src,
        &mut dst,
        core::Size::new(dst_w as i32, dst_h as i32),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;
    Ok(dst.data_bytes()?.to_vec())
}

/// Parse raw [1, 5, N] output into boxes in source coordinates
fn decode(output: &[f32], letterbox: Letterbox, conf_thresh: f32) -> Result<Vec<ScoredBox>> {
    if output.len() % VALUES_PER_ANCHOR != 0 {
        bail!(
            "Unexpected hand model output size {} (not a multiple of {})",
            output.len(),
            VALUES_PER_ANCHOR
        );
    }
    let anchors = output.len() / VALUES_PER_ANCHOR;

    let mut boxes = Vec::new();
    for i in 0..anchors {
        let score = output[anchors * 4 + i];
        if score < conf_thresh {
            continue;
        }

        let cx = output[i];
        let cy = output[anchors + i];
        let w = output[anchors * 2 + i];
        let h = output[anchors * 3 + i];

        let unletterbox = |v: f32, pad: f32| (v - pad) / letterbox.scale;
        boxes.push(ScoredBox {
            bbox: [
                unletterbox(cx - w / 2.0, letterbox.pad_x),
                unletterbox(cy - h / 2.0, letterbox.pad_y),
                unletterbox(cx + w / 2.0, letterbox.pad_x),
                unletterbox(cy + h / 2.0, letterbox.pad_y),
            ],
            score,
        });
    }
    Ok(boxes)
}

fn nms(mut boxes: Vec<ScoredBox>, iou_threshold: f32) -> Vec<ScoredBox> {
    boxes.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut keep: Vec<ScoredBox> = Vec::new();
    for candidate in boxes {
        if keep
            .iter()
            .all(|kept| iou(&kept.bbox, &candidate.bbox) < iou_threshold)
        {
            keep.push(candidate);
        }
    }
    keep
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    let union = area_a + area_b - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

fn to_region(b: &ScoredBox) -> Region {
    let [x1, y1, x2, y2] = b.bbox;
    Region::new(
        x1.round() as i32,
        y1.round() as i32,
        (x2 - x1).round().max(0.0) as i32,
        (y2 - y1).round().max(0.0) as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: usize, height: usize, bgr: [u8; 3]) -> ColorFrame {
        ColorFrame {
            data: bgr.repeat(width * height),
            width,
            height,
            bytes_per_pixel: 3,
            timestamp_ms: 0.0,
        }
    }

    #[test]
    fn test_iou_overlap() {
        let a = [0.0, 0.0, 100.0, 100.0];
        let b = [50.0, 50.0, 150.0, 150.0];
        let score = iou(&a, &b);
        assert!((score - 2500.0 / 17500.0).abs() < 0.01);
    }

    #[test]
    fn test_iou_no_overlap() {
        let a = [0.0, 0.0, 50.0, 50.0];
        let b = [100.0, 100.0, 200.0, 200.0];
        assert_eq!(iou(&a, &b), 0.0);
    }

    #[test]
    fn test_nms_keeps_highest_of_overlapping() {
        let boxes = vec![
            ScoredBox {
                bbox: [0.0, 0.0, 100.0, 100.0],
                score: 0.6,
            },
            ScoredBox {
                bbox: [5.0, 5.0, 105.0, 105.0],
                score: 0.9,
            },
            ScoredBox {
                bbox: [300.0, 300.0, 350.0, 350.0],
                score: 0.7,
            },
        ];
        let kept = nms(boxes, 0.45);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].score, 0.9);
        assert_eq!(kept[1].score, 0.7);
    }

    #[test]
    fn test_preprocess_letterboxes_landscape_frame() {
        let (input, lb) = preprocess(&frame(640, 480, [0, 0, 255])).unwrap();
        assert_eq!(input.len(), 3 * INPUT_SIZE * INPUT_SIZE);
        assert_eq!(lb.scale, 1.0);
        assert_eq!(lb.pad_x, 0.0);
        assert_eq!(lb.pad_y, 80.0);

        let plane = INPUT_SIZE * INPUT_SIZE;
        // Top padding row is letterbox gray
        assert!((input[0] - LETTERBOX_FILL as f32 / 255.0).abs() < 1e-6);
        // Image center: BGR red becomes R=1, B=0
        let center = 320 * INPUT_SIZE + 320;
        assert!((input[center] - 1.0).abs() < 1e-6);
        assert!(input[2 * plane + center].abs() < 1e-6);
    }

    #[test]
    fn test_preprocess_downscales_portrait_frame() {
        let (input, lb) = preprocess(&frame(480, 1280, [255, 0, 0])).unwrap();
        assert_eq!(lb.scale, 0.5);
        assert_eq!(lb.pad_x, 200.0);
        assert_eq!(lb.pad_y, 0.0);

        let plane = INPUT_SIZE * INPUT_SIZE;
        // Left padding column is letterbox gray
        assert!((input[320 * INPUT_SIZE] - LETTERBOX_FILL as f32 / 255.0).abs() < 1e-6);
        // Uniform blue survives the resize: R=0, B=1
        let center = 320 * INPUT_SIZE + 320;
        assert!(input[center].abs() < 1e-6);
        assert!((input[2 * plane + center] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_decode_maps_back_to_source_coordinates() {
        let lb = Letterbox {
            scale: 0.5,
            pad_x: 0.0,
            pad_y: 40.0,
        };
        // Two anchors, only the second above threshold
        let output = vec![
            10.0, 200.0, // cx
            10.0, 140.0, // cy
            4.0, 40.0, // w
            4.0, 40.0, // h
            0.1, 0.8, // score
        ];
        let boxes = decode(&output, lb, 0.5).unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].bbox, [360.0, 160.0, 440.0, 240.0]);

        let region = to_region(&boxes[0]);
        assert_eq!(region, Region::new(360, 160, 80, 80));
        assert_eq!(region.center(), (400, 200));
    }

    #[test]
    fn test_decode_rejects_malformed_output() {
        let lb = Letterbox {
            scale: 1.0,
            pad_x: 0.0,
            pad_y: 0.0,
        };
        assert!(decode(&[0.0; 7], lb, 0.5).is_err());
    }
}

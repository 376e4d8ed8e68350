//! Detector adapter: a single polymorphic capability that the
//! cascade consumes without caring whether it's backed by a real model or a
//! stub.

use crate::exif::Image;
use crate::types::{BBox, Detection};

/// Anything that can find objects in a decoded raster. Implementations must
/// soft-fail (return an empty `Vec`) rather than propagate errors — a
/// detector outage degrades the pipeline to "no detections", it never
/// fails the task.
pub trait Detector: Send + Sync {
    fn detect(&self, image: &Image) -> Vec<Detection>;
}

/// Translate a model's native `(x1, y1, x2, y2)` box into the pipeline's
/// `(x, y, w, h)` convention.
pub fn xyxy_to_xywh(x1: i32, y1: i32, x2: i32, y2: i32) -> BBox {
    BBox::from((x1, y1, x2, y2))
}

/// Fallback detector used when no model is configured: one centered 70%
/// crop labeled `"building"` at confidence `0.6`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubDetector;

impl Detector for StubDetector {
    fn detect(&self, image: &Image) -> Vec<Detection> {
        let w = image.width();
        let h = image.height();
        let bbox = BBox {
            x: (w as f64 * 0.15) as u32,
            y: (h as f64 * 0.15) as u32,
            w: (w as f64 * 0.7) as u32,
            h: (h as f64 * 0.7) as u32,
        };
        vec![Detection {
            label: "building".to_string(),
            bbox,
            confidence: 0.6,
            mask: None,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_detector_yields_centered_crop() {
        let image = Image::new(100, 200);
        let dets = StubDetector.detect(&image);
        assert_eq!(dets.len(), 1);
        let d = &dets[0];
        assert_eq!(d.label, "building");
        assert_eq!(d.confidence, 0.6);
        assert!(d.bbox.within(100, 200));
        assert_eq!(d.bbox, BBox { x: 15, y: 30, w: 70, h: 140 });
    }

    #[test]
    fn xyxy_translates_to_xywh() {
        let bbox = xyxy_to_xywh(10, 20, 50, 80);
        assert_eq!(bbox, BBox { x: 10, y: 20, w: 40, h: 60 });
    }
}

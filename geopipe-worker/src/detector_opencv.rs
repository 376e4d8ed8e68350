//! Model-backed `Detector`, grounded directly on the webcam-mode Haar
//! cascade usage: load a classifier once, run `detect_multi_scale` per
//! frame. Soft-fail semantics are preserved — any OpenCV error is logged
//! and yields an empty detection list, it is never propagated.

use geopipe_core::detector::xyxy_to_xywh;
use geopipe_core::exif::Image;
use geopipe_core::types::Detection;
use geopipe_core::Detector;
use opencv::core::{Mat, Size, Vector};
use opencv::imgproc;
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;
use std::sync::Mutex;

pub struct HaarCascadeDetector {
    classifier: Mutex<CascadeClassifier>,
    label: String,
}

impl HaarCascadeDetector {
    pub fn load(cascade_path: &str, label: impl Into<String>) -> opencv::Result<Self> {
        let classifier = CascadeClassifier::new(cascade_path)?;
        Ok(HaarCascadeDetector { classifier: Mutex::new(classifier), label: label.into() })
    }

    fn detect_inner(&self, image: &Image) -> opencv::Result<Vec<Detection>> {
        let (w, h) = (image.width() as i32, image.height() as i32);
        let mat = unsafe {
            Mat::new_rows_cols_with_data_unsafe(
                h,
                w,
                opencv::core::CV_8UC3,
                image.as_raw().as_ptr() as *mut std::ffi::c_void,
                opencv::core::Mat_AUTO_STEP,
            )?
        };

        let mut gray = Mat::default();
        imgproc::cvt_color(&mat, &mut gray, imgproc::COLOR_RGB2GRAY, 0)?;

        let mut found = Vector::<opencv::core::Rect>::new();
        let mut classifier = self.classifier.lock().expect("classifier mutex poisoned");
        classifier.detect_multi_scale(
            &gray,
            &mut found,
            1.1,
            3,
            0,
            Size::new(30, 30),
            Size::new(0, 0),
        )?;

        Ok(found
            .iter()
            .map(|r| Detection {
                label: self.label.clone(),
                bbox: xyxy_to_xywh(r.x, r.y, r.x + r.width, r.y + r.height),
                confidence: 1.0,
                mask: None,
            })
            .collect())
    }
}

impl Detector for HaarCascadeDetector {
    fn detect(&self, image: &Image) -> Vec<Detection> {
        match self.detect_inner(image) {
            Ok(detections) => detections,
            Err(err) => {
                tracing::warn!(error = %err, "haar cascade detection failed, yielding no detections");
                Vec::new()
            }
        }
    }
}

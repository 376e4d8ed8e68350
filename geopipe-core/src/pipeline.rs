//! Pipeline driver: wires detection, the estimator cascade, and the
//! optional enrichers into the single entry point a worker calls per task.

use crate::cascade;
use crate::detector::Detector;
use crate::enrich::{Geocoder, OcrEngine};
use crate::error::Result;
use crate::exif;
use crate::types::{DetectionResult, PipelineOutput, TaskMetadata};

/// Composes the pluggable collaborators behind a `process` call. `detector`
/// is the only mandatory one; OCR and reverse-geocoding are optional and
/// their absence degrades the result, never the call.
pub struct Pipeline {
    detector: Box<dyn Detector>,
    ocr: Option<Box<dyn OcrEngine>>,
    geocoder: Option<Box<dyn Geocoder>>,
}

impl Pipeline {
    pub fn new(detector: Box<dyn Detector>) -> Self {
        Pipeline { detector, ocr: None, geocoder: None }
    }

    pub fn with_ocr(mut self, ocr: Box<dyn OcrEngine>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn with_geocoder(mut self, geocoder: Box<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// Decode, detect, geolocate, and enrich. A decode failure does not
    /// propagate: the driver is total over well-formed and malformed input
    /// alike, so a bad image yields an empty `PipelineOutput` rather than an
    /// `Err` escaping this call. Every collaborator downstream of a
    /// successful decode degrades to `None`/empty instead of erroring.
    pub fn process(&self, image_bytes: &[u8], metadata: &TaskMetadata) -> Result<PipelineOutput> {
        let (image, exif_summary) = match exif::decode(image_bytes) {
            Ok(decoded) => decoded,
            Err(_) => return Ok(PipelineOutput::default()),
        };
        let img_w = image.width();
        let img_h = image.height();

        let image_geo = cascade::image_level_geolocation(&exif_summary);
        let detections = self.detector.detect(&image);

        let results = detections
            .into_iter()
            .map(|detection| {
                let geolocation = cascade::estimate(
                    &detection.bbox,
                    img_w,
                    img_h,
                    image_geo.as_ref(),
                    metadata.ins.as_ref(),
                    exif_summary.focal_length_mm(),
                );

                let ocr_text = self
                    .ocr
                    .as_ref()
                    .and_then(|ocr| ocr.recognize(&image, &detection.bbox));

                let address = self
                    .geocoder
                    .as_ref()
                    .and_then(|geocoder| geocoder.reverse(geolocation.lat(), geolocation.lon()));

                DetectionResult {
                    detection,
                    geolocation: Some(geolocation),
                    ocr_text,
                    address,
                }
            })
            .collect();

        Ok(PipelineOutput { detections: results, image_geolocation: image_geo })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::StubDetector;
    use std::io::Cursor;

    fn sample_png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbImage::new(w, h);
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn process_yields_one_result_per_detection_with_a_fix() {
        let pipeline = Pipeline::new(Box::new(StubDetector));
        let bytes = sample_png_bytes(200, 100);
        let out = pipeline.process(&bytes, &TaskMetadata::default()).unwrap();

        assert_eq!(out.detections.len(), 1);
        assert!(out.detections[0].geolocation.is_some());
        assert!(out.image_geolocation.is_none());
        assert!(out.detections[0].ocr_text.is_none());
        assert!(out.detections[0].address.is_none());
    }

    #[test]
    fn process_degrades_to_empty_output_on_decode_failure() {
        let pipeline = Pipeline::new(Box::new(StubDetector));
        let out = pipeline.process(b"not an image", &TaskMetadata::default()).unwrap();
        assert!(out.detections.is_empty());
        assert!(out.image_geolocation.is_none());
    }

    struct NoDetections;
    impl Detector for NoDetections {
        fn detect(&self, _image: &exif::Image) -> Vec<crate::types::Detection> {
            Vec::new()
        }
    }

    #[test]
    fn process_tolerates_an_empty_detector() {
        let pipeline = Pipeline::new(Box::new(NoDetections));
        let bytes = sample_png_bytes(64, 64);
        let out = pipeline.process(&bytes, &TaskMetadata::default()).unwrap();
        assert!(out.detections.is_empty());
    }
}

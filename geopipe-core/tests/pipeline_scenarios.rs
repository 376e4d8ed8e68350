//! End-to-end scenarios against `Pipeline::process`, covering the
//! INS/no-EXIF cases a unit test inside a single module can't exercise
//! (they need a decoded image plus full task metadata). The EXIF-bearing
//! scenarios are covered at the `exif`/`cascade` unit level instead, since
//! hand-constructing a JPEG with an embedded GPS IFD here would just be
//! re-testing the `exif` crate's encoder.

use std::io::Cursor;

use geopipe_core::{InsMetadata, Pipeline, StubDetector, TaskMetadata};

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbImage::new(w, h);
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn metadata_with_ins(ins: InsMetadata) -> TaskMetadata {
    TaskMetadata { ins: Some(ins), extra: Default::default() }
}

#[test]
fn scenario_ins_straight_down_camera_hits_point_below() {
    // Spec §8 scenario 2: lat=55.75, lon=37.61, alt=100, pitch=-90, focal 35mm/36mm sensor.
    let pipeline = Pipeline::new(Box::new(StubDetector));
    let metadata = metadata_with_ins(InsMetadata {
        lat: Some(55.75),
        lon: Some(37.61),
        alt_m: Some(100.0),
        yaw: Some(0.0),
        pitch: Some(-90.0),
        roll: Some(0.0),
        focal_mm: Some(35.0),
        sensor_mm: Some(36.0),
    });
    let bytes = png_bytes(1920, 1080);
    let out = pipeline.process(&bytes, &metadata).unwrap();

    assert!(out.image_geolocation.is_none(), "no EXIF GPS means no image-level fix");
    assert_eq!(out.detections.len(), 1);
    let geo = out.detections[0].geolocation.expect("cascade always fills geolocation");
    assert_eq!(geo.method, geopipe_core::EstimationMethod::InsProjection);
    assert!((geo.lat() - 55.75).abs() < 1e-3);
    assert!((geo.lon() - 37.61).abs() < 1e-3);
    assert!(geo.error_radius_m >= 5.0);
}

#[test]
fn scenario_ins_horizon_pointing_camera_falls_through() {
    // Spec §8 scenario 3: same rig but pitch=0 -- the ray never meets ground,
    // so the cascade must fall through past arm B.
    let pipeline = Pipeline::new(Box::new(StubDetector));
    let metadata = metadata_with_ins(InsMetadata {
        lat: Some(55.75),
        lon: Some(37.61),
        alt_m: Some(100.0),
        yaw: Some(0.0),
        pitch: Some(0.0),
        roll: Some(0.0),
        focal_mm: Some(35.0),
        sensor_mm: Some(36.0),
    });
    let bytes = png_bytes(1920, 1080);
    let out = pipeline.process(&bytes, &metadata).unwrap();

    let geo = out.detections[0].geolocation.expect("cascade always fills geolocation");
    assert_ne!(geo.method, geopipe_core::EstimationMethod::InsProjection);
}

#[test]
fn scenario_no_exif_no_ins_falls_back_to_cascade_floor() {
    // Spec §8 scenario 4: no EXIF GPS, no INS -- method must be one of the
    // two opaque fallback arms, and image_geolocation must be null.
    let pipeline = Pipeline::new(Box::new(StubDetector));
    let bytes = png_bytes(640, 480);
    let out = pipeline.process(&bytes, &TaskMetadata::default()).unwrap();

    assert!(out.image_geolocation.is_none());
    let geo = out.detections[0].geolocation.expect("cascade always fills geolocation");
    assert!(matches!(
        geo.method,
        geopipe_core::EstimationMethod::VisualRetrieval | geopipe_core::EstimationMethod::Georeg
    ));
}

#[test]
fn scenario_decode_failure_yields_empty_output_not_an_error() {
    // Spec §8 scenario 6: decode failure must not panic or propagate an
    // error out of `process` -- it degrades to an empty `PipelineOutput`.
    let pipeline = Pipeline::new(Box::new(StubDetector));
    let out = pipeline
        .process(b"definitely not an image", &TaskMetadata::default())
        .expect("decode failure degrades to Ok(empty output), not Err");
    assert!(out.detections.is_empty());
    assert!(out.image_geolocation.is_none());
}

#[test]
fn every_detection_carries_a_valid_geolocation() {
    // Spec §8 universal invariant, exercised at the pipeline level across a
    // handful of metadata shapes.
    let pipeline = Pipeline::new(Box::new(StubDetector));
    let bytes = png_bytes(800, 600);

    for metadata in [
        TaskMetadata::default(),
        metadata_with_ins(InsMetadata { lat: Some(1.0), lon: Some(2.0), alt_m: Some(10.0), ..Default::default() }),
    ] {
        let out = pipeline.process(&bytes, &metadata).unwrap();
        for detection in &out.detections {
            let geo = detection.geolocation.expect("geolocation must be present");
            assert!((-90.0..=90.0).contains(&geo.lat()));
            assert!((-180.0..=180.0).contains(&geo.lon()));
            assert!((0.0..=1.0).contains(&geo.confidence));
            assert!(geo.error_radius_m >= 0.0);
            assert!(detection.detection.bbox.within(800, 600));
        }
    }
}

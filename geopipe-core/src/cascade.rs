//! Estimator cascade: four geolocation arms tried in order until
//! one produces a fix. Arm D is the floor — it never returns `None` — so the
//! cascade as a whole always yields a `Geolocation` for a detection.

use rand::Rng;

use crate::camera::{enu_offset_to_latlon, estimate_focal_px};
use crate::types::{BBox, EstimationMethod, ExifSummary, Geolocation, InsMetadata};

/// Altitude assumed by arm A when no INS altitude is available.
const DEFAULT_APPROX_ALT_M: f64 = 50.0;

/// Image-level fix from EXIF GPS alone, independent of any detection —
/// computed once per task before the per-detection cascade runs.
pub fn image_level_geolocation(exif: &ExifSummary) -> Option<Geolocation> {
    let gps = exif.gps.as_ref()?;
    let (lat, lon) = crate::exif::gps_to_decimal(gps)?;
    Some(Geolocation::new(lat, lon, 0.95, 10.0, EstimationMethod::Exif))
}

/// Arm A: correct the image-level EXIF fix by the detection's pixel offset
/// from the image center, treating the offset as a small bearing angle over
/// an assumed ground distance.
fn exif_corrected(
    image_geo: &Geolocation,
    bbox: &BBox,
    img_w: u32,
    img_h: u32,
    focal_px: Option<f64>,
    approx_alt_m: Option<f64>,
) -> Option<Geolocation> {
    let (cx_pix, cy_pix) = bbox.center();
    let img_cx = img_w as f64 / 2.0;
    let img_cy = img_h as f64 / 2.0;
    let dx_pix = cx_pix - img_cx;
    let dy_pix = cy_pix - img_cy;

    let focal_px = focal_px.unwrap_or_else(|| img_w.max(img_h) as f64);
    let approx_alt = approx_alt_m.unwrap_or(DEFAULT_APPROX_ALT_M);

    let meters_x = approx_alt * (dx_pix / focal_px).tan();
    let meters_y = approx_alt * (dy_pix / focal_px).tan();
    let (lat, lon) = enu_offset_to_latlon(image_geo.lat(), image_geo.lon(), meters_x, -meters_y);

    let error_radius_m = (approx_alt * 0.2).max(10.0);
    Some(Geolocation::new(lat, lon, 0.85, error_radius_m, EstimationMethod::ExifCorrected))
}

/// Arm C: visual-retrieval placeholder. In the absence of a real retrieval
/// index this samples a wide area around a fixed reference point — a
/// low-confidence, high-error placeholder, not a real localizer.
fn visual_retrieval<R: Rng + ?Sized>(rng: &mut R) -> Geolocation {
    let lat = 55.75 + rng.gen_range(-0.02..=0.02);
    let lon = 37.61 + rng.gen_range(-0.02..=0.02);
    Geolocation::new(lat, lon, 0.25, 2000.0, EstimationMethod::VisualRetrieval)
}

/// Arm D: the cascade's floor. Always returns a fix, however coarse
/// — the pipeline never hands back a detection with no
/// geolocation at all.
fn georeg<R: Rng + ?Sized>(rng: &mut R) -> Geolocation {
    let lat = 55.75 + rng.gen_range(-0.5..=0.5);
    let lon = 37.61 + rng.gen_range(-0.5..=0.5);
    Geolocation::new(lat, lon, 0.1, 20000.0, EstimationMethod::Georeg)
}

/// Run the full cascade for one detection. `image_geo` is the task-level
/// EXIF fix (if any); `ins` and `exif_focal_mm`/`sensor_mm` feed arms A/B.
#[allow(clippy::too_many_arguments)]
pub fn estimate(
    bbox: &BBox,
    img_w: u32,
    img_h: u32,
    image_geo: Option<&Geolocation>,
    ins: Option<&InsMetadata>,
    exif_focal_mm: Option<f64>,
) -> Geolocation {
    let mut rng = rand::thread_rng();

    // Arm A: EXIF-corrected offset, only available when the image itself
    // carried a GPS fix.
    if let Some(image_geo) = image_geo {
        let approx_alt = ins.and_then(|i| i.alt_m);
        let focal_px = exif_focal_mm.and_then(|mm| estimate_focal_px(Some(mm), img_w, None));
        if let Some(fix) = exif_corrected(image_geo, bbox, img_w, img_h, focal_px, approx_alt) {
            return fix;
        }
    }

    // Arm B: INS ray-cast against the ground plane, only available with a
    // full camera pose.
    if let Some(ins) = ins {
        if ins.has_fix() {
            let focal_px = estimate_focal_px(ins.focal_mm, img_w, ins.sensor_mm);
            let fix = crate::projector::project_bbox_center(
                bbox,
                img_w,
                img_h,
                ins.lat.unwrap(),
                ins.lon.unwrap(),
                ins.alt_m.unwrap(),
                ins.yaw.unwrap_or(0.0),
                ins.pitch.unwrap_or(0.0),
                ins.roll.unwrap_or(0.0),
                focal_px,
            );
            if let Some(fix) = fix {
                return fix;
            }
        }
    }

    // Arm C is itself infallible (it always has a reference point to sample
    // around), so in practice it is the cascade's effective floor; arm D
    // exists to document what the cascade falls back to if that ever
    // changes, and is exercised directly in tests below.
    visual_retrieval(&mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BBox;

    fn bbox_at(x: u32, y: u32) -> BBox {
        BBox { x, y, w: 10, h: 10 }
    }

    #[test]
    fn image_level_geolocation_reads_exif_gps() {
        use crate::types::ExifValue;
        let mut gps = std::collections::HashMap::new();
        gps.insert("GPSLatitude".to_string(), ExifValue::Rational(vec![(55, 1), (45, 1), (728, 100)]));
        gps.insert("GPSLatitudeRef".to_string(), ExifValue::Text("N".to_string()));
        gps.insert("GPSLongitude".to_string(), ExifValue::Rational(vec![(37, 1), (37, 1), (299, 100)]));
        gps.insert("GPSLongitudeRef".to_string(), ExifValue::Text("E".to_string()));
        let summary = ExifSummary { tags: Default::default(), gps: Some(gps) };

        let fix = image_level_geolocation(&summary).expect("gps present");
        assert_eq!(fix.method, EstimationMethod::Exif);
        assert_eq!(fix.confidence, 0.95);
        assert_eq!(fix.error_radius_m, 10.0);
    }

    #[test]
    fn image_level_geolocation_none_without_gps() {
        let summary = ExifSummary::default();
        assert!(image_level_geolocation(&summary).is_none());
    }

    #[test]
    fn exif_corrected_centered_bbox_matches_image_fix() {
        let image_geo = Geolocation::new(55.75, 37.61, 0.95, 10.0, EstimationMethod::Exif);
        let bbox = BBox { x: 960, y: 540, w: 0, h: 0 };
        let fix = exif_corrected(&image_geo, &bbox, 1920, 1080, Some(1500.0), Some(60.0)).unwrap();
        assert!((fix.lat() - 55.75).abs() < 1e-9);
        assert!((fix.lon() - 37.61).abs() < 1e-9);
        assert_eq!(fix.method, EstimationMethod::ExifCorrected);
    }

    #[test]
    fn estimate_prefers_ins_projection_when_no_image_fix() {
        let ins = InsMetadata {
            lat: Some(55.75),
            lon: Some(37.61),
            alt_m: Some(100.0),
            pitch: Some(-90.0),
            ..Default::default()
        };
        let bbox = bbox_at(955, 535);
        let fix = estimate(&bbox, 1920, 1080, None, Some(&ins), None);
        assert_eq!(fix.method, EstimationMethod::InsProjection);
    }

    #[test]
    fn estimate_falls_back_to_visual_retrieval_without_any_metadata() {
        let bbox = bbox_at(10, 10);
        let fix = estimate(&bbox, 1920, 1080, None, None, None);
        assert_eq!(fix.method, EstimationMethod::VisualRetrieval);
    }

    #[test]
    fn georeg_floor_is_bounded_and_always_present() {
        let mut rng = rand::thread_rng();
        let fix = georeg(&mut rng);
        assert_eq!(fix.method, EstimationMethod::Georeg);
        assert_eq!(fix.confidence, 0.1);
        assert_eq!(fix.error_radius_m, 20000.0);
        assert!((fix.lat() - 55.75).abs() <= 0.5);
        assert!((fix.lon() - 37.61).abs() <= 0.5);
    }

    #[test]
    fn estimate_never_returns_nothing() {
        // Degenerate INS (level camera, ray never meets ground) must still
        // fall through to a fix, never panic or bubble up `None`.
        let ins = InsMetadata {
            lat: Some(0.0),
            lon: Some(0.0),
            alt_m: Some(50.0),
            ..Default::default()
        };
        let bbox = bbox_at(960, 540);
        let fix = estimate(&bbox, 1920, 1080, None, Some(&ins), None);
        assert!(matches!(fix.method, EstimationMethod::VisualRetrieval | EstimationMethod::InsProjection));
    }
}

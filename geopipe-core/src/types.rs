//! Data model shared by every pipeline component.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Inertial-navigation telemetry attached to a task, when the carrying
/// platform has it. Every field but `lat`/`lon`/`alt_m` defaults to `0.0`
/// when the estimator cascade needs it but the sender omitted it.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct InsMetadata {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub alt_m: Option<f64>,
    pub yaw: Option<f64>,
    pub pitch: Option<f64>,
    pub roll: Option<f64>,
    pub focal_mm: Option<f64>,
    pub sensor_mm: Option<f64>,
}

impl InsMetadata {
    /// Arm B of the cascade requires at least a 3D fix; rotation defaults to
    /// level/forward-facing when absent.
    pub fn has_fix(&self) -> bool {
        self.lat.is_some() && self.lon.is_some() && self.alt_m.is_some()
    }
}

/// Everything a task may carry beyond `image_id`/`image_url`. Unrecognized
/// keys are preserved in `extra` and passed through unchanged into the
/// outbound result message (the pipeline itself never reads `extra`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TaskMetadata {
    #[serde(default)]
    pub ins: Option<InsMetadata>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Inbound task message.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Task {
    pub image_id: String,
    pub image_url: String,
    #[serde(default)]
    pub metadata: TaskMetadata,
}

/// A single EXIF or GPS-IFD tag value, already coerced out of raw TIFF bytes
/// but not yet interpreted (e.g. a GPS rational triple is still three
/// num/denom pairs, not a decimal degree).
#[derive(Debug, Clone, PartialEq)]
pub enum ExifValue {
    Text(String),
    /// Unsigned rationals, e.g. `GPSLatitude` is three of these (deg, min, sec).
    Rational(Vec<(u32, u32)>),
    SRational(Vec<(i32, i32)>),
    UInt(Vec<u32>),
    Bytes(Vec<u8>),
}

impl ExifValue {
    /// First rational component as a float, if this value holds any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ExifValue::Rational(v) => v.first().map(|(n, d)| *n as f64 / *d as f64),
            ExifValue::SRational(v) => v.first().map(|(n, d)| *n as f64 / *d as f64),
            ExifValue::UInt(v) => v.first().map(|n| *n as f64),
            ExifValue::Text(s) => s.trim().parse().ok(),
            ExifValue::Bytes(_) => None,
        }
    }

    /// Single-character hemisphere reference (`"N"`, `"S"`, `"E"`, `"W"`),
    /// accepting both the ASCII-string and raw-byte EXIF encodings.
    pub fn as_ref_char(&self) -> Option<char> {
        match self {
            ExifValue::Text(s) => s.chars().next(),
            ExifValue::Bytes(b) => b.first().map(|c| *c as char),
            _ => None,
        }
    }
}

/// Tag-name -> value mapping, with a nested GPS sub-map when the image
/// carries a GPS IFD.
#[derive(Debug, Clone, Default)]
pub struct ExifSummary {
    pub tags: HashMap<String, ExifValue>,
    pub gps: Option<HashMap<String, ExifValue>>,
}

impl ExifSummary {
    pub fn focal_length_mm(&self) -> Option<f64> {
        self.tags.get("FocalLength").and_then(ExifValue::as_f64)
    }
}

/// Bounding box in integer pixels, top-left origin, y-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct BBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl BBox {
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.w as f64 / 2.0,
            self.y as f64 + self.h as f64 / 2.0,
        )
    }

    /// `0 ≤ x,y` and `x+w ≤ img_w`, `y+h ≤ img_h`.
    pub fn within(&self, img_w: u32, img_h: u32) -> bool {
        self.x.saturating_add(self.w) <= img_w && self.y.saturating_add(self.h) <= img_h
    }
}

impl From<(i32, i32, i32, i32)> for BBox {
    fn from((x1, y1, x2, y2): (i32, i32, i32, i32)) -> Self {
        BBox {
            x: x1.max(0) as u32,
            y: y1.max(0) as u32,
            w: (x2 - x1).max(0) as u32,
            h: (y2 - y1).max(0) as u32,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Detection {
    pub label: String,
    pub bbox: BBox,
    pub confidence: f32,
    #[serde(default)]
    pub mask: Option<serde_json::Value>,
}

/// Which estimator in the cascade produced a given fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimationMethod {
    Exif,
    ExifCorrected,
    InsProjection,
    VisualRetrieval,
    Georeg,
}

/// A geolocation fix. `point` is a `geo::Point<f64>` (lon, lat order
/// internally, matching `geo`'s convention) so downstream consumers can use
/// `geo`'s distance/bearing utilities without re-deriving a coordinate type.
#[derive(Debug, Clone, Copy)]
pub struct Geolocation {
    point: geo::Point<f64>,
    pub confidence: f32,
    pub error_radius_m: f64,
    pub method: EstimationMethod,
}

impl Geolocation {
    pub fn new(lat: f64, lon: f64, confidence: f32, error_radius_m: f64, method: EstimationMethod) -> Self {
        debug_assert!((-90.0..=90.0).contains(&lat));
        debug_assert!((-180.0..=180.0).contains(&lon));
        Geolocation {
            point: geo::Point::new(lon, lat),
            confidence,
            error_radius_m,
            method,
        }
    }

    pub fn lat(&self) -> f64 {
        self.point.y()
    }

    pub fn lon(&self) -> f64 {
        self.point.x()
    }
}

impl Serialize for Geolocation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("Geolocation", 5)?;
        s.serialize_field("lat", &self.lat())?;
        s.serialize_field("lon", &self.lon())?;
        s.serialize_field("confidence", &self.confidence)?;
        s.serialize_field("error_radius_m", &self.error_radius_m)?;
        s.serialize_field("method", &self.method)?;
        s.end()
    }
}

impl<'de> Deserialize<'de> for Geolocation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Wire {
            lat: f64,
            lon: f64,
            confidence: f32,
            error_radius_m: f64,
            method: EstimationMethod,
        }
        let w = Wire::deserialize(deserializer)?;
        Ok(Geolocation::new(w.lat, w.lon, w.confidence, w.error_radius_m, w.method))
    }
}

/// A detection augmented with its best-effort geolocation and enrichments.
/// `geolocation` is `None` only transiently while the cascade runs — the
/// driver never hands one to a caller without the cascade having filled it in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    #[serde(flatten)]
    pub detection: Detection,
    pub geolocation: Option<Geolocation>,
    pub ocr_text: Option<String>,
    pub address: Option<String>,
}

/// Full pipeline output for one task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub detections: Vec<DetectionResult>,
    pub image_geolocation: Option<Geolocation>,
}

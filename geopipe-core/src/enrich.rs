//! Optional enrichers: OCR over a detection's bbox crop, and
//! reverse-geocoding of a geolocation fix. Both collaborators are modeled
//! as `Option<Box<dyn Trait>>` on the pipeline — absence is a normal state,
//! never an error.

use crate::exif::Image;
use crate::types::BBox;

pub trait OcrEngine: Send + Sync {
    /// Run OCR over the crop at `bbox`. Any failure is absorbed into `None`
    /// — never propagated.
    fn recognize(&self, image: &Image, bbox: &BBox) -> Option<String>;
}

pub trait Geocoder: Send + Sync {
    /// Reverse-geocode a fix into a human-readable address. Any failure,
    /// including a timeout, is absorbed into `None`.
    fn reverse(&self, lat: f64, lon: f64) -> Option<String>;
}

fn crop(image: &Image, bbox: &BBox) -> image::RgbImage {
    image::imageops::crop_imm(image, bbox.x, bbox.y, bbox.w.max(1), bbox.h.max(1)).to_image()
}

#[cfg(feature = "ocr")]
pub struct TesseractOcr {
    lang: String,
}

#[cfg(feature = "ocr")]
impl TesseractOcr {
    /// Language hint string as used by the original pipeline, e.g. `"rus+eng"`.
    pub fn new(lang: impl Into<String>) -> Self {
        TesseractOcr { lang: lang.into() }
    }
}

#[cfg(feature = "ocr")]
impl Default for TesseractOcr {
    fn default() -> Self {
        TesseractOcr::new("rus+eng")
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &Image, bbox: &BBox) -> Option<String> {
        let cropped = crop(image, bbox);
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(cropped)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .ok()?;

        let mut lt = leptess::LepTess::new(None, &self.lang).ok()?;
        lt.set_image_from_mem(&buf).ok()?;
        let text = lt.get_utf8_text().ok()?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

#[cfg(feature = "geocode")]
pub struct NominatimGeocoder {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "geocode")]
impl NominatimGeocoder {
    pub const ENDPOINT: &'static str = "https://nominatim.openstreetmap.org/reverse";
    const TIMEOUT: std::time::Duration = std::time::Duration::from_secs(8);

    pub fn new(user_agent: impl AsRef<str>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent.as_ref().to_string())
            .timeout(Self::TIMEOUT)
            .build()
            .expect("reqwest client configuration is static and infallible");
        NominatimGeocoder { client }
    }
}

#[cfg(feature = "geocode")]
impl Geocoder for NominatimGeocoder {
    fn reverse(&self, lat: f64, lon: f64) -> Option<String> {
        let response = self
            .client
            .get(Self::ENDPOINT)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("format", "jsonv2".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .ok()?;

        if !response.status().is_success() {
            return None;
        }
        let body: serde_json::Value = response.json().ok()?;
        body.get("display_name")?.as_str().map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_clamps_zero_sized_bbox() {
        let image = Image::new(10, 10);
        let bbox = BBox { x: 2, y: 2, w: 0, h: 0 };
        let cropped = crop(&image, &bbox);
        assert_eq!((cropped.width(), cropped.height()), (1, 1));
    }
}

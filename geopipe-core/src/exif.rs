//! Image decoding and EXIF extraction.

use std::collections::HashMap;
use std::io::Cursor;

use crate::error::{DecodeError, Result};
use crate::types::{ExifSummary, ExifValue};

/// Decoded 3-channel raster. Width/height come from `image::GenericImageView`.
pub type Image = image::RgbImage;

/// Decode raw bytes into an RGB raster plus whatever EXIF could be recovered.
/// EXIF failures are absorbed into an empty [`ExifSummary`]; only a decode
/// failure is a hard error.
pub fn decode(bytes: &[u8]) -> Result<(Image, ExifSummary)> {
    let img = image::load_from_memory(bytes).map_err(DecodeError::Image)?.to_rgb8();
    let summary = extract_exif(bytes).unwrap_or_default();
    Ok((img, summary))
}

fn extract_exif(bytes: &[u8]) -> Option<ExifSummary> {
    let mut cursor = Cursor::new(bytes);
    let exif_data = exif::Reader::new().read_from_container(&mut cursor).ok()?;

    let mut tags = HashMap::new();
    let mut gps = HashMap::new();
    for field in exif_data.fields() {
        let name = field.tag.to_string();
        let value = convert_value(&field.value);
        if name.starts_with("GPS") {
            gps.insert(name, value);
        } else {
            tags.insert(name, value);
        }
    }

    Some(ExifSummary {
        tags,
        gps: if gps.is_empty() { None } else { Some(gps) },
    })
}

fn convert_value(value: &exif::Value) -> ExifValue {
    match value {
        exif::Value::Ascii(strs) => {
            let text = strs
                .first()
                .map(|b| String::from_utf8_lossy(b).trim_end_matches('\0').to_string())
                .unwrap_or_default();
            ExifValue::Text(text)
        }
        exif::Value::Byte(bytes) => ExifValue::Bytes(bytes.clone()),
        exif::Value::Short(shorts) => ExifValue::UInt(shorts.iter().map(|&s| s as u32).collect()),
        exif::Value::Long(longs) => ExifValue::UInt(longs.clone()),
        exif::Value::Rational(rationals) => {
            ExifValue::Rational(rationals.iter().map(|r| (r.num, r.denom)).collect())
        }
        exif::Value::SRational(rationals) => {
            ExifValue::SRational(rationals.iter().map(|r| (r.num, r.denom)).collect())
        }
        other => ExifValue::Text(format!("{:?}", other)),
    }
}

/// Convert a GPS sub-map to decimal `(lat, lon)` degrees. Requires
/// `GPSLatitude`/`GPSLatitudeRef` and `GPSLongitude`/`GPSLongitudeRef`; any
/// missing or malformed component yields `None`, never a panic.
pub fn gps_to_decimal(gps: &HashMap<String, ExifValue>) -> Option<(f64, f64)> {
    let lat = dms_to_decimal(gps.get("GPSLatitude")?)?;
    let lat_ref = gps.get("GPSLatitudeRef")?.as_ref_char()?;
    let lon = dms_to_decimal(gps.get("GPSLongitude")?)?;
    let lon_ref = gps.get("GPSLongitudeRef")?.as_ref_char()?;

    let lat = if lat_ref.to_ascii_uppercase() == 'S' { -lat } else { lat };
    let lon = if lon_ref.to_ascii_uppercase() == 'W' { -lon } else { lon };
    Some((lat, lon))
}

fn dms_to_decimal(value: &ExifValue) -> Option<f64> {
    let ExifValue::Rational(parts) = value else {
        return None;
    };
    if parts.len() != 3 || parts.iter().any(|(_, denom)| *denom == 0) {
        return None;
    }
    let deg = parts[0].0 as f64 / parts[0].1 as f64;
    let min = parts[1].0 as f64 / parts[1].1 as f64;
    let sec = parts[2].0 as f64 / parts[2].1 as f64;
    Some(deg + min / 60.0 + sec / 3600.0)
}

/// Inverse of `dms_to_decimal`: split an absolute decimal-degree value back
/// into `(degrees, minutes, seconds)`. Degrees/minutes are truncated to
/// whole units as EXIF's GPS IFD itself stores them; seconds carry the
/// fractional remainder. Takes the unsigned magnitude — hemisphere sign is
/// a separate `GPSLatitudeRef`/`GPSLongitudeRef` concern, not part of the
/// DMS triple itself.
pub fn decimal_to_dms(decimal_degrees: f64) -> (u32, u32, f64) {
    let decimal_degrees = decimal_degrees.abs();
    let deg = decimal_degrees.trunc();
    let rem_minutes = (decimal_degrees - deg) * 60.0;
    let min = rem_minutes.trunc();
    let sec = (rem_minutes - min) * 60.0;
    (deg as u32, min as u32, sec)
}

//! Camera model: focal-length estimation, pixel-to-ray, yaw/pitch/roll
//! rotation, ENU offset -> geodetic conversion.

use nalgebra::{Matrix3, Vector3};

/// Sensor width assumed when EXIF/INS doesn't specify one (35mm-equivalent
/// full-frame width).
pub const DEFAULT_SENSOR_MM: f64 = 36.0;

/// Mean Earth radius used for the small-angle ENU<->geodetic approximation.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// `focal_px = focal_mm * (img_width / sensor_mm)`. Never errors: a missing
/// or unusable `focal_mm` simply yields `None`.
pub fn estimate_focal_px(focal_mm: Option<f64>, img_width: u32, sensor_mm: Option<f64>) -> Option<f64> {
    let focal_mm = focal_mm.filter(|v| v.is_finite() && *v > 0.0)?;
    let sensor_mm = sensor_mm.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(DEFAULT_SENSOR_MM);
    Some(focal_mm * (img_width as f64 / sensor_mm))
}

/// Camera-frame direction vector for a pixel, L2-normalized. Camera
/// convention: +x right, +y down (image convention), +z forward.
pub fn pixel_to_direction(u: f64, v: f64, cx: f64, cy: f64, fx: f64, fy: f64) -> Vector3<f64> {
    let x = (u - cx) / fx;
    let y = (v - cy) / fy;
    Vector3::new(x, y, 1.0).normalize()
}

/// `R = Rz(yaw) * Ry(pitch) * Rx(roll)`, angles in degrees. Applied to a
/// camera-frame vector, the result is expressed in the world ENU frame
/// (east, north, up). See DESIGN.md for the axis-convention caveat (spec
/// Open Question (a)): this composition order is asserted, not re-derived
/// from first principles, and should be validated against a reference pose
/// before being trusted for a new camera rig.
pub fn rotation_from_ypr(yaw_deg: f64, pitch_deg: f64, roll_deg: f64) -> Matrix3<f64> {
    let (yaw, pitch, roll) = (yaw_deg.to_radians(), pitch_deg.to_radians(), roll_deg.to_radians());

    let rz = Matrix3::new(
        yaw.cos(), -yaw.sin(), 0.0,
        yaw.sin(), yaw.cos(), 0.0,
        0.0, 0.0, 1.0,
    );
    let ry = Matrix3::new(
        pitch.cos(), 0.0, pitch.sin(),
        0.0, 1.0, 0.0,
        -pitch.sin(), 0.0, pitch.cos(),
    );
    let rx = Matrix3::new(
        1.0, 0.0, 0.0,
        0.0, roll.cos(), -roll.sin(),
        0.0, roll.sin(), roll.cos(),
    );

    rz * ry * rx
}

/// Fixed axis relabeling applied to a camera-frame direction vector
/// *before* `rotation_from_ypr` is applied. Resolves spec Open Question (a):
/// the spec leaves the camera-frame-to-world-ENU axis convention
/// unspecified beyond the rotation composition order, so the neutral
/// heading (yaw = pitch = roll = 0) is pinned down by this matrix instead
/// of left as an implicit identity mapping. It is chosen so that:
/// - a level, forward-looking camera yields a horizontal ray, and
/// - pitch = -90° yields a ray pointing straight down,
/// which an identity premap cannot satisfy simultaneously under a
/// standard `Rz*Ry*Rx` composition (the forward axis has to enter that
/// composition already off the y-axis for pitch to tilt it toward "up").
/// It does not claim any particular compass heading for yaw = 0 — only
/// the two documented boundary behaviors are load-bearing here.
pub fn camera_axes_to_world() -> Matrix3<f64> {
    Matrix3::new(
        0.0, 0.0, -1.0,
        1.0, 0.0, 0.0,
        0.0, -1.0, 0.0,
    )
}

/// Small-angle ENU metre offset -> geodetic degree offset, from an origin
/// `(lat0, lon0)`. Valid only for offsets small relative to Earth's radius.
pub fn enu_offset_to_latlon(lat0: f64, lon0: f64, east_m: f64, north_m: f64) -> (f64, f64) {
    let lat_rad = lat0.to_radians();
    let dlat = (north_m / EARTH_RADIUS_M).to_degrees();
    let dlon = (east_m / (EARTH_RADIUS_M * lat_rad.cos())).to_degrees();
    (lat0 + dlat, lon0 + dlon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn focal_px_absent_without_focal_mm() {
        assert_eq!(estimate_focal_px(None, 4000, None), None);
    }

    #[test]
    fn focal_px_uses_default_sensor_width() {
        let px = estimate_focal_px(Some(35.0), 4000, None).unwrap();
        assert_abs_diff_eq!(px, 35.0 * (4000.0 / 36.0), epsilon = 1e-9);
    }

    #[test]
    fn rotation_matrix_is_orthonormal() {
        let r = rotation_from_ypr(12.0, -34.0, 56.0);
        let identity = r * r.transpose();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(identity[(i, j)], expected, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn zero_rotation_is_identity() {
        let r = rotation_from_ypr(0.0, 0.0, 0.0);
        assert_abs_diff_eq!(r, Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn enu_offset_zero_is_identity() {
        let (lat, lon) = enu_offset_to_latlon(55.75, 37.61, 0.0, 0.0);
        assert_eq!(lat, 55.75);
        assert_eq!(lon, 37.61);
    }

    #[test]
    fn pixel_to_direction_is_normalized() {
        let d = pixel_to_direction(100.0, 50.0, 960.0, 540.0, 1200.0, 1200.0);
        assert_abs_diff_eq!(d.norm(), 1.0, epsilon = 1e-12);
    }
}

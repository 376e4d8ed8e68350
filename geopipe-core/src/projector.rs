//! Ground-plane ray-cast projector.

use crate::camera::{camera_axes_to_world, enu_offset_to_latlon, pixel_to_direction, rotation_from_ypr};
use crate::types::{BBox, EstimationMethod, Geolocation};

/// Ray near-horizontal threshold (`|d_z| < EPSILON` => no ground intersection).
const EPSILON: f64 = 1e-6;

/// Intersect the ray through a bbox's center pixel with the horizontal
/// ground plane `camera_alt_m` below the camera, and convert the
/// intersection to a geodetic fix. Returns `None` for a degenerate ray
/// (near-horizontal, or pointing into the sky) — never panics.
#[allow(clippy::too_many_arguments)]
pub fn project_bbox_center(
    bbox: &BBox,
    img_w: u32,
    img_h: u32,
    cam_lat: f64,
    cam_lon: f64,
    cam_alt_m: f64,
    yaw_deg: f64,
    pitch_deg: f64,
    roll_deg: f64,
    focal_px: Option<f64>,
) -> Option<Geolocation> {
    let (u, v) = bbox.center();
    let focal_px = focal_px.unwrap_or_else(|| img_w.max(img_h) as f64);
    let cx = img_w as f64 / 2.0;
    let cy = img_h as f64 / 2.0;

    let d_cam = pixel_to_direction(u, v, cx, cy, focal_px, focal_px);
    let d_pre = camera_axes_to_world() * d_cam;
    let r = rotation_from_ypr(yaw_deg, pitch_deg, roll_deg);
    let d_world = r * d_pre;

    if d_world.z.abs() < EPSILON {
        return None;
    }
    let t = -cam_alt_m / d_world.z;
    if t <= 0.0 {
        return None;
    }

    let east = d_world.x * t;
    let north = d_world.y * t;
    let (lat, lon) = enu_offset_to_latlon(cam_lat, cam_lon, east, north);

    let error_radius_m = (cam_alt_m * 0.1 + 2.0 / d_world.z.abs()).max(5.0);
    Some(Geolocation::new(lat, lon, 0.8, error_radius_m, EstimationMethod::InsProjection))
}

//! Off-axis projection for arbitrarily placed display surfaces.
//!
//! Implements the generalized perspective projection (Kooima,
//! <http://csc.lsu.edu/~kooima/articles/genperspective/>): for an eye at any
//! position strictly off a display's plane, the asymmetric frustum through
//! the display rectangle yields an image that is geometrically correct when
//! viewed from that eye, so adjacent displays join without visible seams.
//!
//! Everything here is a closed-form pure function of (eye, geometry, clip
//! planes). It allocates nothing and is recomputed for every display on
//! every frame the eye moves.

use glam::{Mat4, Vec3, Vec4};

use crate::error::RigError;
use crate::rig::DisplayGeometry;

/// Below this eye-to-plane distance the frustum is considered degenerate.
const MIN_PLANE_DISTANCE: f32 = 1e-6;

/// Frustum extents on the near plane, relative to the eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumExtents {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

/// Orthonormal basis of a display surface: right, up, normal.
fn display_basis(display: &DisplayGeometry) -> (Vec3, Vec3, Vec3) {
    let vr = (display.pb - display.pa).normalize();
    let vu = (display.pc - display.pa).normalize();
    let vn = vr.cross(vu).normalize();
    (vr, vu, vn)
}

/// Compute the frustum extents for `eye` looking through `display`, scaled
/// to the near clip plane.
///
/// Fails with [`RigError::DegenerateGeometry`] when the eye lies on the
/// display's plane; the distance `d` would be zero and the extents would
/// divide to infinity.
pub fn frustum_extents(
    eye: Vec3,
    display: &DisplayGeometry,
    near: f32,
) -> Result<FrustumExtents, RigError> {
    let (vr, vu, vn) = display_basis(display);

    let va = display.pa - eye;
    let vb = display.pb - eye;
    let vc = display.pc - eye;

    // Perpendicular distance from the eye to the display plane.
    let d = -vn.dot(va);
    if d.abs() < MIN_PLANE_DISTANCE {
        return Err(RigError::DegenerateGeometry(display.name.clone()));
    }

    let scale = near / d;
    Ok(FrustumExtents {
        left: vr.dot(va) * scale,
        right: vr.dot(vb) * scale,
        bottom: vu.dot(va) * scale,
        top: vu.dot(vc) * scale,
    })
}

/// Standard asymmetric perspective matrix `P(l, r, b, t, n, f)`.
fn asymmetric_perspective(e: &FrustumExtents, near: f32, far: f32) -> Mat4 {
    let (l, r, b, t) = (e.left, e.right, e.bottom, e.top);
    Mat4::from_cols(
        Vec4::new(2.0 * near / (r - l), 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / (t - b), 0.0, 0.0),
        Vec4::new(
            (r + l) / (r - l),
            (t + b) / (t - b),
            -(far + near) / (far - near),
            -1.0,
        ),
        Vec4::new(0.0, 0.0, -2.0 * far * near / (far - near), 0.0),
    )
}

/// Compute the full world-to-clip matrix for one display.
///
/// Composition is `P * Mᵀ * T`: translate the world by `-eye`, rotate it
/// into the display-aligned camera frame, then apply the asymmetric
/// perspective. The result replaces the camera's native FOV/aspect
/// projection for that display.
pub fn compute_projection(
    eye: Vec3,
    display: &DisplayGeometry,
    near: f32,
    far: f32,
) -> Result<Mat4, RigError> {
    let extents = frustum_extents(eye, display, near)?;
    let (vr, vu, vn) = display_basis(display);

    let p = asymmetric_perspective(&extents, near, far);

    // World -> display-aligned frame: the columns of M are the display
    // basis vectors, so its transpose maps world vectors onto them.
    let m = Mat4::from_cols(
        Vec4::new(vr.x, vr.y, vr.z, 0.0),
        Vec4::new(vu.x, vu.y, vu.z, 0.0),
        Vec4::new(vn.x, vn.y, vn.z, 0.0),
        Vec4::W,
    );

    let t = Mat4::from_translation(-eye);

    Ok(p * m.transpose() * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DisplayConfig;
    use crate::rig::DisplayRig;

    const TOL: f32 = 1e-4;

    fn rig() -> DisplayRig {
        DisplayRig::three_panel(&DisplayConfig {
            width_m: 2.0,
            height_m: 1.5,
            ..DisplayConfig::default()
        })
    }

    /// Project a world point and return normalized device coordinates.
    fn to_ndc(matrix: &Mat4, point: Vec3) -> Vec3 {
        let clip = *matrix * Vec4::new(point.x, point.y, point.z, 1.0);
        assert!(clip.w.abs() > 1e-9, "point at eye plane");
        Vec3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w)
    }

    #[test]
    fn test_corners_map_to_ndc_extremes() {
        let rig = rig();
        // An eye well off-center, strictly off every display plane.
        let eye = Vec3::new(0.3, -0.1, 0.2);

        for display in rig.displays() {
            let m = compute_projection(eye, display, 0.01, 100.0).unwrap();

            let pa = to_ndc(&m, display.pa);
            let pb = to_ndc(&m, display.pb);
            let pc = to_ndc(&m, display.pc);
            let pd = to_ndc(&m, display.pd());

            assert!((pa.x + 1.0).abs() < TOL && (pa.y + 1.0).abs() < TOL);
            assert!((pb.x - 1.0).abs() < TOL && (pb.y + 1.0).abs() < TOL);
            assert!((pc.x + 1.0).abs() < TOL && (pc.y - 1.0).abs() < TOL);
            assert!((pd.x - 1.0).abs() < TOL && (pd.y - 1.0).abs() < TOL);
        }
    }

    #[test]
    fn test_centered_eye_gives_symmetric_frustum() {
        let rig = rig();
        let eye = Vec3::ZERO;

        for display in rig.displays() {
            let e = frustum_extents(eye, display, 0.01).unwrap();
            assert!((e.left + e.right).abs() < TOL, "{}: l != -r", display.name);
            assert!((e.bottom + e.top).abs() < TOL, "{}: b != -t", display.name);
        }
    }

    #[test]
    fn test_centered_eye_matches_symmetric_formula() {
        // With the eye centered, the off-axis result must agree with the
        // naive symmetric frustum: half-width scaled by near/distance.
        let rig = rig();
        let north = &rig.displays()[0];
        let near = 0.01;
        let e = frustum_extents(Vec3::ZERO, north, near).unwrap();

        // North panel: 2.0 wide, 1.5 tall, 1.0 away.
        assert!((e.right - near * 1.0).abs() < TOL);
        assert!((e.top - near * 0.75).abs() < TOL);
    }

    #[test]
    fn test_adjacent_displays_agree_on_shared_edge() {
        let rig = rig();
        let north = &rig.displays()[0];
        let east = &rig.displays()[2];
        let eye = Vec3::new(0.15, 0.05, -0.1);

        let m_north = compute_projection(eye, north, 0.01, 100.0).unwrap();
        let m_east = compute_projection(eye, east, 0.01, 100.0).unwrap();

        // Sample points along the shared vertical edge (north.pb == east.pa).
        for s in [0.0_f32, 0.25, 0.5, 0.75, 1.0] {
            let point = north.pb + s * (north.pc - north.pa);

            let on_north = to_ndc(&m_north, point);
            let on_east = to_ndc(&m_east, point);

            // The edge is the right border of North and the left border of
            // East, at the same height on both.
            assert!((on_north.x - 1.0).abs() < TOL);
            assert!((on_east.x + 1.0).abs() < TOL);
            assert!((on_north.y - on_east.y).abs() < TOL);
        }
    }

    #[test]
    fn test_eye_on_display_plane_rejected() {
        let rig = rig();
        let north = &rig.displays()[0];

        // Any point with z == -1 is coplanar with the north panel.
        let err = frustum_extents(Vec3::new(0.4, 0.2, -1.0), north, 0.01).unwrap_err();
        assert!(matches!(err, RigError::DegenerateGeometry(name) if name == "north"));

        let err = compute_projection(Vec3::new(0.0, 0.0, -1.0), north, 0.01, 100.0).unwrap_err();
        assert!(matches!(err, RigError::DegenerateGeometry(_)));
    }

    #[test]
    fn test_matrix_is_pure_function_of_inputs() {
        let rig = rig();
        let north = &rig.displays()[0];
        let eye = Vec3::new(0.1, 0.2, 0.3);

        let a = compute_projection(eye, north, 0.01, 100.0).unwrap();
        let b = compute_projection(eye, north, 0.01, 100.0).unwrap();
        assert_eq!(a, b);
    }
}

//! 3D math vocabulary exposed to controller scripts.
//!
//! Thin free functions over glam value types: everything returns a new
//! value, all angles are radians. The projection targets wgpu's 0..1
//! clip-space depth range.

use glam::{Mat4, Vec3};

/// Normalize, returning the zero vector for zero-length input instead of NaN.
pub fn normalize(v: Vec3) -> Vec3 {
    v.normalize_or_zero()
}

/// Right-handed look-at view matrix.
///
/// Builds the basis `forward = normalize(center - eye)`,
/// `side = normalize(cross(forward, up))`, `camera_up = cross(side, forward)`.
/// Degenerate axes beyond the zero-length guard are the caller's problem.
pub fn look_at(eye: Vec3, center: Vec3, up: Vec3) -> Mat4 {
    Mat4::look_at_rh(eye, center, up)
}

/// Right-handed perspective projection with 0..1 depth.
///
/// `near` and `far` must both be positive with `near < far`; the result is
/// undefined otherwise (not validated).
pub fn perspective(fovy: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(fovy, aspect, near, far)
}

/// Rotation about the X axis.
pub fn rotate_x(angle: f32) -> Mat4 {
    Mat4::from_rotation_x(angle)
}

/// Rotation about the Y axis.
pub fn rotate_y(angle: f32) -> Mat4 {
    Mat4::from_rotation_y(angle)
}

/// Translation matrix.
pub fn translate(v: Vec3) -> Mat4 {
    Mat4::from_translation(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f32 = 1e-5;

    #[test]
    fn normalize_zero_guard() {
        assert_eq!(normalize(Vec3::ZERO), Vec3::ZERO);
        let n = normalize(Vec3::new(3.0, 0.0, 4.0));
        assert!((n.length() - 1.0).abs() < TOL);
    }

    #[test]
    fn identity_is_multiplicative_unit() {
        let m = translate(Vec3::new(1.0, -2.0, 3.0)) * rotate_y(0.7);
        let lhs = Mat4::IDENTITY * m;
        for (a, b) in lhs.to_cols_array().iter().zip(m.to_cols_array()) {
            assert!((a - b).abs() < TOL);
        }
    }

    #[test]
    fn multiplication_applies_rhs_first() {
        // (A*B)*v == A*(B*v)
        let a = rotate_x(0.4);
        let b = translate(Vec3::new(0.0, 1.0, 0.0));
        let v = Vec3::new(2.0, 0.0, -1.0);
        let composed = (a * b).transform_point3(v);
        let stepped = a.transform_point3(b.transform_point3(v));
        assert!((composed - stepped).length() < TOL);
    }

    #[test]
    fn look_at_basis_is_orthonormal() {
        let m = look_at(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y);
        let rows = [m.row(0).truncate(), m.row(1).truncate(), m.row(2).truncate()];
        for row in &rows {
            assert!((row.length() - 1.0).abs() < TOL);
        }
        assert!(rows[0].dot(rows[1]).abs() < TOL);
        assert!(rows[0].dot(rows[2]).abs() < TOL);
        assert!(rows[1].dot(rows[2]).abs() < TOL);
    }

    #[test]
    fn translate_lands_in_last_column() {
        let m = translate(Vec3::new(1.0, 0.0, 0.0));
        // Column-major: elements 12..14 hold the translation.
        assert_eq!(m.to_cols_array()[12], 1.0);
        assert_eq!(m.to_cols_array()[13], 0.0);
        assert_eq!(m.to_cols_array()[14], 0.0);
    }

    #[test]
    fn perspective_maps_near_and_far_to_unit_depth() {
        let p = perspective(std::f32::consts::FRAC_PI_4, 16.0 / 9.0, 0.1, 100.0);
        let near = p.project_point3(Vec3::new(0.0, 0.0, -0.1));
        let far = p.project_point3(Vec3::new(0.0, 0.0, -100.0));
        assert!(near.z.abs() < TOL);
        assert!((far.z - 1.0).abs() < TOL);
    }
}

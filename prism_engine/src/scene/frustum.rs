/// View-space culling frustum and the separating-axis visibility test
///
/// The frustum is a symmetric perspective pyramid looking down -Z, described
/// by the near-plane half extents and the near/far distances. The four side
/// planes pass through the eye; the near half-space is evaluated at the eye
/// plane (z = 0), so the test is conservative between the eye and the near
/// plane.
///
/// Planes are stored as (A, B, C, D) with an outward-pointing normal: a point
/// P lies outside a plane when `A*x + B*y + C*z + D > 0`.

use glam::{Mat4, Vec3, Vec4};
use crate::error::{Error, Result};
use crate::scene::Aabb;

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

/// Axes shorter than this are skipped by the separating-axis pass
const DEGENERATE_AXIS: f32 = 1e-12;

/// Symmetric perspective frustum in view space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CullingFrustum {
    /// Near-plane half width (r)
    pub half_width: f32,
    /// Near-plane half height (t)
    pub half_height: f32,
    /// Near distance (n)
    pub near: f32,
    /// Far distance (f)
    pub far: f32,
}

impl CullingFrustum {
    /// Build a frustum from near-plane half extents and clip distances
    ///
    /// # Errors
    ///
    /// `Error::ValidationFailed` unless `half_width`, `half_height` and
    /// `near` are positive and `far > near`.
    pub fn new(half_width: f32, half_height: f32, near: f32, far: f32) -> Result<Self> {
        let valid = half_width > 0.0
            && half_height > 0.0
            && near > 0.0
            && far > near
            && half_width.is_finite()
            && half_height.is_finite()
            && far.is_finite();
        if !valid {
            return Err(Error::ValidationFailed(format!(
                "invalid culling frustum r={} t={} n={} f={}",
                half_width, half_height, near, far
            )));
        }
        Ok(Self { half_width, half_height, near, far })
    }

    /// Frustum matching a `Mat4::perspective_rh` projection
    pub fn from_perspective(fov_y_radians: f32, aspect_ratio: f32, near: f32, far: f32) -> Result<Self> {
        let half_height = near * (fov_y_radians * 0.5).tan();
        Self::new(half_height * aspect_ratio, half_height, near, far)
    }

    /// Outward planes: left, right, bottom, top, near, far
    pub fn planes(&self) -> [Vec4; 6] {
        let (r, t, n, f) = (self.half_width, self.half_height, self.near, self.far);
        [
            Vec4::new(-n, 0.0, r, 0.0),
            Vec4::new(n, 0.0, r, 0.0),
            Vec4::new(0.0, -n, t, 0.0),
            Vec4::new(0.0, n, t, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(0.0, 0.0, -1.0, -f),
        ]
    }

    /// Vertices of the pyramid: the eye, then the four far-plane corners
    pub fn vertices(&self) -> [Vec3; 5] {
        let scale = self.far / self.near;
        let x = self.half_width * scale;
        let y = self.half_height * scale;
        let z = -self.far;
        [
            Vec3::ZERO,
            Vec3::new(-x, -y, z),
            Vec3::new(x, -y, z),
            Vec3::new(-x, y, z),
            Vec3::new(x, y, z),
        ]
    }

    /// Whether a transformed box may be visible
    ///
    /// `view_model` maps object space to view space (view * model); only its
    /// affine part is used. Returns `false` only when a separating plane or
    /// box axis exists, so false positives are possible and false negatives
    /// are not.
    pub fn is_visible(&self, view_model: &Mat4, aabb: &Aabb) -> bool {
        let corners = aabb.corners().map(|c| view_model.transform_point3(c));

        // Frustum face normals
        for plane in self.planes() {
            let normal = plane.truncate();
            if corners.iter().all(|c| normal.dot(*c) + plane.w > 0.0) {
                return false;
            }
        }

        // Box face normals
        let center = view_model.transform_point3(aabb.center());
        let half = aabb.half_extents();
        let axes = [
            view_model.x_axis.truncate(),
            view_model.y_axis.truncate(),
            view_model.z_axis.truncate(),
        ];
        let scaled = [axes[0] * half.x, axes[1] * half.y, axes[2] * half.z];
        let vertices = self.vertices();

        for axis in axes {
            if axis.length_squared() < DEGENERATE_AXIS {
                continue;
            }
            let box_center = center.dot(axis);
            let box_radius: f32 = scaled.iter().map(|s| s.dot(axis).abs()).sum();

            let mut frustum_min = f32::MAX;
            let mut frustum_max = f32::MIN;
            for v in &vertices {
                let d = v.dot(axis);
                frustum_min = frustum_min.min(d);
                frustum_max = frustum_max.max(d);
            }

            if box_center - box_radius > frustum_max || box_center + box_radius < frustum_min {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;

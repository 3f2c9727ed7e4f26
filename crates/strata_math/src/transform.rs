// Transform utilities for rotation matrices.
//
// glam::DMat3 already provides mul_vec3() and transpose(); this adds the
// bounding-box helper the instancing wrappers need.

use crate::{Aabb, DMat3};

/// Extension trait for DMat3 used by rotation wrappers.
pub trait RotationExt {
    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;
}

impl RotationExt for DMat3 {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        let corners = aabb.corners().map(|corner| self.mul_vec3(corner));
        let mut result_min = corners[0];
        let mut result_max = corners[0];
        for corner in &corners[1..] {
            result_min = result_min.min(*corner);
            result_max = result_max.max(*corner);
        }
        Aabb::from_points(result_min, result_max)
    }
}

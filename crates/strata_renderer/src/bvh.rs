//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Binary tree over the scene's primitives. Each level splits on a random
//! axis drawn from a fixed-seed generator, so the same input always builds
//! the same tree.

use std::sync::Arc;
use std::time::Instant;

use rand::{Rng, RngCore, SeedableRng};
use strata_math::{Aabb, Interval, Ray, StrataRng};

use crate::error::{SceneError, SceneResult};
use crate::hittable::{Hit, Hittable};

/// Seed for the split-axis generator.
const BVH_SEED: u64 = 0x5eed_b7b7;

/// BVH node.
///
/// A box of `None` means some primitive below could not report bounds; such
/// nodes are always descended.
pub enum BvhNode {
    /// Single primitive, standing in for both children.
    Leaf {
        object: Arc<dyn Hittable>,
        bbox: Option<Aabb>,
    },
    /// Two primitives, one per side.
    Pair {
        left: Arc<dyn Hittable>,
        right: Arc<dyn Hittable>,
        bbox: Option<Aabb>,
    },
    /// Internal node with two subtrees.
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Option<Aabb>,
    },
}

impl BvhNode {
    /// Build a BVH over `objects` for the shutter interval `[time0, time1]`.
    pub fn new(objects: Vec<Arc<dyn Hittable>>, time0: f64, time1: f64) -> SceneResult<Self> {
        let mut rng = StrataRng::seed_from_u64(BVH_SEED);
        Self::build_with_rng(objects, time0, time1, &mut rng)
    }

    /// Build with a caller-provided generator for the split axes.
    pub fn build_with_rng(
        objects: Vec<Arc<dyn Hittable>>,
        time0: f64,
        time1: f64,
        rng: &mut dyn RngCore,
    ) -> SceneResult<Self> {
        if objects.is_empty() {
            return Err(SceneError::EmptyPrimitiveList);
        }

        log::info!("Building BVH with {} elements", objects.len());
        let start = Instant::now();

        let node = Self::build(objects, time0, time1, rng);

        log::info!("Completed BVH construction in {:?}", start.elapsed());
        Ok(node)
    }

    fn build(
        mut objects: Vec<Arc<dyn Hittable>>,
        time0: f64,
        time1: f64,
        rng: &mut dyn RngCore,
    ) -> Self {
        let axis = rng.gen_range(0..3usize);

        let key = |object: &Arc<dyn Hittable>| {
            object
                .bounding_box(time0, time1)
                .map_or(f64::NEG_INFINITY, |b| b.axis_interval(axis).min)
        };
        objects.sort_by(|a, b| key(a).total_cmp(&key(b)));

        match objects.len() {
            1 => {
                let object = objects.remove(0);
                let bbox = object_box(&object, time0, time1);
                BvhNode::Leaf { object, bbox }
            }
            2 => {
                let right = objects.remove(1);
                let left = objects.remove(0);
                let bbox = union(
                    object_box(&left, time0, time1),
                    object_box(&right, time0, time1),
                );
                BvhNode::Pair { left, right, bbox }
            }
            n => {
                let right_objects = objects.split_off(n / 2);
                let left = Self::build(objects, time0, time1, rng);
                let right = Self::build(right_objects, time0, time1, rng);
                let bbox = union(left.bbox(), right.bbox());
                BvhNode::Branch {
                    left: Box::new(left),
                    right: Box::new(right),
                    bbox,
                }
            }
        }
    }

    /// Cached bounding box of this node.
    pub fn bbox(&self) -> Option<Aabb> {
        match self {
            BvhNode::Leaf { bbox, .. } | BvhNode::Pair { bbox, .. } | BvhNode::Branch { bbox, .. } => {
                *bbox
            }
        }
    }
}

fn object_box(object: &Arc<dyn Hittable>, time0: f64, time1: f64) -> Option<Aabb> {
    let bbox = object.bounding_box(time0, time1);
    if bbox.is_none() {
        log::warn!("No bounding box in BVH node constructor");
    }
    bbox
}

fn union(a: Option<Aabb>, b: Option<Aabb>) -> Option<Aabb> {
    Some(Aabb::surrounding(&a?, &b?))
}

/// Nearest of two hits, the right one tested only up to the left's `t`.
fn closest_of<'a>(
    left: &'a dyn Hittable,
    right: &'a dyn Hittable,
    ray: &Ray,
    ray_t: Interval,
) -> Option<Hit<'a>> {
    let hit_left = left.hit(ray, ray_t);
    let right_max = hit_left.as_ref().map_or(ray_t.max, |h| h.0.t);
    let hit_right = right.hit(ray, ray_t.with_max(right_max));
    hit_right.or(hit_left)
}

/// [`closest_of`] carrying the edge flag of the winning hit.
fn closest_edge_of<'a>(
    left: &'a dyn Hittable,
    right: &'a dyn Hittable,
    ray: &Ray,
    ray_t: Interval,
    width: f64,
) -> Option<(Hit<'a>, bool)> {
    let hit_left = left.hit_edge(ray, ray_t, width);
    let right_max = hit_left.as_ref().map_or(ray_t.max, |(h, _)| h.0.t);
    let hit_right = right.hit_edge(ray, ray_t.with_max(right_max), width);
    hit_right.or(hit_left)
}

impl Hittable for BvhNode {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<Hit<'_>> {
        if let Some(bbox) = self.bbox() {
            if !bbox.hit(ray, ray_t) {
                return None;
            }
        }

        match self {
            BvhNode::Leaf { object, .. } => object.hit(ray, ray_t),
            BvhNode::Pair { left, right, .. } => {
                closest_of(&**left, &**right, ray, ray_t)
            }
            BvhNode::Branch { left, right, .. } => {
                closest_of(&**left, &**right, ray, ray_t)
            }
        }
    }

    fn hit_edge(&self, ray: &Ray, ray_t: Interval, width: f64) -> Option<(Hit<'_>, bool)> {
        if let Some(bbox) = self.bbox() {
            if !bbox.hit(ray, ray_t) {
                return None;
            }
        }

        match self {
            BvhNode::Leaf { object, .. } => object.hit_edge(ray, ray_t, width),
            BvhNode::Pair { left, right, .. } => {
                closest_edge_of(&**left, &**right, ray, ray_t, width)
            }
            BvhNode::Branch { left, right, .. } => {
                closest_edge_of(&**left, &**right, ray, ray_t, width)
            }
        }
    }

    fn bounding_box(&self, _time0: f64, _time1: f64) -> Option<Aabb> {
        self.bbox()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AxisRect, HittableList, Material, Sphere, Triangle};
    use rand::rngs::StdRng;
    use strata_math::{Color, Vec3};

    fn grey() -> Arc<Material> {
        Arc::new(Material::lambertian(Color::splat(0.5)))
    }

    fn random_scene(count: usize, seed: u64) -> Vec<Arc<dyn Hittable>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|i| -> Arc<dyn Hittable> {
                let c = Vec3::new(
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(-20.0..20.0),
                );
                match i % 3 {
                    0 => Arc::new(Sphere::new(c, rng.gen_range(0.1..2.0), grey())),
                    1 => Arc::new(Triangle::new(c, c + Vec3::X, c + Vec3::Y, grey())),
                    _ => Arc::new(AxisRect::xz((c.x, c.x + 1.0), (c.z, c.z + 2.0), c.y, grey())),
                }
            })
            .collect()
    }

    /// Every node's box encloses the boxes of everything below it.
    fn assert_contains_children(node: &BvhNode) {
        let Some(bbox) = node.bbox() else {
            return;
        };
        match node {
            BvhNode::Leaf { object, .. } => {
                assert!(bbox.contains(&object.bounding_box(0.0, 1.0).unwrap()));
            }
            BvhNode::Pair { left, right, .. } => {
                assert!(bbox.contains(&left.bounding_box(0.0, 1.0).unwrap()));
                assert!(bbox.contains(&right.bounding_box(0.0, 1.0).unwrap()));
            }
            BvhNode::Branch { left, right, .. } => {
                assert!(bbox.contains(&left.bbox().unwrap()));
                assert!(bbox.contains(&right.bbox().unwrap()));
                assert_contains_children(left);
                assert_contains_children(right);
            }
        }
    }

    #[test]
    fn test_bvh_empty_is_error() {
        assert!(matches!(
            BvhNode::new(vec![], 0.0, 1.0),
            Err(SceneError::EmptyPrimitiveList)
        ));
    }

    #[test]
    fn test_bvh_single_and_pair() {
        let one = BvhNode::new(random_scene(1, 1), 0.0, 1.0).unwrap();
        assert!(matches!(one, BvhNode::Leaf { .. }));

        let two = BvhNode::new(random_scene(2, 1), 0.0, 1.0).unwrap();
        assert!(matches!(two, BvhNode::Pair { .. }));
        assert_contains_children(&two);
    }

    #[test]
    fn test_bvh_containment() {
        for (count, seed) in [(3, 1), (10, 2), (257, 3), (1000, 4)] {
            let bvh = BvhNode::new(random_scene(count, seed), 0.0, 1.0).unwrap();
            assert_contains_children(&bvh);
        }
    }

    #[test]
    fn test_bvh_matches_linear_scan() {
        let objects = random_scene(300, 9);
        let list = HittableList::from(objects.clone());
        let bvh = BvhNode::new(objects, 0.0, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(10);

        for _ in 0..500 {
            let origin = Vec3::new(
                rng.gen_range(-30.0..30.0),
                rng.gen_range(-30.0..30.0),
                rng.gen_range(-30.0..30.0),
            );
            let target = Vec3::new(
                rng.gen_range(-20.0..20.0),
                rng.gen_range(-20.0..20.0),
                rng.gen_range(-20.0..20.0),
            );
            let ray = Ray::new(origin, target - origin, 0.0);
            let ray_t = Interval::new(0.001, f64::INFINITY);

            let expected = list.hit(&ray, ray_t).map(|h| h.0.t);
            let actual = bvh.hit(&ray, ray_t).map(|h| h.0.t);
            assert_eq!(expected, actual);

            let expected = list.hit_edge(&ray, ray_t, 0.1).map(|(h, e)| (h.0.t, e));
            let actual = bvh.hit_edge(&ray, ray_t, 0.1).map(|(h, e)| (h.0.t, e));
            assert_eq!(expected, actual);
        }
    }

    #[test]
    fn test_bvh_is_reproducible() {
        let a = BvhNode::new(random_scene(50, 5), 0.0, 1.0).unwrap();
        let b = BvhNode::new(random_scene(50, 5), 0.0, 1.0).unwrap();
        assert_eq!(a.bbox(), b.bbox());
    }

    struct Unbounded;

    impl Hittable for Unbounded {
        fn hit(&self, _ray: &Ray, _ray_t: Interval) -> Option<Hit<'_>> {
            None
        }

        fn bounding_box(&self, _time0: f64, _time1: f64) -> Option<Aabb> {
            None
        }
    }

    #[test]
    fn test_bvh_missing_box_still_descends() {
        let mut objects = random_scene(5, 6);
        objects.push(Arc::new(Sphere::new(Vec3::new(0.0, 0.0, -50.0), 1.0, grey())));
        objects.push(Arc::new(Unbounded));
        let bvh = BvhNode::new(objects, 0.0, 1.0).unwrap();
        assert!(bvh.bbox().is_none());

        let ray = Ray::new(Vec3::new(0.0, 0.0, -40.0), -Vec3::Z, 0.0);
        let (rec, _) = bvh.hit(&ray, Interval::new(0.001, f64::INFINITY)).unwrap();
        assert!((rec.t - 9.0).abs() < 1e-9);
    }
}

//! Renderable scene snapshot.

use std::sync::Arc;

use crate::bvh::BvhNode;
use crate::camera::Camera;
use crate::error::SceneResult;
use crate::hittable::{Hittable, HittableList};

/// Everything a render reads: the accelerated world, the lights to sample
/// directly, and the camera. Immutable once built and shared across workers.
pub struct Scene {
    pub world: BvhNode,
    pub lights: HittableList,
    pub camera: Camera,
}

impl Scene {
    /// Build a scene, sampling every emissive object as a light.
    pub fn new(objects: Vec<Arc<dyn Hittable>>, camera: Camera) -> SceneResult<Self> {
        let lights: HittableList = objects
            .iter()
            .filter(|o| o.is_emitter())
            .cloned()
            .collect::<Vec<_>>()
            .into();
        Self::with_lights(objects, lights, camera)
    }

    /// Build a scene with an explicit light set.
    ///
    /// Objects in `lights` should also be in `objects` to be visible.
    pub fn with_lights(
        objects: Vec<Arc<dyn Hittable>>,
        lights: HittableList,
        camera: Camera,
    ) -> SceneResult<Self> {
        let (time0, time1) = camera.shutter();
        log::debug!(
            "Scene with {} objects and {} lights",
            objects.len(),
            lights.len()
        );
        let world = BvhNode::new(objects, time0, time1)?;
        Ok(Self {
            world,
            lights,
            camera,
        })
    }
}

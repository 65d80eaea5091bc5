//! Ray-sphere intersection and shadow queries
//!
//! Rays are defined by an origin and a second point they pass through, so the
//! direction is not unit length and `t = 1` lands on the second point.

use crate::scene::{Light, Scene, Sphere};
use crate::vector::Vec3;

/// Closest intersection found by [`ray_sphere_intersection`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Index of the sphere in the scene
    pub sphere: usize,
    /// Ray parameter; may be negative
    pub t: f32,
    pub point: Vec3,
}

/// Smaller root of the ray/sphere quadratic, or `None` if the ray misses.
///
/// The root is returned whatever its sign.
pub fn sphere_root(origin: &Vec3, direction: &Vec3, sphere: &Sphere) -> Option<f32> {
    let oc = origin - sphere.center;
    let a = direction.magnitude_squared();
    let b = 2.0 * direction.dot(&oc);
    let c = oc.magnitude_squared() - sphere.radius * sphere.radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    Some((-b - discriminant.sqrt()) / (2.0 * a))
}

/// Cast a ray from `origin` through `through` against every sphere except
/// `exclude` and return the hit with the numerically smallest `t`.
///
/// Hits behind `origin` (negative `t`) are candidates too; callers that care
/// about them filter afterwards.
pub fn ray_sphere_intersection(
    scene: &Scene,
    origin: &Vec3,
    through: &Vec3,
    exclude: Option<usize>,
) -> Option<Hit> {
    let direction = through - origin;
    let mut closest: Option<Hit> = None;

    for (index, sphere) in scene.spheres.iter().enumerate() {
        if Some(index) == exclude {
            continue;
        }

        let Some(t) = sphere_root(origin, &direction, sphere) else {
            continue;
        };

        if closest.map_or(true, |hit| t < hit.t) {
            closest = Some(Hit {
                sphere: index,
                t,
                point: origin + direction * t,
            });
        }
    }

    closest
}

/// Whether `point`, lying on sphere `self_index`, is occluded from `light`
pub fn sphere_point_in_shadow(scene: &Scene, point: &Vec3, light: &Light, self_index: usize) -> bool {
    let light_distance = (light.position - point).magnitude();

    match ray_sphere_intersection(scene, point, &light.position, Some(self_index)) {
        Some(hit) => (light.position - hit.point).magnitude() < light_distance,
        None => false,
    }
}

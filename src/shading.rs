//! Per-pixel shading
//!
//! Camera rays use a simplified projection: the image-plane offset of a
//! pixel is added to trigonometric pitch/yaw offsets instead of being rotated
//! by a camera matrix. Output depends on this exact construction.

use crate::colour::Colour;
use crate::intersect::{ray_sphere_intersection, sphere_point_in_shadow, Hit};
use crate::scene::{Camera, Scene};
use crate::tiles::TileView;
use crate::vector::{Vec3, VecExt};
use crate::SHADOW_FACTOR;

/// Everything a worker needs to shade pixels of one frame.
///
/// The camera is copied in so every tile of a frame sees the same pose.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub scene: &'a Scene,
    pub camera: Camera,
    pub width: usize,
    pub height: usize,
}

/// Result of shading one pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shade {
    Background(Colour),
    Surface(Colour),
}

impl Shade {
    pub fn colour(&self) -> Colour {
        match self {
            Shade::Background(c) | Shade::Surface(c) => *c,
        }
    }
}

/// Counts gathered while shading a single tile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileCounters {
    pub pixels: u64,
    pub hits: u64,
}

impl<'a> RenderContext<'a> {
    pub fn new(scene: &'a Scene, camera: Camera, width: usize, height: usize) -> Self {
        Self { scene, camera, width, height }
    }

    /// Second point of the camera ray for pixel (x, y)
    pub fn target_point(&self, x: usize, y: usize) -> Vec3 {
        let cam = &self.camera;
        let (pitch, yaw) = (cam.pitch(), cam.yaw());
        let f = cam.focal_length;
        let w = self.width as f32;
        let h = self.height as f32;
        let aspect = w / h;

        let offset_x = (x as f32 - (self.width / 2) as f32) / w;
        let offset_y = (y as f32 - (self.height / 2) as f32) / h / aspect;

        Vec3::new(
            offset_x + cam.position.x + f * yaw.sin() * pitch.cos(),
            -offset_y + cam.position.y + f * pitch.sin(),
            cam.position.z + f * yaw.cos() * pitch.cos(),
        )
    }

    pub fn background(&self, y: usize) -> Colour {
        self.scene.background.at_row(y, self.height)
    }

    /// Shade a single pixel
    pub fn render_pixel(&self, x: usize, y: usize) -> Shade {
        let origin = self.camera.position;
        let target = self.target_point(x, y);

        match ray_sphere_intersection(self.scene, &origin, &target, None) {
            // hits behind the camera plane count as misses
            Some(hit) if hit.point.z >= origin.z => Shade::Surface(self.shade_hit(&hit)),
            _ => Shade::Background(self.background(y)),
        }
    }

    fn shade_hit(&self, hit: &Hit) -> Colour {
        let scene = self.scene;
        let sphere = &scene.spheres[hit.sphere];
        let material = &sphere.material;
        let normal = sphere.normal_at(&hit.point);
        let view_dir = (self.camera.position - hit.point).normalized_or_zero();

        let mut colour = Colour::BLACK;
        for light in &scene.lights {
            let to_light = light.position - hit.point;
            let light_dir = to_light.normalized_or_zero();
            let distance = to_light.magnitude();
            // cos(angle) / d^2, the light factor before intensity
            let falloff = normal.angle_between(&light_dir).cos() / (distance * distance);
            let factor = falloff * light.intensity;

            if sphere_point_in_shadow(scene, &hit.point, light, hit.sphere) {
                colour += material.colour * material.diffuse * falloff * SHADOW_FACTOR;
            } else {
                let halfway = (light_dir + view_dir).normalized_or_zero();
                let highlight = normal.dot(&halfway).max(0.0).powf(material.shininess);
                colour += light.colour.modulate(&material.colour) * material.diffuse * factor;
                colour += light.colour * material.specular * highlight;
            }
        }

        colour += material.colour * material.ambient;

        let mut colour = colour.gamma_corrected(scene.gamma);
        colour.clamp();
        colour
    }

    /// Shade every pixel of a tile into its view
    pub fn shade_tile(&self, view: &mut TileView<'_>) -> TileCounters {
        let tile = *view.tile();
        let mut counters = TileCounters::default();

        for j in 0..tile.height {
            for i in 0..tile.width {
                let shade = self.render_pixel(tile.x + i, tile.y + j);
                if let Shade::Surface(_) = shade {
                    counters.hits += 1;
                }
                view.put(i, j, shade.colour().to_rgba8());
            }
        }

        counters.pixels = tile.pixel_count() as u64;
        counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Background, Light, Material, Sphere};
    use crate::tiles::{PixelBuffer, TileGrid};

    const SIZE: usize = 64;

    fn base_colour() -> Colour {
        Colour::new(200.0, 100.0, 50.0)
    }

    fn single_sphere_scene() -> Scene {
        let material = Material::new(base_colour(), 0.2, 0.8, 10.0, 0.5);
        Scene::new(
            vec![Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0, material)],
            vec![Light::new(Vec3::new(0.0, 5.0, 4.0), Colour::WHITE, 50.0)],
            Background::default(),
            2.2,
        )
    }

    fn context(scene: &Scene) -> RenderContext<'_> {
        RenderContext::new(scene, Camera::default(), SIZE, SIZE)
    }

    #[test]
    fn test_center_pixel_targets_forward() {
        let scene = single_sphere_scene();
        let ctx = context(&scene);
        let target = ctx.target_point(SIZE / 2, SIZE / 2);
        assert!((target - Vec3::new(0.0, 0.0, 0.5)).magnitude() < 1e-6);
    }

    #[test]
    fn test_rows_increase_downward() {
        let scene = single_sphere_scene();
        let ctx = context(&scene);
        assert!(ctx.target_point(0, 0).y > ctx.target_point(0, SIZE - 1).y);
        assert!(ctx.target_point(0, 0).x < ctx.target_point(SIZE - 1, 0).x);
    }

    #[test]
    fn test_yaw_swings_target_sideways() {
        let scene = single_sphere_scene();
        let mut camera = Camera::default();
        camera.rotate(0.0, std::f32::consts::FRAC_PI_2);
        let ctx = RenderContext::new(&scene, camera, SIZE, SIZE);
        let target = ctx.target_point(SIZE / 2, SIZE / 2);
        assert!((target.x - camera.focal_length).abs() < 1e-5);
        assert!(target.z.abs() < 1e-5);
    }

    #[test]
    fn test_front_center_is_lit_from_base_colour() {
        let scene = single_sphere_scene();
        let ctx = context(&scene);

        let shade = ctx.render_pixel(SIZE / 2, SIZE / 2);
        let Shade::Surface(colour) = shade else {
            panic!("expected the sphere, got {:?}", shade);
        };

        // Light is perpendicular to the normal at (0, 0, 4): only the
        // ambient and specular terms contribute
        let highlight = std::f32::consts::FRAC_1_SQRT_2.powf(10.0);
        let linear = base_colour() * 0.2 + Colour::WHITE * 0.5 * highlight;
        let mut expected = linear.gamma_corrected(2.2);
        expected.clamp();

        assert!((colour.r - expected.r).abs() < 0.05);
        assert!((colour.g - expected.g).abs() < 0.05);
        assert!((colour.b - expected.b).abs() < 0.05);
        assert!(colour.r > colour.g && colour.g > colour.b);
    }

    #[test]
    fn test_miss_is_exact_background() {
        let scene = single_sphere_scene();
        let ctx = context(&scene);
        for &(x, y) in &[(0, 0), (SIZE - 1, 5), (3, SIZE - 1)] {
            assert_eq!(ctx.render_pixel(x, y), Shade::Background(scene.background.at_row(y, SIZE)));
        }
    }

    #[test]
    fn test_sphere_behind_camera_renders_background() {
        let mut scene = single_sphere_scene();
        scene.spheres[0].center = Vec3::new(0.0, 0.0, -5.0);
        let ctx = context(&scene);
        let y = SIZE / 2;
        assert_eq!(ctx.render_pixel(SIZE / 2, y), Shade::Background(ctx.background(y)));
    }

    #[test]
    fn test_occluded_light_darkens_surface() {
        let mut scene = single_sphere_scene();
        scene.lights[0] = Light::new(Vec3::new(3.0, 0.0, -4.0), Colour::WHITE, 50.0);
        let lit = context(&scene).render_pixel(SIZE / 2, SIZE / 2);

        // halfway between (0, 0, 4) and the light, off the camera's axis
        scene.spheres.push(Sphere::new(
            Vec3::new(1.5, 0.0, 0.0),
            0.3,
            Material::new(Colour::WHITE, 0.0, 0.0, 1.0, 0.0),
        ));
        let shadowed = context(&scene).render_pixel(SIZE / 2, SIZE / 2);

        assert!(matches!(lit, Shade::Surface(_)));
        assert!(matches!(shadowed, Shade::Surface(_)));
        assert!(shadowed.colour().r < lit.colour().r);
    }

    /// One sphere seen head-on at (0, 0, 4) with an orange light at 45
    /// degrees above the normal, sqrt(8) away
    fn oblique_light_scene() -> Scene {
        let material = Material::new(base_colour(), 0.2, 0.8, 10.0, 0.1);
        Scene::new(
            vec![Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0, material)],
            vec![Light::new(Vec3::new(0.0, 2.0, 2.0), Colour::new(255.0, 128.0, 0.0), 8.0)],
            Background::default(),
            2.2,
        )
    }

    fn assert_close(actual: Colour, linear: Colour) {
        let mut expected = linear.gamma_corrected(2.2);
        expected.clamp();
        assert!((actual.r - expected.r).abs() < 0.1, "r: {} vs {}", actual.r, expected.r);
        assert!((actual.g - expected.g).abs() < 0.1, "g: {} vs {}", actual.g, expected.g);
        assert!((actual.b - expected.b).abs() < 0.1, "b: {} vs {}", actual.b, expected.b);
    }

    #[test]
    fn test_unshadowed_light_contribution() {
        let scene = oblique_light_scene();
        let shade = context(&scene).render_pixel(SIZE / 2, SIZE / 2);
        let Shade::Surface(colour) = shade else {
            panic!("expected the sphere, got {:?}", shade);
        };

        let (cos, intensity, distance_sq) = (std::f32::consts::FRAC_1_SQRT_2, 8.0, 8.0);
        let factor = cos * intensity / distance_sq;
        // halfway vector sits 22.5 degrees off the normal
        let highlight = 22.5f32.to_radians().cos().powf(10.0);

        let light = Colour::new(255.0, 128.0, 0.0);
        let diffuse = Colour::new(200.0, 100.0 * 128.0 / 255.0, 0.0) * 0.8 * factor;
        let specular = light * 0.1 * highlight;
        let ambient = base_colour() * 0.2;

        assert_close(colour, diffuse + specular + ambient);
    }

    #[test]
    fn test_shadowed_light_contribution() {
        let mut scene = oblique_light_scene();
        // between (0, 0, 4) and the light, clear of the camera ray
        scene.spheres.push(Sphere::new(
            Vec3::new(0.0, 1.0, 3.0),
            0.3,
            Material::new(Colour::WHITE, 0.0, 0.0, 1.0, 0.0),
        ));
        let shade = context(&scene).render_pixel(SIZE / 2, SIZE / 2);
        let Shade::Surface(colour) = shade else {
            panic!("expected the sphere, got {:?}", shade);
        };

        // base colour only: no light tint, no specular
        let falloff = std::f32::consts::FRAC_1_SQRT_2 / 8.0;
        let shadowed = base_colour() * 0.8 * falloff * 0.5;
        let ambient = base_colour() * 0.2;

        assert_close(colour, shadowed + ambient);
    }

    #[test]
    fn test_shade_tile_writes_every_pixel() {
        let scene = single_sphere_scene();
        let ctx = context(&scene);
        let grid = TileGrid::new(SIZE, SIZE, 1);
        let mut buffer = PixelBuffer::new(SIZE, SIZE);

        let mut total = TileCounters::default();
        for mut view in buffer.tile_views(&grid) {
            let counters = ctx.shade_tile(&mut view);
            total.pixels += counters.pixels;
            total.hits += counters.hits;
        }

        assert_eq!(total.pixels, (SIZE * SIZE) as u64);
        assert!(total.hits > 0 && total.hits < total.pixels);
        assert_eq!(buffer.pixel(0, 0), scene.background.at_row(0, SIZE).to_rgba8());
        for px in buffer.as_bytes().chunks_exact(4) {
            assert_eq!(px[3], 255);
        }
    }
}

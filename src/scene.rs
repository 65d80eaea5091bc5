//! Scene definitions for the sphere tracer

use crate::colour::Colour;
use crate::vector::Vec3;
use crate::DEFAULT_GAMMA;

/// Surface response to light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub colour: Colour,
    pub ambient: f32,
    pub diffuse: f32,
    /// Specular exponent
    pub shininess: f32,
    pub specular: f32,
}

impl Material {
    pub fn new(colour: Colour, ambient: f32, diffuse: f32, shininess: f32, specular: f32) -> Self {
        Self { colour, ambient, diffuse, shininess, specular }
    }
}

/// Sphere primitive. The radius must be positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub material: Material,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32, material: Material) -> Self {
        Self { center, radius, material }
    }

    /// Outward unit normal at a point on the surface
    pub fn normal_at(&self, point: &Vec3) -> Vec3 {
        (point - self.center) / self.radius
    }
}

/// Point light with inverse-square falloff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vec3,
    pub colour: Colour,
    pub intensity: f32,
}

impl Light {
    pub fn new(position: Vec3, colour: Colour, intensity: f32) -> Self {
        Self { position, colour, intensity }
    }
}

/// Vertical background gradient, `top` at row 0 and `bottom` at the last row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Background {
    pub top: Colour,
    pub bottom: Colour,
}

impl Background {
    pub fn new(top: Colour, bottom: Colour) -> Self {
        Self { top, bottom }
    }

    /// Colour for pixel row `y` of a frame `height` rows tall
    pub fn at_row(&self, y: usize, height: usize) -> Colour {
        self.top.lerp(&self.bottom, y as f32 / height as f32)
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::new(Colour::new(173.0, 200.0, 255.0), Colour::new(107.0, 171.0, 255.0))
    }
}

/// Immutable description of everything that is rendered.
///
/// Spheres are referred to by their index in `spheres`, which stays stable
/// for the lifetime of the scene.
#[derive(Debug, Clone)]
pub struct Scene {
    pub spheres: Vec<Sphere>,
    pub lights: Vec<Light>,
    pub background: Background,
    pub gamma: f32,
}

impl Scene {
    pub fn new(spheres: Vec<Sphere>, lights: Vec<Light>, background: Background, gamma: f32) -> Self {
        Self { spheres, lights, background, gamma }
    }

    /// Four coloured spheres lit by red, green, blue and white lights
    pub fn four_spheres() -> Self {
        let spheres = vec![
            // orange
            Sphere::new(
                Vec3::new(-0.8, 0.8, 9.0),
                1.0,
                Material::new(Colour::new(255.0, 128.0, 64.0), 0.3, 1.0, 1500.0, 0.08),
            ),
            // green
            Sphere::new(
                Vec3::new(-0.8, -0.2, 7.0),
                1.0,
                Material::new(Colour::new(64.0, 255.0, 128.0), 0.4, 0.5, 200.0, 0.08),
            ),
            // purple
            Sphere::new(
                Vec3::new(1.2, -0.5, 7.7),
                1.0,
                Material::new(Colour::new(128.0, 64.0, 255.0), 0.6, 0.2, 30.0, 0.08),
            ),
            // white
            Sphere::new(
                Vec3::new(1.2, 1.5, 10.0),
                1.0,
                Material::new(Colour::new(255.0, 255.0, 255.0), 0.7, 0.4, 20.0, 0.08),
            ),
        ];

        let lights = vec![
            Light::new(Vec3::new(-5.0, 5.0, 5.0), Colour::new(255.0, 128.0, 128.0), 50.0),
            Light::new(Vec3::new(0.0, 10.0, 4.0), Colour::new(128.0, 255.0, 128.0), 80.0),
            Light::new(Vec3::new(3.0, 2.0, 4.0), Colour::new(128.0, 128.0, 255.0), 30.0),
            Light::new(Vec3::new(-3.0, 3.0, 9.0), Colour::new(255.0, 255.0, 255.0), 8.0),
        ];

        Self::new(spheres, lights, Background::default(), DEFAULT_GAMMA)
    }
}

/// Camera pose. Rotation stores pitch in `x` and yaw in `y`; `z` is unused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Vec3,
    pub focal_length: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Vec3::zeros(), 90.0)
    }
}

impl Camera {
    /// Build a camera from a horizontal field of view in degrees.
    ///
    /// Image-plane offsets span [-0.5, 0.5], so the focal length placing
    /// that span at `fov` is `0.5 / tan(fov / 2)`.
    pub fn new(position: Vec3, rotation: Vec3, fov_degrees: f32) -> Self {
        let focal_length = 0.5 / (fov_degrees.to_radians() / 2.0).tan();
        Self { position, rotation, focal_length }
    }

    pub fn pitch(&self) -> f32 {
        self.rotation.x
    }

    pub fn yaw(&self) -> f32 {
        self.rotation.y
    }

    /// Move the camera in world space
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Add to pitch and yaw, in radians
    pub fn rotate(&mut self, pitch: f32, yaw: f32) {
        self.rotation.x += pitch;
        self.rotation.y += yaw;
    }
}

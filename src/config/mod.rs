mod loader;

use crate::colour::Colour;
use crate::scene::{Background, Camera, Light, Material, Scene, Sphere};
use crate::vector::Vec3;
use crate::DEFAULT_GAMMA;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use loader::load_config;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub background: BackgroundConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default = "default_spheres")]
    pub spheres: Vec<SphereConfig>,
    #[serde(default = "default_lights")]
    pub lights: Vec<LightConfig>,
}

/// Frame size in pixels
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_size")]
    pub width: usize,
    #[serde(default = "default_window_size")]
    pub height: usize,
}

fn default_window_size() -> usize {
    512
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_size(),
            height: default_window_size(),
        }
    }
}

/// Rendering options
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderConfig {
    #[serde(default = "default_gamma")]
    pub gamma: f32,
    /// Worker threads; hardware concurrency when unset
    #[serde(default)]
    pub workers: Option<usize>,
}

fn default_gamma() -> f32 {
    DEFAULT_GAMMA
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            gamma: default_gamma(),
            workers: None,
        }
    }
}

/// Background gradient colours (0-255 per channel)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackgroundConfig {
    pub top: [f32; 3],
    pub bottom: [f32; 3],
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            top: [173.0, 200.0, 255.0],
            bottom: [107.0, 171.0, 255.0],
        }
    }
}

/// Initial camera pose
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CameraConfig {
    #[serde(default)]
    pub position: [f32; 3],
    /// Pitch, yaw, roll in radians; roll is ignored
    #[serde(default)]
    pub rotation: [f32; 3],
    /// Horizontal field of view in degrees
    #[serde(default = "default_fov")]
    pub fov: f32,
}

fn default_fov() -> f32 {
    90.0
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            fov: default_fov(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MaterialConfig {
    pub colour: [f32; 3],
    pub ambient: f32,
    pub diffuse: f32,
    pub shininess: f32,
    pub specular: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SphereConfig {
    pub center: [f32; 3],
    pub radius: f32,
    pub material: MaterialConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LightConfig {
    pub position: [f32; 3],
    pub colour: [f32; 3],
    pub intensity: f32,
}

fn default_spheres() -> Vec<SphereConfig> {
    Scene::four_spheres()
        .spheres
        .iter()
        .map(|s| SphereConfig {
            center: s.center.into(),
            radius: s.radius,
            material: MaterialConfig {
                colour: [s.material.colour.r, s.material.colour.g, s.material.colour.b],
                ambient: s.material.ambient,
                diffuse: s.material.diffuse,
                shininess: s.material.shininess,
                specular: s.material.specular,
            },
        })
        .collect()
}

fn default_lights() -> Vec<LightConfig> {
    Scene::four_spheres()
        .lights
        .iter()
        .map(|l| LightConfig {
            position: l.position.into(),
            colour: [l.colour.r, l.colour.g, l.colour.b],
            intensity: l.intensity,
        })
        .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            render: RenderConfig::default(),
            background: BackgroundConfig::default(),
            camera: CameraConfig::default(),
            spheres: default_spheres(),
            lights: default_lights(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        load_config(path)
    }

    /// Load configuration, falling back to the built-in scene.
    ///
    /// An explicit path must exist. Without one the default locations are
    /// tried in order before the built-in scene is used.
    pub fn load_or_default(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) => Self::from_file(path),
            None => {
                let default_paths = ["tracer.yaml", "tracer.yml", "./config/tracer.yaml"];
                for p in default_paths {
                    let path = Path::new(p);
                    if path.exists() {
                        return Self::from_file(path);
                    }
                }
                Ok(Self::default())
            }
        }
    }

    /// Reject values the renderer assumes never occur
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Validation(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if !(self.render.gamma > 0.0) {
            return Err(ConfigError::Validation(format!(
                "gamma must be positive, got {}",
                self.render.gamma
            )));
        }
        if self.render.workers == Some(0) {
            return Err(ConfigError::Validation("workers must be at least 1".to_string()));
        }
        if !(self.camera.fov > 0.0 && self.camera.fov < 180.0) {
            return Err(ConfigError::Validation(format!(
                "camera fov must be between 0 and 180 degrees, got {}",
                self.camera.fov
            )));
        }
        if self.spheres.is_empty() {
            return Err(ConfigError::Validation("scene has no spheres".to_string()));
        }
        for (i, sphere) in self.spheres.iter().enumerate() {
            if !(sphere.radius > 0.0) {
                return Err(ConfigError::Validation(format!(
                    "sphere {} has non-positive radius {}",
                    i, sphere.radius
                )));
            }
        }
        for (i, light) in self.lights.iter().enumerate() {
            if light.intensity < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "light {} has negative intensity {}",
                    i, light.intensity
                )));
            }
        }
        Ok(())
    }

    /// Build the immutable scene described by this configuration
    pub fn scene(&self) -> Scene {
        let spheres = self
            .spheres
            .iter()
            .map(|s| {
                let m = &s.material;
                Sphere::new(
                    Vec3::from(s.center),
                    s.radius,
                    Material::new(Colour::from_array(m.colour), m.ambient, m.diffuse, m.shininess, m.specular),
                )
            })
            .collect();

        let lights = self
            .lights
            .iter()
            .map(|l| Light::new(Vec3::from(l.position), Colour::from_array(l.colour), l.intensity))
            .collect();

        let background = Background::new(
            Colour::from_array(self.background.top),
            Colour::from_array(self.background.bottom),
        );

        Scene::new(spheres, lights, background, self.render.gamma)
    }

    /// Initial camera pose
    pub fn camera(&self) -> Camera {
        Camera::new(
            Vec3::from(self.camera.position),
            Vec3::from(self.camera.rotation),
            self.camera.fov,
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

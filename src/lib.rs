//! Tiled CPU ray tracer
//!
//! This library renders a small scene of spheres lit by point lights into an
//! RGBA8 pixel buffer. Each frame is split into rectangular tiles which a
//! persistent worker pool shades in parallel before the frame is presented.

pub mod colour;
pub mod config;
pub mod intersect;
pub mod scene;
pub mod scheduler;
pub mod shading;
pub mod terminal;
pub mod tiles;
pub mod vector;

pub use colour::Colour;
pub use config::AppConfig;
pub use scene::{Camera, Scene};
pub use scheduler::{FrameStats, TileScheduler};
pub use tiles::{PixelBuffer, TileGrid};
pub use vector::Vec3;

/// Bytes per pixel in the RGBA8 output buffer
pub const BYTES_PER_PIXEL: usize = 4;

/// Default display gamma
pub const DEFAULT_GAMMA: f32 = 2.2;

/// Fraction of the diffuse term kept for a point shadowed from a light
pub const SHADOW_FACTOR: f32 = 0.5;

//! RGB colour with channels in the 0-255 range

use std::ops::{Add, AddAssign, Mul};

/// Colour with floating point channels; alpha is always opaque on output
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Colour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Colour {
    pub const BLACK: Colour = Colour::new(0.0, 0.0, 0.0);
    pub const WHITE: Colour = Colour::new(255.0, 255.0, 255.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_array(rgb: [f32; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }

    /// Linear blend towards `other`; `t` is not limited to [0, 1]
    pub fn lerp(&self, other: &Colour, t: f32) -> Colour {
        Colour::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    /// Truncate every channel into [0, 255]. NaN channels become 0.
    pub fn clamp(&mut self) {
        self.r = clamp_channel(self.r);
        self.g = clamp_channel(self.g);
        self.b = clamp_channel(self.b);
    }

    /// Channel-wise product, normalised so white leaves `other` unchanged
    pub fn modulate(&self, other: &Colour) -> Colour {
        Colour::new(
            self.r * other.r / 255.0,
            self.g * other.g / 255.0,
            self.b * other.b / 255.0,
        )
    }

    /// Apply `c' = (c / 255)^(1 / gamma) * 255` to every channel
    pub fn gamma_corrected(&self, gamma: f32) -> Colour {
        let inv = 1.0 / gamma;
        Colour::new(
            (self.r / 255.0).powf(inv) * 255.0,
            (self.g / 255.0).powf(inv) * 255.0,
            (self.b / 255.0).powf(inv) * 255.0,
        )
    }

    /// Pack into RGBA8 bytes, clamping first
    pub fn to_rgba8(&self) -> [u8; 4] {
        let mut c = *self;
        c.clamp();
        [c.r as u8, c.g as u8, c.b as u8, 255]
    }
}

fn clamp_channel(c: f32) -> f32 {
    // f32::max returns the non-NaN operand
    c.max(0.0).min(255.0)
}

impl Add for Colour {
    type Output = Colour;

    fn add(self, rhs: Colour) -> Colour {
        Colour::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl AddAssign for Colour {
    fn add_assign(&mut self, rhs: Colour) {
        self.r += rhs.r;
        self.g += rhs.g;
        self.b += rhs.b;
    }
}

impl Mul<f32> for Colour {
    type Output = Colour;

    fn mul(self, rhs: f32) -> Colour {
        Colour::new(self.r * rhs, self.g * rhs, self.b * rhs)
    }
}

use std::ops;

/// Struct, representing raw rgba8 pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Colour {
    pub const BLACK: Colour =       Colour { r: 0,   g: 0,   b: 0,   a: 255 };
    pub const WHITE: Colour =       Colour { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Colour =         Colour { r: 255, g: 0,   b: 0,   a: 255 };
    pub const GREEN: Colour =       Colour { r: 0,   g: 255, b: 0,   a: 255 };
    pub const BLUE: Colour =        Colour { r: 0,   g: 0,   b: 255, a: 255 };
    pub const TRANSPARENT: Colour = Colour { r: 0,   g: 0,   b: 0,   a: 0   };

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Colour {
        return Colour { r, g, b, a };
    }

    /// Packs the colour as 0xAARRGGBB.
    pub fn to_packed(self) -> u32 {
        return ((self.a as u32) << 24)
            | ((self.r as u32) << 16)
            | ((self.g as u32) << 8)
            | (self.b as u32);
    }

    /// Inverse of `to_packed`.
    pub fn from_packed(packed: u32) -> Colour {
        return Colour {
            a: (packed >> 24) as u8,
            r: (packed >> 16) as u8,
            g: (packed >> 8) as u8,
            b: packed as u8,
        };
    }

    pub fn to_bytes(self) -> [u8; 4] {
        return [self.r, self.g, self.b, self.a];
    }

    /// Linear interpolation: t = 0 gives `from`, t = 1 gives `to`.
    pub fn lerp(from: Colour, to: Colour, t: f32) -> Colour {
        fn channel(a: u8, b: u8, t: f32) -> u8 {
            return to_channel(a as f32 + (b as f32 - a as f32) * t);
        }
        return Colour {
            r: channel(from.r, to.r, t),
            g: channel(from.g, to.g, t),
            b: channel(from.b, to.b, t),
            a: channel(from.a, to.a, t),
        };
    }

    /// Weighted sum of three colours, used with barycentric weights.
    pub fn interpolate(
        c0: Colour,
        c1: Colour,
        c2: Colour,
        alpha: f32,
        beta: f32,
        gamma: f32,
    ) -> Colour {
        fn channel(a: u8, b: u8, c: u8, alpha: f32, beta: f32, gamma: f32) -> u8 {
            return to_channel(a as f32 * alpha + b as f32 * beta + c as f32 * gamma);
        }
        return Colour {
            r: channel(c0.r, c1.r, c2.r, alpha, beta, gamma),
            g: channel(c0.g, c1.g, c2.g, alpha, beta, gamma),
            b: channel(c0.b, c1.b, c2.b, alpha, beta, gamma),
            a: channel(c0.a, c1.a, c2.a, alpha, beta, gamma),
        };
    }

    /// Multiplies every channel by `s`, clamping into the u8 range.
    pub fn scale(self, s: f32) -> Colour {
        return Colour {
            r: to_channel(self.r as f32 * s),
            g: to_channel(self.g as f32 * s),
            b: to_channel(self.b as f32 * s),
            a: to_channel(self.a as f32 * s),
        };
    }
}

impl Default for Colour {
    fn default() -> Self {
        return Colour::WHITE;
    }
}

/// Rounds and clamps a float channel value. NaN ends up as 0.
fn to_channel(value: f32) -> u8 {
    return value.round().clamp(0.0, 255.0) as u8;
}

/// Channel-wise addition that wraps on overflow.
impl ops::Add<Colour> for Colour {
    type Output = Colour;

    fn add(self, rhs: Colour) -> Colour {
        return Colour {
            r: self.r.wrapping_add(rhs.r),
            g: self.g.wrapping_add(rhs.g),
            b: self.b.wrapping_add(rhs.b),
            a: self.a.wrapping_add(rhs.a),
        };
    }
}

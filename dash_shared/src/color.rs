//! Colors.
//!
//! [`ColorF`] carries unbounded float channels tagged with a color space, so
//! HDR and negative values survive arithmetic. [`Color8`] is the 8-bit sRGB
//! form the entity host consumes.

use serde::{Deserialize, Serialize};

use crate::math::{clamp, lerp, within_epsilon};

/// Transfer function a [`ColorF`]'s RGB channels are encoded with.
/// Alpha is always linear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    #[default]
    Srgb,
    Linear,
}

/// Linear scalar to sRGB gamma.
pub fn scalar_linear_to_srgb(x: f32) -> f32 {
    if x <= 0.003_130_8 {
        12.92 * x
    } else {
        1.055 * x.powf(1.0 / 2.4) - 0.055
    }
}

/// sRGB gamma scalar to linear.
pub fn scalar_srgb_to_linear(x: f32) -> f32 {
    if x <= 0.040_45 {
        x / 12.92
    } else {
        ((x + 0.055) / 1.055).powf(2.4)
    }
}

/// RGBA color with float channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorF {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
    #[serde(default)]
    pub space: ColorSpace,
}

impl ColorF {
    pub const TRANSPARENT: Self = Self::srgb(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Self = Self::srgb(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::srgb(1.0, 1.0, 1.0, 1.0);
    pub const RED: Self = Self::srgb(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Self = Self::srgb(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Self = Self::srgb(0.0, 0.0, 1.0, 1.0);

    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32, space: ColorSpace) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
            space,
        }
    }

    pub const fn srgb(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self::new(red, green, blue, alpha, ColorSpace::Srgb)
    }

    pub const fn linear(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self::new(red, green, blue, alpha, ColorSpace::Linear)
    }

    /// Copy with alpha forced to 1.
    pub fn rgb(self) -> Self {
        Self { alpha: 1.0, ..self }
    }

    fn map(self, f: impl Fn(f32) -> f32) -> Self {
        Self::new(f(self.red), f(self.green), f(self.blue), self.alpha, self.space)
    }

    fn zip(self, rhs: Self, f: impl Fn(f32, f32) -> f32) -> Self {
        Self::new(
            f(self.red, rhs.red),
            f(self.green, rhs.green),
            f(self.blue, rhs.blue),
            f(self.alpha, rhs.alpha),
            self.space,
        )
    }

    /// Channel-wise sum, keeping `self`'s color space.
    pub fn add(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| a + b)
    }

    pub fn subtract(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| a - b)
    }

    pub fn multiply(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| a * b)
    }

    /// Scales all four channels, alpha included.
    pub fn scale(self, s: f32) -> Self {
        Self::new(
            self.red * s,
            self.green * s,
            self.blue * s,
            self.alpha * s,
            self.space,
        )
    }

    pub fn divide(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| a / b)
    }

    /// Divides all four channels, alpha included.
    pub fn divide_scalar(self, s: f32) -> Self {
        Self::new(
            self.red / s,
            self.green / s,
            self.blue / s,
            self.alpha / s,
            self.space,
        )
    }

    pub fn lerp(self, to: Self, t: f32) -> Self {
        self.zip(to, |a, b| lerp(a, b, t))
    }

    /// Linear-space copy. Already-linear colors come back unchanged.
    pub fn to_linear(self) -> Self {
        match self.space {
            ColorSpace::Linear => self,
            ColorSpace::Srgb => Self {
                space: ColorSpace::Linear,
                ..self.map(scalar_srgb_to_linear)
            },
        }
    }

    /// sRGB-space copy. Already-sRGB colors come back unchanged.
    pub fn to_srgb(self) -> Self {
        match self.space {
            ColorSpace::Srgb => self,
            ColorSpace::Linear => Self {
                space: ColorSpace::Srgb,
                ..self.map(scalar_linear_to_srgb)
            },
        }
    }

    /// Clamps to $[0,1]$ and quantizes to 8 bits, converting to sRGB first.
    pub fn to_color8(self) -> Color8 {
        let c = self.to_srgb();
        let q = |v: f32| clamp(v * 255.0, 0.0, 255.0).round() as u8;
        Color8::new(q(c.red), q(c.green), q(c.blue), q(c.alpha))
    }

    /// CSS `#rrggbb` / `#rrggbbaa`. HDR channels are clamped.
    pub fn to_hex(self) -> String {
        self.to_color8().to_hex()
    }

    /// `hue` in degrees, `saturation` and `value` in $[0,1]$.
    pub fn hsv(hue: f32, saturation: f32, value: f32, alpha: f32) -> Self {
        let c = value * saturation;
        let (r, g, b) = hue_sector(hue, c);
        let m = value - c;
        Self::srgb(r + m, g + m, b + m, alpha)
    }

    /// `hue` in degrees, `saturation` and `lightness` in $[0,1]$.
    pub fn hsl(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Self {
        let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
        let (r, g, b) = hue_sector(hue, c);
        let m = lightness - c / 2.0;
        Self::srgb(r + m, g + m, b + m, alpha)
    }

    /// Oklab to linear sRGB.
    ///
    /// See <https://bottosson.github.io/posts/oklab/>.
    pub fn oklab(l: f32, a: f32, b: f32, alpha: f32) -> Self {
        let l_ = l + 0.396_337_777_4 * a + 0.215_803_757_3 * b;
        let m_ = l - 0.105_561_345_8 * a - 0.063_854_172_8 * b;
        let s_ = l - 0.089_484_177_5 * a - 1.291_485_548_0 * b;

        let l3 = l_ * l_ * l_;
        let m3 = m_ * m_ * m_;
        let s3 = s_ * s_ * s_;

        Self::linear(
            4.076_741_662_1 * l3 - 3.307_711_591_3 * m3 + 0.230_969_929_2 * s3,
            -1.268_438_004_6 * l3 + 2.609_757_401_1 * m3 - 0.341_319_396_5 * s3,
            -0.004_196_086_3 * l3 - 0.703_418_614_7 * m3 + 1.707_614_701_0 * s3,
            alpha,
        )
    }

    /// Oklch with hue `h` in radians.
    pub fn oklch(l: f32, c: f32, h: f32, alpha: f32) -> Self {
        Self::oklab(l, c * h.cos(), c * h.sin(), alpha)
    }

    /// Same color space and every channel within `epsilon`.
    pub fn within_epsilon(self, rhs: Self, epsilon: f32) -> bool {
        self.space == rhs.space
            && within_epsilon(self.red, rhs.red, epsilon)
            && within_epsilon(self.green, rhs.green, epsilon)
            && within_epsilon(self.blue, rhs.blue, epsilon)
            && within_epsilon(self.alpha, rhs.alpha, epsilon)
    }
}

/// Chroma placement shared by HSV and HSL.
fn hue_sector(hue: f32, c: f32) -> (f32, f32, f32) {
    let h = (hue / 60.0).rem_euclid(6.0);
    let x = c * (1.0 - ((h % 2.0) - 1.0).abs());

    match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    }
}

impl std::fmt::Display for ColorF {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let in_range = [self.red, self.green, self.blue, self.alpha]
            .iter()
            .all(|v| (0.0..=1.0).contains(v));

        match self.space {
            ColorSpace::Srgb if in_range => write!(f, "ColorF({}; sRGB)", self.to_hex()),
            ColorSpace::Srgb => write!(
                f,
                "ColorF({}, {}, {}, {}; sRGB)",
                self.red, self.green, self.blue, self.alpha
            ),
            ColorSpace::Linear => write!(
                f,
                "ColorF({}, {}, {}, {}; Linear)",
                self.red, self.green, self.blue, self.alpha
            ),
        }
    }
}

/// RGBA color with 8-bit sRGB channels (alpha linear).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color8 {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Default for Color8 {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color8 {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    pub const BLUE: Self = Self::rgb(0, 0, 255);

    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Opaque color.
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self::new(red, green, blue, 255)
    }

    pub fn opaque(self) -> Self {
        Self { alpha: 255, ..self }
    }

    pub fn to_color_f(self) -> ColorF {
        let f = |v: u8| f32::from(v) / 255.0;
        ColorF::srgb(f(self.red), f(self.green), f(self.blue), f(self.alpha))
    }

    /// CSS `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(self) -> String {
        if self.alpha == 255 {
            format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
        } else {
            format!(
                "#{:02x}{:02x}{:02x}{:02x}",
                self.red, self.green, self.blue, self.alpha
            )
        }
    }

    pub fn add(self, rhs: Self) -> Self {
        self.to_color_f().add(rhs.to_color_f()).to_color8()
    }

    pub fn subtract(self, rhs: Self) -> Self {
        self.to_color_f().subtract(rhs.to_color_f()).to_color8()
    }

    pub fn multiply(self, rhs: Self) -> Self {
        self.to_color_f().multiply(rhs.to_color_f()).to_color8()
    }

    pub fn scale(self, s: f32) -> Self {
        self.to_color_f().scale(s).to_color8()
    }

    pub fn divide(self, rhs: Self) -> Self {
        self.to_color_f().divide(rhs.to_color_f()).to_color8()
    }

    pub fn divide_scalar(self, s: f32) -> Self {
        self.to_color_f().divide_scalar(s).to_color8()
    }

    pub fn lerp(self, to: Self, t: f32) -> Self {
        self.to_color_f().lerp(to.to_color_f(), t).to_color8()
    }

    pub fn hsv(hue: f32, saturation: f32, value: f32, alpha: u8) -> Self {
        ColorF::hsv(hue, saturation, value, f32::from(alpha) / 255.0).to_color8()
    }

    pub fn hsl(hue: f32, saturation: f32, lightness: f32, alpha: u8) -> Self {
        ColorF::hsl(hue, saturation, lightness, f32::from(alpha) / 255.0).to_color8()
    }

    pub fn oklab(l: f32, a: f32, b: f32, alpha: u8) -> Self {
        ColorF::oklab(l, a, b, f32::from(alpha) / 255.0).to_color8()
    }

    pub fn oklch(l: f32, c: f32, h: f32, alpha: u8) -> Self {
        ColorF::oklch(l, c, h, f32::from(alpha) / 255.0).to_color8()
    }
}

impl std::fmt::Display for Color8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Color8({})", self.to_hex())
    }
}

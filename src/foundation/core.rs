use crate::foundation::error::{FlipreelError, FlipreelResult};

pub use kurbo::Affine;

/// Output surface dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Largest edge the CPU rasterizer accepts.
    pub const MAX_EDGE: u32 = u16::MAX as u32;

    /// Create a canvas, rejecting zero or oversized edges.
    pub fn new(width: u32, height: u32) -> FlipreelResult<Self> {
        if width == 0 || height == 0 {
            return Err(FlipreelError::validation(
                "canvas width/height must be > 0",
            ));
        }
        if width > Self::MAX_EDGE || height > Self::MAX_EDGE {
            return Err(FlipreelError::validation(format!(
                "canvas {width}x{height} exceeds {} px per edge",
                Self::MAX_EDGE
            )));
        }
        Ok(Self { width, height })
    }

    /// Byte length of a tightly packed RGBA8 buffer of this size.
    pub fn rgba_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

/// Straight-alpha RGBA8 color, serialized as a `#rrggbb` / `#rrggbbaa` hex string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BLACK: Self = Self::opaque(0, 0, 0);
    pub const WHITE: Self = Self::opaque(255, 255, 255);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn parse_hex(s: &str) -> FlipreelResult<Self> {
        let hex = s.trim().trim_start_matches('#');
        let nibble = |c: u8| -> FlipreelResult<u8> {
            match c {
                b'0'..=b'9' => Ok(c - b'0'),
                b'a'..=b'f' => Ok(c - b'a' + 10),
                b'A'..=b'F' => Ok(c - b'A' + 10),
                _ => Err(FlipreelError::validation(format!("invalid hex color '{s}'"))),
            }
        };
        let b = hex.as_bytes();
        let byte = |i: usize| -> FlipreelResult<u8> { Ok(nibble(b[i])? << 4 | nibble(b[i + 1])?) };
        match b.len() {
            3 => {
                let r = nibble(b[0])?;
                let g = nibble(b[1])?;
                let bl = nibble(b[2])?;
                Ok(Self::opaque(r * 17, g * 17, bl * 17))
            }
            6 => Ok(Self::opaque(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            }),
            _ => Err(FlipreelError::validation(format!("invalid hex color '{s}'"))),
        }
    }

    /// Scale alpha by `opacity` in `[0,1]`.
    pub fn with_opacity(self, opacity: f32) -> Self {
        let op = opacity.clamp(0.0, 1.0);
        Self {
            a: ((f32::from(self.a) * op).round() as i32).clamp(0, 255) as u8,
            ..self
        }
    }

    pub fn to_premul(self) -> [u8; 4] {
        let a16 = u16::from(self.a);
        let premul = |c: u8| -> u8 { (((u16::from(c) * a16) + 127) / 255) as u8 };
        [premul(self.r), premul(self.g), premul(self.b), self.a]
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for Rgba8 {
    type Error = FlipreelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hex(&value)
    }
}

impl From<Rgba8> for String {
    fn from(value: Rgba8) -> Self {
        value.to_hex()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

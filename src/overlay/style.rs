use std::fmt;
use std::str::FromStr;

use super::RenderError;

pub const DEFAULT_FONT_SIZE: u32 = 30;
pub const DEFAULT_STROKE_WIDTH: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Accepts the colour-picker forms `#RRGGBB`, `RRGGBB`, `#RGB` and `RGB`.
impl FromStr for Rgb {
    type Err = RenderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let raw = value.trim();
        let hex = raw.strip_prefix('#').unwrap_or(raw);
        let invalid = || RenderError::InvalidStyle(format!("malformed colour '{}'", value));
        if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
        match hex.len() {
            6 => Ok(Rgb::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let expand = |idx: usize| channel(&hex[idx..idx + 1]).map(|v| v * 17);
                Ok(Rgb::new(expand(0)?, expand(1)?, expand(2)?))
            }
            _ => Err(invalid()),
        }
    }
}

/// Font, size, colours, stroke and position for one render call.
///
/// `x`/`y` are in original-resolution pixels. An unset axis is centred on
/// the image; a set axis is always honoured, even when the other is unset.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSpec {
    pub font: String,
    pub font_size: u32,
    pub text_color: Rgb,
    pub stroke_color: Rgb,
    /// Outline width in working-resolution pixels.
    pub stroke_width: f32,
    pub x: Option<f32>,
    pub y: Option<f32>,
}

impl StyleSpec {
    pub fn new(font: impl Into<String>) -> Self {
        Self {
            font: font.into(),
            font_size: DEFAULT_FONT_SIZE,
            text_color: Rgb::BLACK,
            stroke_color: Rgb::WHITE,
            stroke_width: DEFAULT_STROKE_WIDTH,
            x: None,
            y: None,
        }
    }

    pub fn with_font_size(mut self, size: u32) -> Self {
        self.font_size = size;
        self
    }

    pub fn with_colors(mut self, text: Rgb, stroke: Rgb) -> Self {
        self.text_color = text;
        self.stroke_color = stroke;
        self
    }

    pub fn with_stroke_width(mut self, width: f32) -> Self {
        self.stroke_width = width;
        self
    }

    pub fn with_position(mut self, x: Option<f32>, y: Option<f32>) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        if self.font_size == 0 {
            return Err(RenderError::InvalidStyle(
                "font size must be a positive integer".to_string(),
            ));
        }
        if !self.stroke_width.is_finite() || self.stroke_width < 0.0 {
            return Err(RenderError::InvalidStyle(format!(
                "stroke width must be a non-negative number (got {})",
                self.stroke_width
            )));
        }
        for (axis, value) in [("x", self.x), ("y", self.y)] {
            if let Some(value) = value
                && !value.is_finite()
            {
                return Err(RenderError::InvalidStyle(format!(
                    "{} position must be finite (got {})",
                    axis, value
                )));
            }
        }
        Ok(())
    }
}

//! Quote-on-image rendering.
//!
//! The background is upscaled by an integer factor, text is drawn with an
//! outline at that working resolution, and the result is downscaled back so
//! the output always has the input's dimensions.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageReader};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

mod error;
mod font;
mod layout;
mod raster;
mod style;

pub use error::RenderError;
pub use font::{FontCatalog, FontMetrics, ScaledFont, load_font_metrics};
pub use layout::{BlockLayout, LinePlacement, TextMeasure, layout_block};
pub use raster::{encode_image, image_format_from_mime, mime_from_extension};
pub use style::{DEFAULT_FONT_SIZE, DEFAULT_STROKE_WIDTH, Rgb, StyleSpec};

pub const DEFAULT_UPSCALE_FACTOR: u32 = 6;
/// Gap between stacked lines, in original-resolution pixels.
pub const DEFAULT_LINE_SPACING: f32 = 10.0;
const RESAMPLE_FILTER: FilterType = FilterType::Lanczos3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub upscale_factor: u32,
    pub line_spacing: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            upscale_factor: DEFAULT_UPSCALE_FACTOR,
            line_spacing: DEFAULT_LINE_SPACING,
        }
    }
}

impl RenderOptions {
    fn validate(&self) -> Result<(), RenderError> {
        if self.upscale_factor == 0 {
            return Err(RenderError::InvalidStyle(
                "upscale factor must be at least 1".to_string(),
            ));
        }
        if !self.line_spacing.is_finite() || self.line_spacing < 0.0 {
            return Err(RenderError::InvalidStyle(format!(
                "line spacing must be a non-negative number (got {})",
                self.line_spacing
            )));
        }
        Ok(())
    }
}

pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, RenderError> {
    image::load_from_memory(bytes).map_err(|err| RenderError::ImageLoad(err.to_string()))
}

pub fn load_image(path: &Path) -> Result<DynamicImage, RenderError> {
    let reader = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|err| RenderError::ImageLoad(format!("{}: {}", path.display(), err)))?;
    reader
        .decode()
        .map_err(|err| RenderError::ImageLoad(format!("{}: {}", path.display(), err)))
}

/// Decodes the image at `path` and renders `text` onto it.
pub fn render_path(
    path: &Path,
    text: &str,
    style: &StyleSpec,
    catalog: &FontCatalog,
    options: &RenderOptions,
) -> Result<DynamicImage, RenderError> {
    style.validate()?;
    options.validate()?;
    let image = load_image(path)?;
    render(&image, text, style, catalog, options)
}

/// Renders `text` (newline separated) onto a copy of `image`.
///
/// Lines with only whitespace still occupy a slot. Text that is entirely
/// empty skips font loading; the result is then the resampled source.
pub fn render(
    image: &DynamicImage,
    text: &str,
    style: &StyleSpec,
    catalog: &FontCatalog,
    options: &RenderOptions,
) -> Result<DynamicImage, RenderError> {
    style.validate()?;
    options.validate()?;

    let started = Instant::now();
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(RenderError::ImageLoad("image has no pixels".to_string()));
    }
    let factor = options.upscale_factor;
    let (work_w, work_h) = width
        .checked_mul(factor)
        .zip(height.checked_mul(factor))
        .ok_or_else(|| {
            RenderError::InvalidStyle(format!(
                "upscale factor {} is too large for a {}x{} image",
                factor, width, height
            ))
        })?;

    let lines = split_lines(text);
    let has_text = lines.iter().any(|line| !line.is_empty());
    let font = if has_text {
        Some(catalog.load(&style.font)?)
    } else {
        None
    };

    let mut canvas = imageops::resize(&image.to_rgba8(), work_w, work_h, RESAMPLE_FILTER);

    if let Some(font) = font {
        let scale = factor as f32;
        let font_px = style.font_size as f32 * scale;
        let block = layout_block(
            &lines,
            &font.at_size(font_px),
            work_w as f32,
            work_h as f32,
            options.line_spacing * scale,
            style.x.map(|x| x * scale),
            style.y.map(|y| y * scale),
        );
        debug!(
            "text block {:.1}x{:.1} at ({:.1}, {:.1}) on {}x{} working canvas",
            block.width, block.height, block.x, block.y, work_w, work_h
        );
        let layer = raster::draw_text_layer(work_w, work_h, &block, &font, font_px, style)?;
        imageops::overlay(&mut canvas, &layer, 0, 0);
    }

    let output = imageops::resize(&canvas, width, height, RESAMPLE_FILTER);
    info!(
        "rendered {} line(s) onto {}x{} image in {:.0}ms",
        lines.len(),
        width,
        height,
        started.elapsed().as_secs_f64() * 1000.0
    );
    Ok(DynamicImage::ImageRgba8(output))
}

fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

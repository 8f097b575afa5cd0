use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;
use tiny_skia::{Pixmap, Transform};
use usvg::{Options, Tree, fontdb};

use super::RenderError;
use super::font::FontMetrics;
use super::layout::BlockLayout;
use super::style::StyleSpec;

/// Draws the laid-out lines onto a transparent layer of `width` x `height`.
pub(crate) fn draw_text_layer(
    width: u32,
    height: u32,
    block: &BlockLayout,
    font: &FontMetrics,
    font_px: f32,
    style: &StyleSpec,
) -> Result<RgbaImage, RenderError> {
    let mut db = fontdb::Database::new();
    db.load_font_data(font.data().to_vec());
    let family = db
        .faces()
        .find(|face| face.index == font.face_index())
        .and_then(|face| face.families.first().map(|(name, _)| name.clone()))
        .or_else(|| font.family().map(str::to_string))
        .ok_or_else(|| RenderError::FontLoad("font has no family name".to_string()))?;
    db.set_sans_serif_family(family.clone());

    let svg = text_layer_svg(width, height, block, &family, font_px, style);
    let options = Options {
        fontdb: Arc::new(db),
        ..Options::default()
    };
    let tree = Tree::from_str(&svg, &options)
        .map_err(|err| RenderError::Raster(format!("failed to parse SVG: {}", err)))?;
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| RenderError::Raster(format!("cannot allocate {}x{} layer", width, height)))?;
    resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

    // tiny-skia stores premultiplied alpha; image blends straight alpha.
    let mut layer = RgbaImage::new(width, height);
    for (dst, src) in layer.pixels_mut().zip(pixmap.pixels()) {
        let color = src.demultiply();
        *dst = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
    Ok(layer)
}

fn text_layer_svg(
    width: u32,
    height: u32,
    block: &BlockLayout,
    family: &str,
    font_px: f32,
    style: &StyleSpec,
) -> String {
    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    ));

    // SVG strokes straddle the outline, so double the width to get
    // `stroke_width` pixels outside the glyph.
    let stroke = if style.stroke_width > 0.0 {
        format!(
            r#" stroke="{color}" stroke-width="{width}" stroke-linejoin="round" paint-order="stroke""#,
            color = style.stroke_color.to_hex(),
            width = style.stroke_width * 2.0
        )
    } else {
        String::new()
    };

    for line in &block.lines {
        if line.text.is_empty() {
            continue;
        }
        svg.push_str(&format!(
            r#"<text x="{x}" y="{y}" font-size="{size}" font-family="'{family}', sans-serif" fill="{fill}"{stroke} xml:space="preserve">{text}</text>"#,
            x = line.x,
            y = line.baseline,
            size = font_px,
            family = escape_xml(family),
            fill = style.text_color.to_hex(),
            stroke = stroke,
            text = escape_xml(&line.text)
        ));
    }

    svg.push_str("</svg>");
    svg
}

pub fn encode_image(image: &DynamicImage, output_mime: &str) -> Result<Vec<u8>, RenderError> {
    let format = image_format_from_mime(output_mime).ok_or_else(|| {
        RenderError::Encode(format!("unsupported output image mime '{}'", output_mime))
    })?;
    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);
    let result = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut cursor, format),
        _ => image.write_to(&mut cursor, format),
    };
    result.map_err(|err| RenderError::Encode(err.to_string()))?;
    Ok(bytes)
}

pub fn image_format_from_mime(mime: &str) -> Option<ImageFormat> {
    match mime {
        "image/png" => Some(ImageFormat::Png),
        "image/jpeg" => Some(ImageFormat::Jpeg),
        "image/jpg" => Some(ImageFormat::Jpeg),
        "image/gif" => Some(ImageFormat::Gif),
        "image/webp" => Some(ImageFormat::WebP),
        "image/bmp" => Some(ImageFormat::Bmp),
        "image/tiff" => Some(ImageFormat::Tiff),
        _ => None,
    }
}

pub fn mime_from_extension(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        _ => None,
    }
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

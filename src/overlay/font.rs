use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use ttf_parser::{Face, name_id};

use super::RenderError;
use super::layout::TextMeasure;

/// Font identifier to font file, with one default entry that unknown
/// identifiers fall back to.
#[derive(Debug, Clone)]
pub struct FontCatalog {
    entries: BTreeMap<String, PathBuf>,
    default_id: String,
}

impl FontCatalog {
    pub fn new(default_id: impl Into<String>, default_path: impl Into<PathBuf>) -> Self {
        let default_id = default_id.into();
        let mut entries = BTreeMap::new();
        entries.insert(default_id.clone(), default_path.into());
        Self {
            entries,
            default_id,
        }
    }

    pub fn with_font(mut self, id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.entries.insert(id.into(), path.into());
        self
    }

    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, PathBuf)>,
        default_id: &str,
    ) -> Result<Self, RenderError> {
        let entries = entries.into_iter().collect::<BTreeMap<_, _>>();
        if !entries.contains_key(default_id) {
            return Err(RenderError::FontLoad(format!(
                "default font '{}' is not in the font catalog",
                default_id
            )));
        }
        Ok(Self {
            entries,
            default_id: default_id.to_string(),
        })
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .map(|(id, path)| (id.as_str(), path.as_path()))
    }

    /// Returns the identifier actually used and its font file.
    pub fn resolve<'a>(&'a self, id: &'a str) -> (&'a str, &'a Path) {
        if let Some(path) = self.entries.get(id) {
            return (id, path.as_path());
        }
        debug!(
            "unknown font '{}', falling back to '{}'",
            id, self.default_id
        );
        let path = self
            .entries
            .get(&self.default_id)
            .map(PathBuf::as_path)
            .unwrap_or_else(|| Path::new(""));
        (self.default_id.as_str(), path)
    }

    pub fn load(&self, id: &str) -> Result<FontMetrics, RenderError> {
        let (resolved, path) = self.resolve(id);
        debug!("loading font '{}' from {}", resolved, path.display());
        load_font_metrics(path)
    }
}

#[derive(Clone)]
pub struct FontMetrics {
    data: Arc<Vec<u8>>,
    units_per_em: u16,
    space_advance: u16,
    ascender: i16,
    descender: i16,
    family: Option<String>,
    face_index: u32,
}

impl FontMetrics {
    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    pub fn face_index(&self) -> u32 {
        self.face_index
    }

    /// Metrics of this face at `font_px` pixels per em.
    pub fn at_size(&self, font_px: f32) -> ScaledFont<'_> {
        ScaledFont {
            font: self,
            font_px,
        }
    }

    fn scale(&self, font_px: f32) -> f32 {
        font_px / self.units_per_em.max(1) as f32
    }
}

impl std::fmt::Debug for FontMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontMetrics")
            .field("family", &self.family)
            .field("units_per_em", &self.units_per_em)
            .field("face_index", &self.face_index)
            .finish()
    }
}

pub struct ScaledFont<'a> {
    font: &'a FontMetrics,
    font_px: f32,
}

impl TextMeasure for ScaledFont<'_> {
    fn line_width(&self, line: &str) -> f32 {
        measure_text_width_px(line, self.font_px, self.font)
    }

    fn line_height(&self) -> f32 {
        let units = self.font.ascender as f32 - self.font.descender as f32;
        units.max(0.0) * self.font.scale(self.font_px)
    }

    fn ascent(&self) -> f32 {
        self.font.ascender as f32 * self.font.scale(self.font_px)
    }
}

pub fn load_font_metrics(path: &Path) -> Result<FontMetrics, RenderError> {
    let data = std::fs::read(path).map_err(|err| {
        RenderError::FontLoad(format!("failed to read font: {} ({})", path.display(), err))
    })?;
    load_font_metrics_from_data(data).map_err(|err| {
        RenderError::FontLoad(format!("failed to parse font: {} ({})", path.display(), err))
    })
}

pub(crate) fn measure_text_width_px(text: &str, font_px: f32, font: &FontMetrics) -> f32 {
    let Ok(face) = Face::parse(&font.data, font.face_index) else {
        return 0.0;
    };
    let mut advance = 0u32;
    for ch in text.chars() {
        if ch == '\n' || ch == '\r' {
            continue;
        }
        let glyph_advance = face
            .glyph_index(ch)
            .and_then(|glyph| face.glyph_hor_advance(glyph))
            .unwrap_or(font.space_advance);
        advance = advance.saturating_add(glyph_advance as u32);
    }
    advance as f32 * font.scale(font_px)
}

fn load_font_metrics_from_data(data: Vec<u8>) -> Result<FontMetrics, String> {
    let count = ttf_parser::fonts_in_collection(&data).unwrap_or(1);
    for index in 0..count {
        let Ok(face) = Face::parse(&data, index) else {
            continue;
        };
        let units_per_em = face.units_per_em().max(1);
        let space_advance = face
            .glyph_index(' ')
            .and_then(|id| face.glyph_hor_advance(id))
            .unwrap_or(units_per_em / 2);
        let family = extract_family_name(&face);
        let ascender = face.ascender();
        let descender = face.descender();
        return Ok(FontMetrics {
            data: Arc::new(data),
            units_per_em,
            space_advance,
            ascender,
            descender,
            family,
            face_index: index,
        });
    }
    Err("no usable face in font data".to_string())
}

fn extract_family_name(face: &Face<'_>) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::system_font_path;

    fn catalog() -> FontCatalog {
        FontCatalog::new("garam", "fonts/garam.ttf")
            .with_font("pen", "fonts/pen.ttf")
            .with_font("gothic", "fonts/gothic.ttf")
    }

    #[test]
    fn known_font_resolves_to_its_file() {
        let catalog = catalog();
        assert_eq!(catalog.resolve("pen"), ("pen", Path::new("fonts/pen.ttf")));
    }

    #[test]
    fn unknown_font_resolves_to_default() {
        let catalog = catalog();
        assert_eq!(catalog.resolve("예스 명조 레귤러"), catalog.resolve("garam"));
        assert_eq!(catalog.resolve("").0, "garam");
    }

    #[test]
    fn from_entries_requires_default() {
        let entries = vec![("pen".to_string(), PathBuf::from("pen.ttf"))];
        assert!(matches!(
            FontCatalog::from_entries(entries.clone(), "garam"),
            Err(RenderError::FontLoad(_))
        ));
        let catalog = FontCatalog::from_entries(entries, "pen").unwrap();
        assert_eq!(catalog.default_id(), "pen");
        assert_eq!(catalog.entries().count(), 1);
    }

    #[test]
    fn missing_font_file_is_font_load_error() {
        let err = catalog().load("pen").unwrap_err();
        match err {
            RenderError::FontLoad(message) => assert!(message.contains("pen.ttf")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn corrupt_font_file_is_font_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"definitely not a font").unwrap();
        assert!(matches!(
            load_font_metrics(&path),
            Err(RenderError::FontLoad(_))
        ));
    }

    #[test]
    fn system_font_metrics_scale_with_size() {
        let Some(path) = system_font_path() else {
            eprintln!("no system font available; skipping");
            return;
        };
        let font = load_font_metrics(&path).unwrap();
        let small = font.at_size(10.0);
        let large = font.at_size(60.0);
        let ratio = large.line_width("Believe") / small.line_width("Believe");
        assert!((ratio - 6.0).abs() < 1e-3, "ratio {ratio}");
        assert!(small.line_height() > 0.0);
        assert!(small.ascent() > 0.0 && small.ascent() <= small.line_height());
        assert_eq!(small.line_width(""), 0.0);
        assert!(small.line_width("in yourself") > small.line_width("in"));
    }
}

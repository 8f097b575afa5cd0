use image::{DynamicImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use usvg::fontdb;

use crate::overlay::FontCatalog;

pub(crate) fn with_temp_home<F, R>(func: F) -> R
where
    F: FnOnce(&Path) -> R,
{
    static HOME_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
    let _guard = HOME_MUTEX.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let dir = tempfile::tempdir().expect("tempdir");
    let old_home = std::env::var("HOME").ok();
    // SAFETY: HOME_MUTEX serializes every test that touches HOME.
    unsafe { std::env::set_var("HOME", dir.path()) };
    let result = func(dir.path());
    match old_home {
        Some(old) => unsafe { std::env::set_var("HOME", old) },
        None => unsafe { std::env::remove_var("HOME") },
    }
    result
}

pub(crate) fn solid_image(width: u32, height: u32, color: Rgba<u8>) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, color))
}

/// First installed sans-serif TrueType/OpenType file, if the host has one.
pub(crate) fn system_font_path() -> Option<PathBuf> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    let is_font_file = |path: &Path| {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf"))
            .unwrap_or(false)
    };
    let file_of = |face: &fontdb::FaceInfo| match &face.source {
        fontdb::Source::File(path) if face.index == 0 && is_font_file(path) => Some(path.clone()),
        _ => None,
    };
    let query = fontdb::Query {
        families: &[fontdb::Family::SansSerif],
        ..Default::default()
    };
    db.query(&query)
        .and_then(|id| db.face(id))
        .and_then(file_of)
        .or_else(|| {
            db.faces()
                .filter(|face| face.families.iter().any(|(name, _)| name.contains("Sans")))
                .find_map(file_of)
        })
        .or_else(|| db.faces().find_map(file_of))
}

pub(crate) fn system_font_catalog() -> Option<FontCatalog> {
    system_font_path().map(|path| FontCatalog::new("system", path))
}

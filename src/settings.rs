use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::overlay::{
    DEFAULT_FONT_SIZE, DEFAULT_LINE_SPACING, DEFAULT_STROKE_WIDTH, DEFAULT_UPSCALE_FACTOR,
    FontCatalog, RenderOptions, Rgb,
};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub fonts: BTreeMap<String, String>,
    pub default_font: String,
    pub font_directory: Option<String>,
    pub text_color: String,
    pub stroke_color: String,
    pub font_size: u32,
    pub stroke_width: f32,
    pub line_spacing: f32,
    pub upscale_factor: u32,
    pub phrase_model: Option<String>,
    pub phrase_max_tokens: u32,
    pub phrase_temperature: f32,
    pub phrase_max_chars: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fonts: BTreeMap::new(),
            default_font: String::new(),
            font_directory: None,
            text_color: "#000000".to_string(),
            stroke_color: "#FFFFFF".to_string(),
            font_size: DEFAULT_FONT_SIZE,
            stroke_width: DEFAULT_STROKE_WIDTH,
            line_spacing: DEFAULT_LINE_SPACING,
            upscale_factor: DEFAULT_UPSCALE_FACTOR,
            phrase_model: None,
            phrase_max_tokens: 50,
            phrase_temperature: 0.7,
            phrase_max_chars: 20,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    fonts: Option<FontSettings>,
    overlay: Option<OverlaySettings>,
    phrase: Option<PhraseSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct FontSettings {
    directory: Option<String>,
    default: Option<String>,
    catalog: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
struct OverlaySettings {
    text_color: Option<String>,
    stroke_color: Option<String>,
    font_size: Option<u32>,
    stroke_width: Option<f32>,
    line_spacing: Option<f32>,
    upscale_factor: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct PhraseSettings {
    model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    max_chars: Option<usize>,
}

/// Built-in defaults, then `./settings.toml`, `./settings.local.toml`, the
/// same two files under `~/.bookmark-maker`, then `extra_path`.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    let defaults: SettingsFile =
        toml::from_str(DEFAULT_SETTINGS_TOML).with_context(|| "failed to parse built-in settings")?;
    settings.merge(defaults);
    ensure_home_settings_file()?;

    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(fonts) = incoming.fonts {
            if let Some(directory) = fonts.directory {
                self.font_directory = Some(directory).filter(|dir| !dir.trim().is_empty());
            }
            if let Some(default) = fonts.default
                && !default.trim().is_empty()
            {
                self.default_font = default;
            }
            if let Some(catalog) = fonts.catalog {
                for (id, path) in catalog {
                    if path.trim().is_empty() {
                        warn!("ignoring font '{}' with an empty path", id);
                        continue;
                    }
                    self.fonts.insert(id, path);
                }
            }
        }
        if let Some(overlay) = incoming.overlay {
            if let Some(color) = overlay.text_color
                && !color.trim().is_empty()
            {
                self.text_color = color;
            }
            if let Some(color) = overlay.stroke_color
                && !color.trim().is_empty()
            {
                self.stroke_color = color;
            }
            if let Some(size) = overlay.font_size {
                if size > 0 {
                    self.font_size = size;
                } else {
                    warn!("ignoring non-positive overlay.font_size");
                }
            }
            if let Some(width) = overlay.stroke_width
                && width >= 0.0
            {
                self.stroke_width = width;
            }
            if let Some(spacing) = overlay.line_spacing
                && spacing >= 0.0
            {
                self.line_spacing = spacing;
            }
            if let Some(factor) = overlay.upscale_factor {
                if factor > 0 {
                    self.upscale_factor = factor;
                } else {
                    warn!("ignoring overlay.upscale_factor = 0");
                }
            }
        }
        if let Some(phrase) = incoming.phrase {
            if let Some(model) = phrase.model
                && !model.trim().is_empty()
            {
                self.phrase_model = Some(model);
            }
            if let Some(tokens) = phrase.max_tokens
                && tokens > 0
            {
                self.phrase_max_tokens = tokens;
            }
            if let Some(temperature) = phrase.temperature
                && (0.0..=2.0).contains(&temperature)
            {
                self.phrase_temperature = temperature;
            }
            if let Some(chars) = phrase.max_chars
                && chars > 0
            {
                self.phrase_max_chars = chars;
            }
        }
    }

    /// Font catalog with relative paths resolved against `font_directory`.
    pub fn font_catalog(&self) -> Result<FontCatalog> {
        let base = self.font_directory.as_deref().map(Path::new);
        let entries = self.fonts.iter().map(|(id, path)| {
            let path = Path::new(path);
            let resolved = match base {
                Some(base) if path.is_relative() => base.join(path),
                _ => path.to_path_buf(),
            };
            (id.clone(), resolved)
        });
        FontCatalog::from_entries(entries, &self.default_font)
            .with_context(|| "invalid [fonts] settings")
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            upscale_factor: self.upscale_factor,
            line_spacing: self.line_spacing,
        }
    }

    pub fn text_rgb(&self) -> Result<Rgb> {
        self.text_color
            .parse::<Rgb>()
            .with_context(|| "invalid overlay.text_color")
    }

    pub fn stroke_rgb(&self) -> Result<Rgb> {
        self.stroke_color
            .parse::<Rgb>()
            .with_context(|| "invalid overlay.stroke_color")
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".bookmark-maker"))
        }
    })
}

use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub mod logging;
pub mod overlay;
pub mod phrase;
pub mod providers;
pub mod settings;
#[cfg(test)]
mod test_util;

pub use overlay::{
    FontCatalog, RenderError, RenderOptions, Rgb, StyleSpec, decode_image, encode_image, render,
    render_path,
};
pub use phrase::{PhraseGenerator, QuoteOutput};
pub use providers::{OpenAI, Provider, ProviderUsage};

#[derive(Debug, Clone)]
pub struct Config {
    pub settings_path: Option<String>,
    pub key: Option<String>,
    pub model: Option<String>,
    pub with_using_tokens: bool,
    pub with_using_model: bool,
    pub action: Action,
}

#[derive(Debug, Clone)]
pub enum Action {
    Questions,
    Fonts,
    Quote { answers: Vec<String> },
    Render { text: String, job: RenderJob },
    Make { answers: Vec<String>, job: RenderJob },
}

/// Caller-side render parameters. Unset fields fall back to settings.
#[derive(Debug, Clone, Default)]
pub struct RenderJob {
    pub image: PathBuf,
    pub output: PathBuf,
    pub font: Option<String>,
    pub font_size: Option<u32>,
    pub text_color: Option<String>,
    pub stroke_color: Option<String>,
    pub stroke_width: Option<f32>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub upscale_factor: Option<u32>,
}

pub async fn run(config: Config) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;

    match &config.action {
        Action::Questions => Ok(format_questions()),
        Action::Fonts => format_fonts(&settings),
        Action::Quote { answers } => {
            let output = generate_quote(&config, &settings, answers).await?;
            Ok(format_quote_output(&output, &config))
        }
        Action::Render { text, job } => {
            render_job(&settings, text, job)?;
            Ok(format!("saved: {}", job.output.display()))
        }
        Action::Make { answers, job } => {
            let output = generate_quote(&config, &settings, answers).await?;
            render_job(&settings, &output.quote, job)?;
            Ok(format!(
                "{}\nsaved: {}",
                format_quote_output(&output, &config),
                job.output.display()
            ))
        }
    }
}

async fn generate_quote(
    config: &Config,
    settings: &settings::Settings,
    answers: &[String],
) -> Result<QuoteOutput> {
    phrase::validate_answers(answers)?;
    let key = providers::resolve_key(config.key.as_deref())?;
    let model = config
        .model
        .clone()
        .or_else(|| settings.phrase_model.clone())
        .unwrap_or_default();
    let provider = OpenAI::new(key)
        .with_model(model)
        .with_max_tokens(settings.phrase_max_tokens)
        .with_temperature(settings.phrase_temperature);
    PhraseGenerator::new(provider)
        .with_max_chars(settings.phrase_max_chars)
        .generate(answers)
        .await
}

fn render_job(settings: &settings::Settings, text: &str, job: &RenderJob) -> Result<()> {
    let catalog = settings.font_catalog()?;
    let style = build_style(settings, &catalog, job)?;
    let mut options = settings.render_options();
    if let Some(factor) = job.upscale_factor {
        options.upscale_factor = factor;
    }
    let mime = output_mime(&job.output)?;

    let image = render_path(&job.image, text, &style, &catalog, &options)
        .with_context(|| format!("failed to render onto {}", job.image.display()))?;
    let bytes = encode_image(&image, mime)?;
    fs::write(&job.output, bytes)
        .with_context(|| format!("failed to write image: {}", job.output.display()))?;
    info!("bookmark written to {}", job.output.display());
    Ok(())
}

fn build_style(
    settings: &settings::Settings,
    catalog: &FontCatalog,
    job: &RenderJob,
) -> Result<StyleSpec> {
    let font = job
        .font
        .clone()
        .unwrap_or_else(|| catalog.default_id().to_string());
    let text_color = match job.text_color.as_deref() {
        Some(value) => value.parse::<Rgb>().with_context(|| "invalid --color")?,
        None => settings.text_rgb()?,
    };
    let stroke_color = match job.stroke_color.as_deref() {
        Some(value) => value
            .parse::<Rgb>()
            .with_context(|| "invalid --stroke-color")?,
        None => settings.stroke_rgb()?,
    };
    let style = StyleSpec::new(font)
        .with_font_size(job.font_size.unwrap_or(settings.font_size))
        .with_colors(text_color, stroke_color)
        .with_stroke_width(job.stroke_width.unwrap_or(settings.stroke_width))
        .with_position(job.x, job.y);
    style.validate()?;
    Ok(style)
}

fn output_mime(path: &Path) -> Result<&'static str> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| anyhow!("output path needs an image extension: {}", path.display()))?;
    overlay::mime_from_extension(extension)
        .ok_or_else(|| anyhow!("unsupported output image extension '{}'", extension))
}

fn format_questions() -> String {
    phrase::questions()
        .iter()
        .enumerate()
        .map(|(idx, question)| format!("{}. {}\t{}", idx + 1, question.text, question.gloss))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_fonts(settings: &settings::Settings) -> Result<String> {
    let catalog = settings.font_catalog()?;
    let lines = catalog
        .entries()
        .map(|(id, path)| {
            let marker = if id == catalog.default_id() {
                "\t(default)"
            } else {
                ""
            };
            format!("{}\t{}{}", id, path.display(), marker)
        })
        .collect::<Vec<_>>();
    Ok(lines.join("\n"))
}

fn format_quote_output(output: &QuoteOutput, config: &Config) -> String {
    let mut text = output.quote.clone();
    let mut meta_lines = Vec::new();

    if config.with_using_model {
        let model = output.model.as_deref().unwrap_or("unavailable");
        meta_lines.push(format!("model: {}", model));
    }

    if config.with_using_tokens {
        meta_lines.push(format_usage(output.usage.as_ref()));
    }

    if !meta_lines.is_empty() {
        text.push('\n');
        text.push_str(&meta_lines.join("\n"));
    }

    text
}

fn format_usage(usage: Option<&ProviderUsage>) -> String {
    let Some(usage) = usage else {
        return "tokens: unavailable".to_string();
    };
    let total = usage.total_tokens.or_else(|| {
        usage
            .prompt_tokens
            .zip(usage.completion_tokens)
            .map(|(prompt, completion)| prompt + completion)
    });

    let mut parts = Vec::new();
    if let Some(prompt) = usage.prompt_tokens {
        parts.push(format!("prompt={}", prompt));
    }
    if let Some(completion) = usage.completion_tokens {
        parts.push(format!("completion={}", completion));
    }
    if let Some(total) = total {
        parts.push(format!("total={}", total));
    }

    if parts.is_empty() {
        "tokens: unavailable".to_string()
    } else {
        format!("tokens: {}", parts.join(", "))
    }
}

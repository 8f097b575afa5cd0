use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use bookmark_maker::{Action, Config, RenderJob};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "bookmark-maker",
    version,
    about = "Turn questionnaire answers into a quote and draw it onto a bookmark image"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Model name for phrase generation (e.g. gpt-4o-mini)
    #[arg(short = 'm', long = "model", global = true)]
    model: Option<String>,

    /// OpenAI API key (overrides OPENAI_API_KEY)
    #[arg(short = 'k', long = "key", global = true)]
    key: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings", global = true)]
    read_settings: Option<String>,

    /// Append token usage to quote output
    #[arg(long = "with-using-tokens", global = true)]
    with_using_tokens: bool,

    /// Append model name to quote output
    #[arg(long = "with-using-model", global = true)]
    with_using_model: bool,

    /// Enable verbose logging
    #[arg(long = "verbose", global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the questionnaire
    Questions,
    /// Print the font catalog
    Fonts,
    /// Generate a quote from answers (one --answer per question, in order)
    Quote {
        #[arg(short = 'a', long = "answer", required = true)]
        answers: Vec<String>,
    },
    /// Draw text onto a background image
    Render {
        /// Text to draw; a literal "\n" starts a new line
        #[arg(short = 't', long = "text", conflicts_with = "text_file")]
        text: Option<String>,

        /// Read the text from a file
        #[arg(long = "text-file")]
        text_file: Option<PathBuf>,

        #[command(flatten)]
        job: JobArgs,
    },
    /// Generate a quote and draw it onto a background image
    Make {
        #[arg(short = 'a', long = "answer", required = true)]
        answers: Vec<String>,

        #[command(flatten)]
        job: JobArgs,
    },
}

#[derive(Args, Debug)]
struct JobArgs {
    /// Background image (JPEG/PNG/...)
    #[arg(short = 'i', long = "image")]
    image: PathBuf,

    /// Output image; format follows the extension
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Font identifier from the catalog (unknown names use the default)
    #[arg(short = 'f', long = "font")]
    font: Option<String>,

    /// Font size in points
    #[arg(short = 's', long = "size")]
    size: Option<u32>,

    /// Text colour (#RRGGBB)
    #[arg(short = 'c', long = "color")]
    color: Option<String>,

    /// Outline colour (#RRGGBB)
    #[arg(long = "stroke-color")]
    stroke_color: Option<String>,

    /// Outline width in working-resolution pixels
    #[arg(long = "stroke-width")]
    stroke_width: Option<f32>,

    /// Left edge of the text in image pixels (centred when omitted)
    #[arg(short = 'x', long = "x")]
    x: Option<f32>,

    /// Top edge of the text in image pixels (centred when omitted)
    #[arg(short = 'y', long = "y")]
    y: Option<f32>,

    /// Supersampling factor
    #[arg(long = "upscale")]
    upscale: Option<u32>,
}

impl From<JobArgs> for RenderJob {
    fn from(args: JobArgs) -> Self {
        RenderJob {
            image: args.image,
            output: args.output,
            font: args.font,
            font_size: args.size,
            text_color: args.color,
            stroke_color: args.stroke_color,
            stroke_width: args.stroke_width,
            x: args.x,
            y: args.y,
            upscale_factor: args.upscale,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    bookmark_maker::logging::init(cli.verbose)?;

    let action = match cli.command {
        Commands::Questions => Action::Questions,
        Commands::Fonts => Action::Fonts,
        Commands::Quote { answers } => Action::Quote { answers },
        Commands::Render {
            text,
            text_file,
            job,
        } => {
            let text = match (text, text_file) {
                (Some(text), _) => text.replace("\\n", "\n"),
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read text file: {}", path.display()))?
                    .trim_end_matches(['\r', '\n'])
                    .to_string(),
                (None, None) => return Err(anyhow!("either --text or --text-file is required")),
            };
            Action::Render {
                text,
                job: job.into(),
            }
        }
        Commands::Make { answers, job } => Action::Make {
            answers,
            job: job.into(),
        },
    };

    let output = bookmark_maker::run(Config {
        settings_path: cli.read_settings,
        key: cli.key,
        model: cli.model,
        with_using_tokens: cli.with_using_tokens,
        with_using_model: cli.with_using_model,
        action,
    })
    .await?;

    println!("{}", output);
    Ok(())
}

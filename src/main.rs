use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use qrpng::{generate_with_bitmap, QrError, RenderConfig, RenderedImage};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qrpng")]
#[command(about = "Generate a QR code PNG from text, a URL, a number or any other data")]
struct Args {
    /// Data to encode; read from stdin when omitted
    text: Option<String>,

    /// Output image path
    #[arg(short, long, default_value = RenderedImage::FILE_NAME)]
    output: PathBuf,

    /// Pixels per module
    #[arg(short, long, default_value_t = RenderConfig::DEFAULT_MODULE_SIZE)]
    module_size: u32,

    /// Quiet zone width in modules
    #[arg(short, long, default_value_t = RenderConfig::DEFAULT_BORDER)]
    border: u32,

    /// Also print the code to the terminal
    #[arg(short, long)]
    preview: bool,
}

fn read_input(text: Option<String>) -> Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read data from stdin")?;
            if buf.ends_with('\n') {
                buf.pop();
                if buf.ends_with('\r') {
                    buf.pop();
                }
            }
            Ok(buf)
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let text = read_input(args.text)?;
    let config = RenderConfig::default()
        .with_module_size(args.module_size)
        .with_border(args.border);

    let (bitmap, image) = match generate_with_bitmap(&text, &config) {
        Ok(generated) => generated,
        Err(err @ QrError::EmptyInput) => {
            warn!("{}", err.user_message());
            return Ok(());
        }
        Err(err) => {
            error!("{}", err.user_message());
            return Err(err).context("QR code generation failed");
        }
    };

    if args.preview {
        println!("{}", bitmap.to_text());
    }

    image
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!(
        path = %args.output.display(),
        width = image.width(),
        height = image.height(),
        "QR code generated successfully"
    );
    Ok(())
}

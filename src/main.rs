use std::io::{self, IsTerminal, Read};
use std::path::Path;

use anyhow::{Result, anyhow};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "handwriting-ocr-rust",
    version,
    about = "Group OCR word detections into lines and phrases"
)]
struct Cli {
    /// JSON file with word detections or a Vision response (stdin otherwise)
    #[arg(short = 'd', long = "data")]
    data: Option<String>,

    /// Input format: auto, words, vision
    #[arg(short = 'F', long = "format", default_value = "auto")]
    format: String,

    /// Image file to read the width/height from
    #[arg(long = "image")]
    image: Option<String>,

    /// Image width in pixels (overrides every other source)
    #[arg(long = "width")]
    width: Option<f64>,

    /// Image height in pixels (overrides every other source)
    #[arg(long = "height")]
    height: Option<f64>,

    /// Run the HTTP server (address defaults to [server] addr in settings)
    #[arg(long = "server", num_args = 0..=1, default_missing_value = "")]
    server: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Write per-line cluster diagnostics as JSON
    #[arg(long = "debug-ocr")]
    debug_ocr: bool,

    /// Print single-line JSON
    #[arg(long = "compact")]
    compact: bool,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    handwriting_ocr_rust::logging::init(cli.verbose)?;

    if let Some(addr) = cli.server {
        let settings = handwriting_ocr_rust::settings::load_settings(
            cli.read_settings.as_deref().map(Path::new),
        )?;
        let addr = if addr.trim().is_empty() {
            settings.server_addr.clone()
        } else {
            addr.trim().to_string()
        };
        return handwriting_ocr_rust::server::run_server(settings, addr).await;
    }

    let input = if cli.data.is_some() {
        None
    } else {
        if io::stdin().is_terminal() {
            return Err(anyhow!("no input: pass --data <file> or pipe JSON on stdin"));
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Some(buffer)
    };

    let output = handwriting_ocr_rust::run(
        handwriting_ocr_rust::Config {
            data: cli.data,
            format: cli.format.parse()?,
            image: cli.image,
            width: cli.width,
            height: cli.height,
            settings_path: cli.read_settings,
            debug_ocr: cli.debug_ocr,
            compact: cli.compact,
        },
        input,
    )?;

    println!("{}", output);
    Ok(())
}

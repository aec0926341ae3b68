use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use mythic::client::ModelClient;
use mythic::client::gemini::GeminiClient;
use mythic::client::ollama::OllamaClient;
use mythic::config::{GeminiConfig, OllamaConfig};
use mythic::flow::FlowError;
use mythic::flow::classify::{ClassifySymbolInput, classify_symbol};
use mythic::flow::detect::{DetectHiddenSymbolsInput, detect_hidden_symbols};
use mythic::flow::illusion::generate_illusion;
use mythic::logger::init_tracing;
use mythic::util::{decode_data_uri, encode_data_uri, extension_from_mime, mime_from_extension, parse_data_uri};

#[derive(Parser, Debug)]
#[command(
    name = "mythic",
    about = "Symbol classification, hidden-symbol detection and illusion generation",
    version = "0.1.0"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level override (e.g. error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Optional .env file to load before reading configuration
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Which model backend to call
    #[arg(long, value_enum, default_value_t = Provider::Gemini)]
    provider: Provider,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify the magical symbol in an image
    Classify {
        #[arg(long)]
        image: PathBuf,
    },

    /// Detect hidden symbols in an artwork
    Detect {
        #[arg(long)]
        image: PathBuf,
    },

    /// Generate an abstract optical illusion
    Generate {
        /// Where to write the generated image (defaults to the working directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Provider {
    Gemini,
    Ollama,
}

fn build_client(provider: Provider) -> anyhow::Result<Box<dyn ModelClient>> {
    match provider {
        Provider::Gemini => Ok(Box::new(GeminiClient::new(GeminiConfig::from_env()?))),
        Provider::Ollama => Ok(Box::new(OllamaClient::new(OllamaConfig::from_env()?))),
    }
}

fn image_to_data_uri(path: &Path) -> anyhow::Result<String> {
    let mime = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(mime_from_extension)
        .with_context(|| format!("{} is not a supported image type", path.display()))?;
    let bytes = fs::read(path).with_context(|| format!("could not read {}", path.display()))?;
    Ok(encode_data_uri(mime, &bytes))
}

/// Every flow failure collapses into one generic user-facing message; the
/// detail goes to the log.
fn fail(err: FlowError) -> anyhow::Error {
    error!(error = %err, "flow failed");
    anyhow::anyhow!("operation failed, please try again")
}

fn write_illusion(media: &str, out: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    let Some(uri) = parse_data_uri(media) else {
        bail!("generated media is not a data URI");
    };
    let bytes = decode_data_uri(&uri).context("generated media is not valid base64")?;

    let path = match out {
        Some(path) => path,
        None => {
            let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
            PathBuf::from(format!("illusion-{stamp}.{}", extension_from_mime(uri.mime)))
        }
    };
    fs::write(&path, bytes).with_context(|| format!("could not write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn image_file_becomes_a_typed_data_uri() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("symbol.png");
        fs::write(&path, [1u8, 2, 3]).unwrap();

        let uri = image_to_data_uri(&path).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"hello").unwrap();

        let err = image_to_data_uri(&path).unwrap_err();
        assert!(err.to_string().contains("not a supported image type"));
    }

    #[test]
    fn generated_media_is_decoded_and_written() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("illusion.png");

        let written = write_illusion("data:image/png;base64,AQID", Some(out.clone())).unwrap();
        assert_eq!(written, out);
        assert_eq!(fs::read(&out).unwrap(), vec![1u8, 2, 3]);
    }

    #[test]
    fn non_data_uri_media_is_an_error() {
        assert!(write_illusion("https://example.com/i.png", None).is_err());
    }
}

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("could not load {}", path.display()))?;
            info!("loaded environment from {}", path.display());
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    let client = build_client(cli.provider)?;

    match cli.command {
        Commands::Classify { image } => {
            let input = ClassifySymbolInput {
                image_data_uri: image_to_data_uri(&image)?,
            };
            let output = classify_symbol(client.as_ref(), &input)
                .await
                .map_err(fail)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Detect { image } => {
            let input = DetectHiddenSymbolsInput {
                artwork_data_uri: image_to_data_uri(&image)?,
            };
            let output = detect_hidden_symbols(client.as_ref(), &input)
                .await
                .map_err(fail)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Generate { out } => {
            let output = generate_illusion(client.as_ref()).await.map_err(fail)?;
            let path = write_illusion(&output.media, out)?;
            println!("Illusion written to {}", path.display());
        }
    }

    Ok(())
}

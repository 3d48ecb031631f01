use dotenvy::dotenv;
use oxide_ytdlp::config::Configuration;
use oxide_ytdlp::runner::ProcessRunner;
use oxide_ytdlp::server;
use oxide_ytdlp::tools::{ToolProvider, YtdlpProvider};
use std::io;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    // Stdout carries responses, so logs go to stderr
    init_logging();

    let config = init_config();

    let list_only = std::env::args().skip(1).any(|arg| arg == "--list-tools");
    let runner = if list_only {
        ProcessRunner::with_binary("yt-dlp")
    } else {
        init_runner()
    };

    let provider = YtdlpProvider::new(Arc::new(runner), config);

    if list_only {
        println!("{}", serde_json::to_string_pretty(&provider.tools())?);
        return Ok(());
    }

    info!(
        provider = provider.name(),
        tools = provider.tools().len(),
        "Serving tool calls on stdin"
    );

    server::serve(
        &provider,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    info!("Shutting down");
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn init_config() -> Arc<Configuration> {
    match Configuration::from_env() {
        Ok(c) => {
            info!(
                downloads_dir = %c.file.downloads_dir,
                "Configuration loaded successfully."
            );
            Arc::new(c)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_runner() -> ProcessRunner {
    match ProcessRunner::new() {
        Ok(runner) => runner,
        Err(e) => {
            error!("{e}. Install yt-dlp and make sure it is on PATH.");
            std::process::exit(1);
        }
    }
}

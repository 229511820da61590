use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use debate_gateway::{ApiServerBuilder, Config, SarvamClient};

/// Debate Gateway - streaming speech relay and REST backend
#[derive(Parser)]
#[command(name = "debate-gateway", version, about)]
struct Cli {
    /// Port to listen on (overrides `PORT`)
    #[arg(long)]
    port: Option<u16>,

    /// Directory of the built web UI to serve
    #[arg(long, env = "DEBATE_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; real deployments set the environment directly
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up logging based on verbosity, unless RUST_LOG says otherwise
    let filter = match cli.verbose {
        0 => "info,debate_gateway=info",
        1 => "info,debate_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded environment file");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.static_dir.is_some() {
        config.static_dir = cli.static_dir;
    }
    tracing::debug!(?config, "loaded configuration");

    tracing::info!(
        port = config.port,
        stt_language = %config.sarvam.stt_language,
        tts_model = %config.sarvam.tts_model,
        "starting debate gateway"
    );

    let coaching_language = config.sarvam.tts_language.clone();
    let vendor = Arc::new(SarvamClient::new(config.sarvam));

    let server = ApiServerBuilder::new(vendor.clone(), vendor, config.port)
        .static_dir(config.static_dir)
        .coaching_language(coaching_language)
        .build();

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }

    Ok(())
}

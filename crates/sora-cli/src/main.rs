//! `sora` command-line binary.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, info};

use sora_cli::{
    client_config, init_tracing, write_history, GenerateConfig, GenerateError, GenerationFlags,
    JobLifecycle, StatusReporter, EXIT_FAILURE,
};
use sora_client::SoraClient;
use sora_history::{HistoryStore, JsonFileStore};
use sora_media::{FfmpegTranscoder, MediaConformer};

/// Generate videos with Sora.
#[derive(Debug, Parser)]
#[command(name = "sora", version, about)]
struct Cli {
    /// Text prompt; asked for interactively when omitted
    #[arg(short, long, default_value = "")]
    prompt: String,

    /// Output file, or `-` to write the video to stdout (default: <job id>.mp4)
    #[arg(short, long)]
    output: Option<String>,

    /// Image or video to use as the first frame
    #[arg(long)]
    file: Option<PathBuf>,

    /// Remix a previous video: job id, @N, @last or an output filename
    #[arg(long)]
    remix: Option<String>,

    /// List generation history and exit
    #[arg(long)]
    list: bool,

    /// Use sora-2-pro
    #[arg(long)]
    pro: bool,

    /// Duration in seconds: 4, 8 or 12
    #[arg(long)]
    seconds: Option<String>,

    /// 720x1280
    #[arg(long)]
    portrait: bool,

    /// 1280x720 (default)
    #[arg(long)]
    landscape: bool,

    /// Override the API base URL
    #[arg(long)]
    base_url: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, default_value = "")]
    api_key: String,
}

impl Cli {
    fn flags(&self) -> GenerationFlags {
        GenerationFlags {
            prompt: self.prompt.clone(),
            output: self.output.clone(),
            file: self.file.clone(),
            remix: self.remix.clone(),
            pro: self.pro,
            seconds: self.seconds.clone(),
            portrait: self.portrait,
            landscape: self.landscape,
        }
    }
}

#[tokio::main]
async fn main() {
    // Another provider being installed first is fine
    let _ = rustls::crypto::ring::default_provider().install_default();

    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        let code = match e.downcast_ref::<GenerateError>() {
            Some(err) if err.is_cancellation() => {
                eprintln!("\nInterrupted: {}", err);
                err.exit_code()
            }
            Some(err) => {
                eprintln!("\nError: {}", err);
                err.exit_code()
            }
            None => {
                eprintln!("\nError: {:#}", e);
                EXIT_FAILURE
            }
        };
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = GenerateConfig::from_env();
    debug!(?config, "Generate config");

    let history: Arc<dyn HistoryStore> = Arc::new(match &config.history_path {
        Some(path) => JsonFileStore::new(path),
        None => JsonFileStore::user_default()?,
    });

    if cli.list {
        let entries = history.load().await?;
        write_history(&entries, &mut std::io::stderr())?;
        return Ok(());
    }

    let mut flags = cli.flags();
    // Reject bad combinations and a missing key before prompting for anything
    flags.check()?;
    let api_config = client_config(&cli.api_key, cli.base_url.as_deref())?;
    if flags.prompt.trim().is_empty() {
        flags.prompt = read_prompt().await?;
    }
    let request = flags.into_request()?;

    let api = Arc::new(SoraClient::new(api_config).map_err(GenerateError::from)?);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt");
            let _ = cancel_tx.send(true);
        }
    });

    let reporter = Arc::new(StatusReporter::stderr());
    let transcoder = FfmpegTranscoder::new()
        .with_cancel(cancel_rx.clone())
        .with_timeout(config.job_timeout.as_secs());
    let notices = reporter.clone();
    let conformer = MediaConformer::new(Arc::new(transcoder))
        .with_notice(Arc::new(move |message: String| notices.line(message)));
    let lifecycle = JobLifecycle::new(api, history, conformer, config, reporter);

    let mut stdout = tokio::io::stdout();
    let outcome = lifecycle.run(&request, &mut stdout, cancel_rx).await?;
    info!(
        job_id = %outcome.job_id,
        bytes = outcome.bytes_written,
        "Generation complete"
    );
    Ok(())
}

async fn read_prompt() -> anyhow::Result<String> {
    eprint!("Enter your video prompt: ");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("failed to read prompt")?;
    Ok(line.trim().to_string())
}

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use voicechat::{
    create_router, transport, AppState, Config, DecisionOutcome, DispatchOutcome,
    PostRecordingDecision, Sender, VoiceChat,
};

#[derive(Parser)]
#[command(name = "voicechat", about = "Voice and text chat with a remote assistant")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/voicechat")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the local control API
    Serve,
    /// Send one typed message and print the reply
    Say { text: String },
    /// Record from the configured source, then transcribe or keep the file
    Record {
        /// How long to record for
        #[arg(long, default_value_t = 2.0)]
        seconds: f64,
        /// Send the recording for transcription and chat
        #[arg(long)]
        transcribe: bool,
    },
    /// Check that the assistant backend is reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Loaded config: {}", cfg.service.name);
    info!("Assistant backend: {}", cfg.backend.base_url);

    match cli.command {
        Command::Serve => serve(&cfg).await,
        Command::Say { text } => say(&cfg, &text).await,
        Command::Record {
            seconds,
            transcribe,
        } => record(&cfg, seconds, transcribe).await,
        Command::Health => {
            let status = transport::http::check_health(&cfg.backend.base_url).await?;
            println!("{}", status);
            Ok(())
        }
    }
}

async fn serve(cfg: &Config) -> Result<()> {
    let chat = Arc::new(VoiceChat::from_config(cfg)?);
    let app = create_router(AppState::new(chat));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Control API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Control API server failed")
}

async fn say(cfg: &Config, text: &str) -> Result<()> {
    let chat = VoiceChat::from_config(cfg)?;
    let outcome = chat.send_typed(text).await.context("Send task panicked")?;

    print_conversation(&chat).await;
    match outcome {
        DispatchOutcome::Replied => Ok(()),
        DispatchOutcome::Empty => bail!("Nothing to send"),
        DispatchOutcome::Busy => bail!("Another message is in flight"),
        DispatchOutcome::Failed(e) => Err(e.into()),
    }
}

async fn record(cfg: &Config, seconds: f64, transcribe: bool) -> Result<()> {
    let chat = VoiceChat::from_config(cfg)?;

    chat.start_recording().await?;
    println!("Recording for {:.1}s...", seconds);
    tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
    let artifact = chat.stop_recording().await?;
    println!(
        "Recorded {} ({} bytes)",
        artifact.uri().display(),
        artifact.size_bytes()
    );

    if !transcribe {
        return Ok(());
    }

    match chat.decide(PostRecordingDecision::Transcribe).await? {
        DecisionOutcome::Transcribed(text) => println!("Heard: {}", text),
        other => bail!("Unexpected outcome: {:?}", other),
    }
    print_conversation(&chat).await;
    Ok(())
}

async fn print_conversation(chat: &VoiceChat) {
    for message in chat.messages().await {
        let who = match message.sender {
            Sender::User => "you",
            Sender::Assistant => "assistant",
        };
        println!("{:>9}: {}", who, message.text);
    }
}

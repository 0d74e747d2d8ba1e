use avatar_session_cli::presentation::describe;
use avatar_session_cli::{CliError, LogConfig, Result};
use avatar_session_core::{AgentId, ApiConfig, ChatId};
use avatar_session_rtc::{AgentsClient, ClientConfig, SessionEvent, StreamingClient};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{info, warn};

const DEMO_TEXT: &str = "Halooo , saya silvia, agent kamu";
const DEMO_CONTINUATION: &str =
    "Kamu adalah Silvia,Customer Service AI untuk perumahan Sinarmas Land.";

/// How long to wait for warmup before streaming anyway
const READY_WAIT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "avatar-cli")]
#[command(
    version,
    about = "Avatar Session CLI - stream scripts to a talking-head avatar or chat with an agent"
)]
struct Cli {
    /// Path to api.json
    #[arg(short = 'c', long, env = "AVATAR_API_CONFIG", default_value = "api.json")]
    config: PathBuf,

    /// Debug logging
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    json: bool,

    /// Expose tokio console on 127.0.0.1:6669
    #[cfg(feature = "console")]
    #[arg(long)]
    console: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a streaming session and speak a script
    Stream {
        /// Text to speak with the Microsoft voice
        #[arg(short = 't', long)]
        text: Option<String>,

        /// Second part, spoken after a three second break
        #[arg(long, requires = "text")]
        continuation: Option<String>,

        /// Text to synthesize with ElevenLabs and stream as audio
        #[arg(short = 'a', long, conflicts_with = "text")]
        audio: Option<String>,

        /// Show streamed video right away instead of waiting for stream/ready
        #[arg(long)]
        no_warmup: bool,
    },

    /// Agents with knowledge and chat
    Agent {
        #[command(subcommand)]
        command: AgentCommands,
    },
}

#[derive(Subcommand)]
enum AgentCommands {
    /// Create a knowledge base, an agent and a chat
    Create,

    /// Connect to an agent chat; every stdin line is sent as a message
    Chat {
        #[arg(long)]
        agent_id: String,

        #[arg(long)]
        chat_id: String,

        /// Message to send right after connecting (repeatable)
        #[arg(short = 'm', long)]
        message: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_flags(cli.verbose, cli.json);
    #[cfg(feature = "console")]
    let log_config = if cli.console {
        log_config.with_console()
    } else {
        log_config
    };
    log_config.init()?;

    let api = ApiConfig::load(&cli.config)?;
    info!("Using {} service at {}", api.service, api.base_url());

    match cli.command {
        Commands::Stream {
            text,
            continuation,
            audio,
            no_warmup,
        } => {
            let config = ClientConfig::default().with_warmup(!no_warmup);
            run_stream(api, config, text, continuation, audio).await?;
        }
        Commands::Agent { command } => match command {
            AgentCommands::Create => create_agent(api).await?,
            AgentCommands::Chat {
                agent_id,
                chat_id,
                message,
            } => chat(api, agent_id, chat_id, message).await?,
        },
    }

    Ok(())
}

async fn run_stream(
    api: ApiConfig,
    config: ClientConfig,
    text: Option<String>,
    continuation: Option<String>,
    audio: Option<String>,
) -> Result<()> {
    if audio.is_some() {
        api.require_elevenlabs_key()?;
    }

    let client = StreamingClient::new(api, config);
    let mut ready_rx = client.subscribe();
    let printer = tokio::spawn(print_events(client.subscribe()));

    if let Err(e) = client.connect().await {
        printer.abort();
        return Err(e.into());
    }
    info!("✓ Connected");

    if !client.session().is_ready() {
        info!("Waiting for stream/ready...");
        if tokio::time::timeout(READY_WAIT, wait_ready(&mut ready_rx))
            .await
            .is_err()
        {
            warn!("Stream not ready after {:?}, streaming anyway", READY_WAIT);
        }
    }

    let result = match (&text, &audio) {
        (_, Some(audio)) => client.stream_audio(audio).await,
        (Some(text), None) => client.stream_text(text, continuation.as_deref()).await,
        (None, None) => {
            client
                .stream_text(DEMO_TEXT, Some(DEMO_CONTINUATION))
                .await
        }
    };

    match result {
        Ok(chunks) => info!("📤 Sent {} chunk(s)", chunks),
        Err(e) => warn!("Streaming failed: {}", e),
    }

    info!("Press Ctrl+C to exit");
    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    client.destroy().await;
    printer.abort();
    Ok(())
}

async fn create_agent(api: ApiConfig) -> Result<()> {
    let client = AgentsClient::new(api, ClientConfig::default())?;
    let printer = tokio::spawn(print_events(client.subscribe()));

    let outcome = tokio::select! {
        result = client.create_agent() => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    printer.abort();

    match outcome {
        Some(Ok((agent_id, chat_id))) => {
            info!("");
            info!("✓ Agent created. Store these ids for future chats:");
            info!("  avatar-cli agent chat --agent-id {} --chat-id {}", agent_id, chat_id);
            Ok(())
        }
        Some(Err(e)) => Err(e.into()),
        None => {
            info!("Cancelled");
            Ok(())
        }
    }
}

async fn chat(api: ApiConfig, agent_id: String, chat_id: String, messages: Vec<String>) -> Result<()> {
    if agent_id.is_empty() || chat_id.is_empty() {
        return Err(CliError::InvalidArgs(
            "agent id and chat id must not be empty, run `avatar-cli agent create` first".into(),
        ));
    }

    let client = AgentsClient::new(api, ClientConfig::default())?
        .with_agent(AgentId::new(agent_id), ChatId::new(chat_id))
        .await;
    let printer = tokio::spawn(print_events(client.subscribe()));

    if let Err(e) = client.connect().await {
        printer.abort();
        return Err(e.into());
    }
    info!("✓ Connected, type a message and press Enter (Ctrl+C to exit)");

    for message in &messages {
        send(&client, message).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => send(&client, line.trim()).await,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("");
                break;
            }
        }
    }

    info!("Shutting down...");
    client.destroy().await;
    printer.abort();
    Ok(())
}

async fn send(client: &AgentsClient, message: &str) {
    if let Err(e) = client.send_message(message).await {
        warn!("Message not sent: {}", e);
    }
}

async fn wait_ready(rx: &mut broadcast::Receiver<SessionEvent>) {
    loop {
        match rx.recv().await {
            Ok(SessionEvent::StreamReady) => return,
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

async fn print_events(mut rx: broadcast::Receiver<SessionEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => info!("{}", describe(&event)),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Skipped {} session event(s)", skipped)
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

//! Roomlink Chat CLI
//!
//! Terminal chat client: joins a room on a chat server, prints the
//! conversation, and sends whatever you type.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roomlink::{
    event_type, ApiClient, ChatMessage, Config, ConnectionState, LifecycleHooks, LoggingConfig,
    WsClient,
};

#[derive(Parser)]
#[command(name = "roomlink")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Terminal chat client for chat room servers")]
struct Cli {
    /// Room to join
    #[arg(required_unless_present = "init_config")]
    room: Option<String>,

    /// User name to join as
    #[arg(required_unless_present = "init_config")]
    user: Option<String>,

    /// Server base URL (overrides configuration)
    #[arg(long)]
    base_url: Option<String>,

    /// Path to a config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print a default config file and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.init_config {
        print!("{}", roomlink::config::generate_default_config());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(base_url) = cli.base_url {
        config.server.base_url = base_url;
    }

    init_logging(&config.logging);

    let room = cli.room.context("room is required")?;
    let user = cli.user.context("user is required")?;

    tracing::info!("Roomlink v{}", env!("CARGO_PKG_VERSION"));

    // Out-of-band room information over HTTP
    let api = ApiClient::new(&config.server);
    match api.online_count(&room).await {
        Ok(count) => println!("* {} user(s) online in {}", count, room),
        Err(e) => tracing::warn!(error = %e, "Could not fetch online count"),
    }

    let client = WsClient::new(config.ws_base_url(), &format!("/ChatRoom/{}/{}", user, room))?
        .with_hooks(
            LifecycleHooks::new()
                .on_error(|e| eprintln!("! connection error: {}", e))
                .on_close(|reason| println!("* connection closed: {}", reason)),
        );

    client.subscribe(event_type::CHAT_MESSAGE, |frame| {
        let who = frame["customName"]
            .as_str()
            .or_else(|| frame["userName"].as_str())
            .unwrap_or("?");
        println!(
            "[{}] {}: {}",
            frame["time"].as_str().unwrap_or(""),
            who,
            frame["message"].as_str().unwrap_or("")
        );
    });
    client.subscribe(event_type::USER_JOIN, |frame| {
        println!("* {} joined the room", frame["userName"].as_str().unwrap_or("?"));
    });
    client.subscribe(event_type::USER_QUIT, |frame| {
        println!("* {} left the room", frame["userName"].as_str().unwrap_or("?"));
    });
    client.subscribe(event_type::SERVER_MESSAGE, |frame| {
        println!("* server: {}", frame["message"].as_str().unwrap_or(""));
    });
    client.subscribe(event_type::CHAT_HISTORY, |frame| {
        println!("--- history ---");
        println!("{}", frame["message"].as_str().unwrap_or(""));
    });

    client.connect().await;

    // Wait for the connection to come up before reading input
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        match client.state().await {
            ConnectionState::Open => break,
            ConnectionState::Closed => anyhow::bail!("could not connect to {}", client.endpoint()),
            _ if tokio::time::Instant::now() > deadline => {
                anyhow::bail!("timed out connecting to {}", client.endpoint())
            }
            _ => tokio::time::sleep(Duration::from_millis(50)).await,
        }
    }

    println!(
        "* connected to {} as {} (Ctrl-D or /quit to leave)",
        client.endpoint(),
        user
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "/quit" {
            break;
        }
        if let Err(e) = client.send(&ChatMessage::chat(&room, &user, text)).await {
            eprintln!("! send failed: {}", e);
        }
    }

    client.close().await;
    // Give the close handshake a moment before the runtime shuts down
    tokio::time::sleep(Duration::from_millis(100)).await;

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("roomlink={}", config.level)),
    );

    if config.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

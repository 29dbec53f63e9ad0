//! CLI for ChanHub
//!
//! Subcommands:
//! - `server`: run the relay
//! - `client`: join a channel and print what arrives (useful for smoke tests)

use std::sync::Arc;

use anyhow::Context;
use chanhub::Registry;
use chanhub::config::{load_config, startup_log_level};
use chanhub::transport::ControlMessage;
use chanhub::transport::websocket::serve;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "chanhub")]
enum Command {
    /// Start the relay server
    Server,
    /// Connect, subscribe to a channel and print incoming frames
    Client {
        /// WebSocket URL including the user id
        #[arg(long, default_value = "ws://127.0.0.1:8080/ws?uid=cli")]
        url: String,
        /// Channel to join
        #[arg(long, default_value = "general")]
        channel: String,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cmd = Command::parse();

    let result = match cmd {
        Command::Server => run_server().await,
        Command::Client { url, channel } => {
            chanhub::utils::logging::init("info");
            run_client(&url, &channel).await
        }
    };

    if let Err(e) = result {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run_server() -> anyhow::Result<()> {
    let config = load_config();
    chanhub::utils::logging::init(startup_log_level(&config));
    let config = config.context("failed to load configuration")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let registry = Arc::new(Registry::with_settings(config.relay.clone()));

    tokio::select! {
        res = serve(listener, registry) => {
            res.context("server exited unexpectedly")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}

async fn run_client(url: &str, channel: &str) -> anyhow::Result<()> {
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    let (mut ws_stream, _response) = connect_async(url)
        .await
        .with_context(|| format!("failed to connect to {url}"))?;

    let subscribe = ControlMessage::Subscribe(channel.to_string()).to_json();
    ws_stream.send(WsMessage::Text(subscribe.into())).await?;
    info!("joined {channel}, waiting for messages");

    while let Some(msg) = ws_stream.next().await {
        match msg? {
            WsMessage::Text(text) => println!("{text}"),
            WsMessage::Binary(bytes) => println!("<{} binary bytes>", bytes.len()),
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    Ok(())
}

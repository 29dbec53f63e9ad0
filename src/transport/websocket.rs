//! WebSocket transport
//!
//! HTTP surface of the relay, built on axum:
//! - `GET /ws?uid=<id>` upgrades to a WebSocket and runs a session
//! - `GET /{chan}/?uid=<id>` does the same and joins `chan` right away
//! - `POST /{chan}/msg` publishes the raw request body to `chan`
//! - `GET /health` reports liveness and the number of channels
//!
//! A missing `uid` is rejected before any member is created.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::broker::{Registry, Session};
use crate::transport::connection::{Frame, FrameSink, FrameSource};
use crate::utils::{RelayError, TransportError};

pub struct WsSink(SplitSink<WebSocket, Message>);

#[async_trait]
impl FrameSink for WsSink {
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        let message = match frame {
            Frame::Text(text) => Message::Text(text.into()),
            Frame::Binary(bytes) => Message::Binary(bytes),
        };
        self.0
            .send(message)
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.0
            .close()
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }
}

pub struct WsSource(SplitStream<WebSocket>);

#[async_trait]
impl FrameSource for WsSource {
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        loop {
            let message = match self.0.next().await? {
                Ok(message) => message,
                Err(e) => return Some(Err(TransportError::Io(e.to_string()))),
            };

            match message {
                Message::Text(text) => return Some(Ok(Frame::Text(text.as_str().to_owned()))),
                Message::Binary(bytes) => return Some(Ok(Frame::Binary(bytes))),
                Message::Close(_) => return None,
                Message::Ping(_) | Message::Pong(_) => continue,
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    uid: Option<String>,
}

impl ConnectParams {
    fn user_id(self) -> Option<String> {
        self.uid.filter(|uid| !uid.is_empty())
    }
}

/// Build the relay's router around a shared registry.
pub fn router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_check))
        .route("/{chan}/", get(channel_ws_handler))
        .route("/{chan}/msg", post(publish_handler))
        .with_state(registry)
}

/// Serve the relay on an already bound listener until the server stops.
pub async fn serve(listener: TcpListener, registry: Arc<Registry>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("relay listening on http://{addr} (ws://{addr}/ws)");
    }
    axum::serve(listener, router(registry)).await
}

async fn ws_handler(
    Query(params): Query<ConnectParams>,
    State(registry): State<Arc<Registry>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    upgrade(params, registry, ws, None)
}

async fn channel_ws_handler(
    Path(chan): Path<String>,
    Query(params): Query<ConnectParams>,
    State(registry): State<Arc<Registry>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    upgrade(params, registry, ws, Some(chan))
}

fn upgrade(
    params: ConnectParams,
    registry: Arc<Registry>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    join: Option<String>,
) -> Response {
    let Some(uid) = params.user_id() else {
        return (StatusCode::BAD_REQUEST, "?uid is required").into_response();
    };
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            warn!(uid = %uid, error = %rejection, "websocket upgrade rejected");
            return rejection.into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, registry, uid, join))
}

async fn handle_socket(
    socket: WebSocket,
    registry: Arc<Registry>,
    uid: String,
    join: Option<String>,
) {
    let (sink, stream) = socket.split();
    let mut session = Session::new(registry.clone(), uid, WsSink(sink), WsSource(stream));

    if let Some(chan) = join {
        registry.subscribe(session.member(), &chan).await;
    }

    session.run().await;
}

async fn publish_handler(
    Path(chan): Path<String>,
    State(registry): State<Arc<Registry>>,
    body: Bytes,
) -> Response {
    match registry.publish(&chan, body).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(RelayError::ChannelNotFound(_)) => {
            debug!(channel = %chan, "publish to unknown channel");
            (StatusCode::NOT_FOUND, "Channel not found").into_response()
        }
    }
}

async fn health_check(State(registry): State<Arc<Registry>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "channels": registry.channel_count().await,
    }))
}

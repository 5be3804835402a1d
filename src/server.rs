// src/server.rs
use anyhow::{Context, Result};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

const ACK_PREFIX: &str = "Acknowledged: ";

pub fn router() -> Router {
    Router::new().route("/ws", get(ws_handler))
}

/// Bind `addr` and serve the echo endpoint until the process stops.
pub async fn serve(addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server running on {}", listener.local_addr()?);
    serve_on(listener).await
}

pub async fn serve_on(listener: TcpListener) -> Result<()> {
    axum::serve(listener, router())
        .await
        .context("Echo server stopped with an error")
}

async fn ws_handler(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(handle_socket)
}

async fn handle_socket(mut socket: WebSocket) {
    while let Some(frame) = socket.recv().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                warn!("WebSocket error: {}", e);
                break;
            }
        };

        let reply = match frame {
            Message::Text(text) => {
                info!("Received: {}", text);
                Message::Text(format!("{}{}", ACK_PREFIX, text))
            }
            Message::Binary(bytes) => {
                info!("Received {} binary bytes", bytes.len());
                let mut payload = ACK_PREFIX.as_bytes().to_vec();
                payload.extend_from_slice(&bytes);
                Message::Binary(payload)
            }
            Message::Close(_) => break,
            // axum answers pings itself
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        if let Err(e) = socket.send(reply).await {
            warn!("WebSocket send failed: {}", e);
            break;
        }
    }
}

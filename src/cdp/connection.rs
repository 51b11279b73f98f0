//! CDP WebSocket connection
//!
//! Command/response correlation over a single DevTools target socket. The
//! write half lives behind a mutex; a spawned reader task owns the read half
//! and routes responses to their waiting callers by command id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, warn};

use super::traits::CdpConnection;
use super::types::{CdpRequest, CdpRpcResponse};
use crate::Error;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;
type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<CdpRpcResponse>>>>;

/// Default per-command response timeout
const COMMAND_TIMEOUT_SECS: u64 = 30;

/// CDP WebSocket connection implementation
#[derive(Debug)]
pub struct CdpWebSocketConnection {
    writer: Mutex<WsSink>,
    pending: PendingMap,
    next_id: AtomicU64,
    is_active: Arc<AtomicBool>,
}

impl CdpWebSocketConnection {
    /// Connect to a DevTools target WebSocket URL
    pub async fn connect(url: &str) -> Result<Arc<Self>, Error> {
        debug!("Connecting to DevTools target {}", url);

        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| Error::websocket(format!("Failed to connect to {}: {}", url, e)))?;

        let (writer, reader) = ws.split();
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let is_active = Arc::new(AtomicBool::new(true));

        let connection = Arc::new(Self {
            writer: Mutex::new(writer),
            pending: Arc::clone(&pending),
            next_id: AtomicU64::new(1),
            is_active: Arc::clone(&is_active),
        });

        tokio::spawn(Self::read_loop(reader, pending, is_active));

        Ok(connection)
    }

    /// Route incoming frames until the socket closes
    async fn read_loop(mut reader: WsStream, pending: PendingMap, is_active: Arc<AtomicBool>) {
        while let Some(message) = reader.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    Self::dispatch(&text, &pending).await;
                }
                Ok(Message::Close(_)) => {
                    debug!("DevTools target sent close frame");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("DevTools socket error: {}", e);
                    break;
                }
            }
        }

        is_active.store(false, Ordering::SeqCst);

        // Wake every waiter so callers fail fast instead of timing out
        pending.lock().await.clear();
    }

    /// Hand a response frame to the caller waiting on its id
    async fn dispatch(text: &str, pending: &PendingMap) {
        let response: CdpRpcResponse = match serde_json::from_str(text) {
            Ok(response) => response,
            // Events and other non-response frames are not consumed here
            Err(_) => return,
        };

        let sender = pending.lock().await.remove(&response.id);
        match sender {
            Some(sender) => {
                let _ = sender.send(response);
            }
            None => debug!("Response for unknown command id {}", response.id),
        }
    }
}

#[async_trait]
impl CdpConnection for CdpWebSocketConnection {
    async fn send_command(&self, method: &str, params: serde_json::Value) -> Result<CdpRpcResponse, Error> {
        if !self.is_active.load(Ordering::SeqCst) {
            return Err(Error::websocket("Connection is not active"));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params: if params.is_null() { None } else { Some(params) },
        };

        let json = serde_json::to_string(&request)?;

        let (sender, receiver) = oneshot::channel();
        self.pending.lock().await.insert(id, sender);

        debug!("Sending CDP command {} ({})", id, method);

        let send_result = {
            let mut writer = self.writer.lock().await;
            writer.send(Message::Text(json)).await
        };

        if let Err(e) = send_result {
            self.pending.lock().await.remove(&id);
            return Err(Error::websocket(format!("Failed to send command: {}", e)));
        }

        let timeout = tokio::time::Duration::from_secs(COMMAND_TIMEOUT_SECS);
        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(response)) => {
                if let Some(error) = &response.error {
                    return Err(Error::cdp(format!(
                        "{} failed: {} (code {})",
                        method, error.message, error.code
                    )));
                }
                Ok(response)
            }
            Ok(Err(_)) => Err(Error::websocket(format!(
                "Connection closed while waiting for {} response",
                method
            ))),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                error!("CDP command {} ({}) timed out", id, method);
                Err(Error::timeout(format!("Command {} timed out", method)))
            }
        }
    }

    async fn close(&self) -> Result<(), Error> {
        self.is_active.store(false, Ordering::SeqCst);

        let mut writer = self.writer.lock().await;
        writer
            .send(Message::Close(None))
            .await
            .map_err(|e| Error::websocket(format!("Failed to close WebSocket: {}", e)))?;

        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }
}

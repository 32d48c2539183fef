use crate::error::{Result, TransportError};
use crate::protocol::{Request, Response};
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use uuid::Uuid;

/// WebSocket connection state
struct ConnectionState {
    /// Pending requests waiting for responses
    pending_requests: HashMap<Uuid, oneshot::Sender<Response>>,
    /// Channel for sending outgoing messages
    ws_tx: mpsc::UnboundedSender<Message>,
}

/// Low-level WebSocket connection to a HAL service
pub struct Connection {
    state: Arc<Mutex<ConnectionState>>,
    /// Set by the reader task once the socket is gone
    closed: Arc<AtomicBool>,
    request_timeout: Duration,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Connection {
    /// Connect to a WebSocket URL, giving up after `connect_timeout`
    pub async fn connect(
        url: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self> {
        tracing::info!("Connecting to {}", url);

        let (ws_stream, _) = timeout(connect_timeout, connect_async(url))
            .await
            .map_err(|_| TransportError::ConnectTimeout)??;
        let (mut write, mut read) = ws_stream.split();

        let (ws_tx, mut ws_rx) = mpsc::unbounded_channel::<Message>();
        let closed = Arc::new(AtomicBool::new(false));

        let state = Arc::new(Mutex::new(ConnectionState {
            pending_requests: HashMap::new(),
            ws_tx,
        }));

        // Forward outgoing messages to the WebSocket
        let writer_closed = closed.clone();
        let writer = tokio::spawn(async move {
            while let Some(msg) = ws_rx.recv().await {
                if let Err(e) = write.send(msg).await {
                    tracing::error!("Failed to send message: {}", e);
                    break;
                }
            }
            writer_closed.store(true, Ordering::SeqCst);
            let _ = write.close().await;
        });

        // Route incoming responses to their waiting requests
        let state_clone = state.clone();
        let reader_closed = closed.clone();
        let reader = tokio::spawn(async move {
            while let Some(msg_result) = read.next().await {
                match msg_result {
                    Ok(Message::Text(text)) => {
                        if let Err(e) = Self::handle_message(&state_clone, text).await {
                            tracing::error!("Error handling message: {}", e);
                        }
                    }
                    Ok(Message::Close(_)) => {
                        tracing::info!("HAL connection closed");
                        break;
                    }
                    Err(e) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }

            // Dropping the senders fails every pending request
            reader_closed.store(true, Ordering::SeqCst);
            let mut state = state_clone.lock().await;
            state.pending_requests.clear();
        });

        Ok(Self {
            state,
            closed,
            request_timeout,
            reader,
            writer,
        })
    }

    /// Handle an incoming message
    async fn handle_message(state: &Arc<Mutex<ConnectionState>>, text: String) -> Result<()> {
        tracing::debug!("Received: {}", text);

        let response: Response = serde_json::from_str(&text)?;

        let mut state = state.lock().await;
        match state.pending_requests.remove(&response.meta.id) {
            Some(tx) => {
                let _ = tx.send(response);
            }
            None => {
                tracing::warn!("Dropping response to unknown request {}", response.meta.id);
            }
        }

        Ok(())
    }

    /// Whether the socket has gone away
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Send a request and wait for the response
    pub async fn send_request(&self, request: Request) -> Result<Response> {
        if self.is_closed() {
            return Err(TransportError::ConnectionClosed);
        }

        let request_id = request.id();
        let (tx, rx) = oneshot::channel();

        // Register the pending request
        {
            let mut state = self.state.lock().await;
            // The reader sets the flag before it clears the pending map.
            if self.is_closed() {
                return Err(TransportError::ConnectionClosed);
            }
            state.pending_requests.insert(request_id, tx);

            let json = serde_json::to_string(&request)?;
            tracing::debug!("Sending: {}", json);

            if state.ws_tx.send(Message::Text(json)).is_err() {
                state.pending_requests.remove(&request_id);
                return Err(TransportError::ConnectionClosed);
            }
        }

        // Wait for response with timeout
        let response = match timeout(self.request_timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(TransportError::ConnectionClosed),
            Err(_) => {
                let mut state = self.state.lock().await;
                state.pending_requests.remove(&request_id);
                if self.is_closed() {
                    return Err(TransportError::ConnectionClosed);
                }
                return Err(TransportError::Timeout);
            }
        };

        if let Some(error) = response.first_error() {
            return Err(TransportError::ApiError {
                code: error.code,
                detail: error.detail.clone(),
            });
        }

        Ok(response)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

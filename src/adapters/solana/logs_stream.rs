//! Websocket `logsSubscribe` listener
//!
//! Streams confirmed log notifications that mention a wallet. Failed
//! transactions and repeated signatures are dropped here, so the consumer
//! sees each successful transaction once.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

const BASE_RECONNECT_DELAY: Duration = Duration::from_secs(2);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);
const SEEN_CAPACITY: usize = 2048;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Websocket connect failed: {0}")]
    ConnectError(String),
    #[error("Websocket send failed: {0}")]
    SendError(String),
    #[error("Websocket read failed: {0}")]
    ReadError(String),
}

/// One confirmed transaction mentioning the watched wallet
#[derive(Debug, Clone, PartialEq)]
pub struct LogNotification {
    pub signature: String,
    pub logs: Vec<String>,
}

/// Decoded websocket frame
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// Subscription acknowledged with this id
    Subscribed(u64),
    Notification(LogNotification),
    /// Notification for a transaction that failed on chain
    FailedTransaction(String),
    Ignored,
}

/// Bounded first-in-first-out set of already delivered signatures
#[derive(Debug, Default)]
pub struct SeenSignatures {
    order: VecDeque<String>,
    set: HashSet<String>,
    capacity: usize,
}

impl SeenSignatures {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            set: HashSet::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Returns true the first time a signature is seen
    pub fn insert(&mut self, signature: &str) -> bool {
        if self.set.contains(signature) {
            return false;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.set.remove(&oldest);
            }
        }
        self.order.push_back(signature.to_string());
        self.set.insert(signature.to_string());
        true
    }
}

/// `logsSubscribe` request for transactions mentioning `wallet`
pub fn subscribe_request(wallet: &str, commitment: &str) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "logsSubscribe",
        "params": [
            { "mentions": [wallet] },
            { "commitment": commitment }
        ]
    })
}

/// Decode a text frame from the websocket
pub fn parse_message(text: &str) -> StreamMessage {
    let msg: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return StreamMessage::Ignored,
    };

    // {"jsonrpc":"2.0","result":23784,"id":1}
    if msg.get("id").is_some() {
        return match msg.get("result").and_then(Value::as_u64) {
            Some(id) => StreamMessage::Subscribed(id),
            None => StreamMessage::Ignored,
        };
    }

    if msg.get("method").and_then(Value::as_str) != Some("logsNotification") {
        return StreamMessage::Ignored;
    }

    let Some(value) = msg.pointer("/params/result/value") else {
        return StreamMessage::Ignored;
    };
    let Some(signature) = value.get("signature").and_then(Value::as_str) else {
        return StreamMessage::Ignored;
    };

    if value.get("err").is_some_and(|err| !err.is_null()) {
        return StreamMessage::FailedTransaction(signature.to_string());
    }

    let logs = value
        .get("logs")
        .and_then(Value::as_array)
        .map(|logs| {
            logs.iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default();

    StreamMessage::Notification(LogNotification {
        signature: signature.to_string(),
        logs,
    })
}

/// Reconnecting log subscription for a single wallet
#[derive(Debug)]
pub struct LogsSubscriber {
    ws_url: String,
    wallet: String,
    commitment: String,
    seen: SeenSignatures,
}

impl LogsSubscriber {
    pub fn new(ws_url: impl Into<String>, wallet: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            wallet: wallet.into(),
            commitment: "confirmed".to_string(),
            seen: SeenSignatures::with_capacity(SEEN_CAPACITY),
        }
    }

    pub fn with_commitment(mut self, commitment: impl Into<String>) -> Self {
        self.commitment = commitment.into();
        self
    }

    /// Spawn the listener and hand back the notification channel.
    /// The task exits once the receiver is dropped.
    pub fn spawn(self, buffer: usize) -> (tokio::task::JoinHandle<()>, mpsc::Receiver<LogNotification>) {
        let (tx, rx) = mpsc::channel(buffer);
        let handle = tokio::spawn(self.run(tx));
        (handle, rx)
    }

    pub async fn run(mut self, tx: mpsc::Sender<LogNotification>) {
        let mut attempt: u32 = 0;

        while !tx.is_closed() {
            info!("Subscribing to logs for {} via {}", self.wallet, self.ws_url);

            match self.session(&tx).await {
                Ok(()) => {
                    attempt = 0;
                    warn!("Log stream for {} ended", self.wallet);
                }
                Err(e) => error!("Log stream for {}: {}", self.wallet, e),
            }

            if tx.is_closed() {
                break;
            }

            // Exponential backoff
            let delay = BASE_RECONNECT_DELAY
                .saturating_mul(2u32.saturating_pow(attempt))
                .min(MAX_RECONNECT_DELAY);
            attempt = attempt.saturating_add(1);
            info!("Reconnecting log stream in {}s (attempt {})", delay.as_secs(), attempt);
            sleep(delay).await;
        }

        debug!("Log stream consumer for {} gone, stopping", self.wallet);
    }

    /// One connection lifetime. Ok means the server closed cleanly.
    async fn session(&mut self, tx: &mpsc::Sender<LogNotification>) -> Result<(), StreamError> {
        let (ws_stream, _response) = connect_async(self.ws_url.as_str())
            .await
            .map_err(|e| StreamError::ConnectError(e.to_string()))?;

        let (mut write, mut read) = ws_stream.split();

        let request = subscribe_request(&self.wallet, &self.commitment);
        write
            .send(Message::Text(request.to_string().into()))
            .await
            .map_err(|e| StreamError::SendError(e.to_string()))?;

        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => match parse_message(text.as_ref()) {
                    StreamMessage::Subscribed(id) => {
                        info!("Log subscription {} active for {}", id, self.wallet);
                    }
                    StreamMessage::Notification(notification) => {
                        if !self.seen.insert(&notification.signature) {
                            continue;
                        }
                        if tx.send(notification).await.is_err() {
                            return Ok(());
                        }
                    }
                    StreamMessage::FailedTransaction(signature) => {
                        debug!("Skipping failed transaction {}", signature);
                    }
                    StreamMessage::Ignored => {}
                },
                Ok(Message::Ping(data)) => {
                    write
                        .send(Message::Pong(data))
                        .await
                        .map_err(|e| StreamError::SendError(e.to_string()))?;
                }
                Ok(Message::Close(_)) => {
                    warn!("Log stream: server sent close frame");
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => return Err(StreamError::ReadError(e.to_string())),
            }
        }

        Ok(())
    }
}

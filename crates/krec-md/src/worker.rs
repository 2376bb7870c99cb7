//! Connection worker: one streaming connection per subscription.
//!
//! Each [`ConnectionWorker`] runs as its own tokio task and loops forever:
//!
//! ```text
//! Connecting ──connect + subscribe──► Subscribed ──transport error──► Failed
//!     ▲                                                                │
//!     └──────────────────── fixed reconnect delay ◄────────────────────┘
//! ```
//!
//! The same subscribe request is sent after every (re)connect; there is no
//! resume position, so frames sent while disconnected are lost. The worker
//! only stops when a write to its output target fails.

use std::fmt;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use krec_core::Subscription;
use krec_core::error::{KrecError, StorageError};
use krec_core::writer::JsonlWriter;
use krec_core::ws;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::classifier;

/// Lifecycle state of a connection worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Connecting,
    /// Subscribe request sent; streaming frames.
    Subscribed,
    /// Transport failed; waiting out the reconnect delay.
    Failed,
    /// Output target failed; the worker has exited.
    Stopped,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Subscribed => write!(f, "subscribed"),
            Self::Failed => write!(f, "failed"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Why a streaming session ended.
enum SessionEnd {
    /// Connect, send, or read failed; retried after the delay.
    Transport(String),
    /// Writing a record failed; ends the worker.
    Storage(StorageError),
}

/// Owns one subscription's connection and output writer.
pub struct ConnectionWorker {
    sub: Subscription,
    url: String,
    /// Built once so every reconnect sends identical bytes.
    subscribe_msg: String,
    reconnect_delay: Duration,
    writer: JsonlWriter,
    state_tx: watch::Sender<WorkerState>,
}

impl ConnectionWorker {
    /// Create a worker (not yet running) and a receiver for its state.
    pub fn new(
        sub: Subscription,
        url: impl Into<String>,
        reconnect_delay: Duration,
        writer: JsonlWriter,
    ) -> Result<(Self, watch::Receiver<WorkerState>), KrecError> {
        let subscribe_msg = sub
            .subscribe_request()
            .map_err(|e| KrecError::Parse(format!("subscribe request for {sub}: {e}")))?;
        let (state_tx, state_rx) = watch::channel(WorkerState::Connecting);

        let worker = Self { sub, url: url.into(), subscribe_msg, reconnect_delay, writer, state_tx };
        Ok((worker, state_rx))
    }

    pub fn subscribe_msg(&self) -> &str {
        &self.subscribe_msg
    }

    /// Run until the output target fails.
    ///
    /// The writer is closed on the way out, whatever the reason.
    pub async fn run(mut self) -> Result<(), StorageError> {
        let result = self.connection_loop().await;
        self.set_state(WorkerState::Stopped);
        if let Err(e) = self.writer.close().await {
            warn!("[{}] closing writer failed: {e}", self.sub);
        }
        result
    }

    async fn connection_loop(&mut self) -> Result<(), StorageError> {
        loop {
            self.set_state(WorkerState::Connecting);

            match self.session().await {
                SessionEnd::Transport(reason) => {
                    error!("Exception for pair: {}, channelName: {} - {reason}", self.sub.pair, self.sub.channel);
                }
                SessionEnd::Storage(e) => {
                    error!("[{}] write to {} failed: {e}", self.sub, self.writer.path().display());
                    return Err(e);
                }
            }

            self.set_state(WorkerState::Failed);
            warn!(
                "Reconnecting for: {}, {} in {} seconds",
                self.sub.pair,
                self.sub.channel,
                self.reconnect_delay.as_secs_f64()
            );
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    /// One connection: connect, subscribe, stream until something breaks.
    async fn session(&mut self) -> SessionEnd {
        debug!("[{}] connecting to {}", self.sub, self.url);
        let stream = match ws::connect(&self.url).await {
            Ok(s) => s,
            Err(e) => return SessionEnd::Transport(e.to_string()),
        };
        let (mut ws_write, mut ws_read) = stream.split();

        debug!("[{}] subscribing: {}", self.sub, self.subscribe_msg);
        if let Err(e) = ws_write.send(Message::Text(self.subscribe_msg.clone().into())).await {
            return SessionEnd::Transport(format!("subscribe send failed: {e}"));
        }
        self.set_state(WorkerState::Subscribed);
        info!("[{}] connected and subscribed", self.sub);

        loop {
            match ws_read.next().await {
                Some(Ok(Message::Text(text))) => {
                    if let Err(e) = classifier::handle_frame(&self.sub, text.as_str(), &mut self.writer).await {
                        let _ = ws_write.close().await;
                        return SessionEnd::Storage(e);
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = ws_write.send(Message::Pong(data)).await {
                        return SessionEnd::Transport(format!("pong send failed: {e}"));
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame.map(|f| format!("{} {}", f.code, f.reason.as_str())).unwrap_or_default();
                    return SessionEnd::Transport(format!("connection closed by server {reason}").trim_end().to_owned());
                }
                Some(Ok(_)) => {} // Binary, Pong, Frame: ignore
                Some(Err(e)) => return SessionEnd::Transport(format!("read error: {e}")),
                None => return SessionEnd::Transport("stream ended".into()),
            }
        }
    }

    fn set_state(&self, state: WorkerState) {
        self.state_tx.send_replace(state);
    }
}

#[cfg(test)]
mod tests {
    use krec_core::Channel;

    use super::*;

    #[tokio::test]
    async fn subscribe_message_is_fixed_at_construction() {
        let dir = tempfile::tempdir().unwrap();
        let sub = Subscription::new("BTC/USD", Channel::Book, 1000);
        let writer = JsonlWriter::open(sub.output_path(dir.path())).await.unwrap();

        let (worker, state) = ConnectionWorker::new(sub, "ws://127.0.0.1:1", Duration::from_secs(5), writer).unwrap();
        assert_eq!(
            worker.subscribe_msg(),
            r#"{"event":"subscribe","subscription":{"name":"book","depth":1000},"pair":["BTC/USD"]}"#
        );
        assert_eq!(*state.borrow(), WorkerState::Connecting);
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_attempts_are_spaced_by_the_fixed_delay() {
        let dir = tempfile::tempdir().unwrap();
        let sub = Subscription::new("ETH/USD", Channel::Trade, 1000);
        let writer = JsonlWriter::open(sub.output_path(dir.path())).await.unwrap();

        // Unsupported scheme fails before any network I/O.
        let delay = Duration::from_secs(5);
        let (worker, mut state) = ConnectionWorker::new(sub, "http://invalid", delay, writer).unwrap();
        let task = tokio::spawn(worker.run());

        let mut failures = Vec::new();
        while failures.len() < 4 {
            state.changed().await.unwrap();
            if *state.borrow_and_update() == WorkerState::Failed {
                failures.push(tokio::time::Instant::now());
            }
        }

        let gaps: Vec<Duration> = failures.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(gaps, vec![delay; 3]);
        assert!(!task.is_finished());
        task.abort();
    }
}

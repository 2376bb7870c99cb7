//! Inbound frame classification and routing.
//!
//! The feed sends two shapes of JSON text frame:
//!
//! - keyed objects: control events (`systemStatus`, `subscriptionStatus`,
//!   `heartbeat`, ...), consumed into log lines
//! - arrays: market data records, persisted verbatim
//!
//! [`classify`] decides the shape once and yields a [`Frame`]. Anything else
//! (scalars, invalid JSON, objects without `event`) is [`Frame::Unrecognized`]
//! and gets logged and dropped.

use krec_core::Subscription;
use krec_core::error::StorageError;
use krec_core::writer::JsonlWriter;
use serde::Deserialize;
use serde::de::IgnoredAny;
use tracing::{debug, error, info, warn};

// ---------------------------------------------------------------------------
// Control frames
// ---------------------------------------------------------------------------

/// The `event` field of a control frame.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ControlEvent {
    SystemStatus,
    SubscriptionStatus,
    /// Any other event name (`heartbeat`, `pong`, ...).
    Other(String),
}

impl From<String> for ControlEvent {
    fn from(name: String) -> Self {
        match name.as_str() {
            "systemStatus" => Self::SystemStatus,
            "subscriptionStatus" => Self::SubscriptionStatus,
            _ => Self::Other(name),
        }
    }
}

/// A keyed control object. Only the fields that end up in logs are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct ControlFrame {
    pub event: ControlEvent,
    pub status: Option<String>,
    #[serde(rename = "errorMessage")]
    pub error_message: Option<String>,
    pub version: Option<String>,
    #[serde(rename = "connectionID")]
    pub connection_id: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Shape of one inbound text frame.
#[derive(Debug)]
pub enum Frame<'a> {
    Control(ControlFrame),
    /// A data record; borrows the original frame text.
    Data(&'a str),
    /// Neither shape; carries the reason for the log line.
    Unrecognized(String),
}

/// Classify one raw text frame.
pub fn classify(text: &str) -> Frame<'_> {
    match text.trim_start().as_bytes().first() {
        Some(b'{') => match serde_json::from_str::<ControlFrame>(text) {
            Ok(frame) => Frame::Control(frame),
            Err(e) => Frame::Unrecognized(format!("bad control frame: {e}")),
        },
        // Validate without building a tree; the record is stored as received.
        Some(b'[') => match serde_json::from_str::<IgnoredAny>(text) {
            Ok(_) => Frame::Data(text),
            Err(e) => Frame::Unrecognized(format!("bad data frame: {e}")),
        },
        Some(_) => Frame::Unrecognized("neither object nor array".into()),
        None => Frame::Unrecognized("empty frame".into()),
    }
}

/// What [`handle_frame`] did with a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Stored,
    Control(ControlEvent),
    Dropped,
}

/// Classify `text` and route it: data to `writer`, control to the log.
///
/// Only storage failures are returned; control-level errors reported by the
/// server are logged and the connection stays up.
pub async fn handle_frame(
    sub: &Subscription,
    text: &str,
    writer: &mut JsonlWriter,
) -> Result<FrameOutcome, StorageError> {
    match classify(text) {
        Frame::Data(record) => {
            writer.write_record(record).await?;
            Ok(FrameOutcome::Stored)
        }
        Frame::Control(frame) => {
            log_control(sub, &frame);
            Ok(FrameOutcome::Control(frame.event))
        }
        Frame::Unrecognized(reason) => {
            warn!("[{sub}] dropping unrecognized frame ({reason}): {}", preview(text));
            Ok(FrameOutcome::Dropped)
        }
    }
}

/// Emit the log line(s) for a control frame.
pub fn log_control(sub: &Subscription, frame: &ControlFrame) {
    let status = frame.status.as_deref().unwrap_or("-");
    match &frame.event {
        ControlEvent::SystemStatus => {
            let version = frame.version.as_deref().unwrap_or("-");
            let conn = frame.connection_id.as_ref().map(|v| v.to_string()).unwrap_or_else(|| "-".into());
            info!(
                "systemStatus: {status}, pair: {}, channelName: {} (version={version}, connectionID={conn})",
                sub.pair, sub.channel
            );
        }
        ControlEvent::SubscriptionStatus => {
            info!("subscriptionStatus: {status}, pair: {}, channelName: {}", sub.pair, sub.channel);
            if let Some(msg) = &frame.error_message {
                error!("[{sub}] subscription error: {msg}");
            }
        }
        ControlEvent::Other(name) => {
            debug!("{name}: pair: {}, channelName: {}", sub.pair, sub.channel);
        }
    }
}

/// First 200 chars of a frame, for logs.
fn preview(text: &str) -> String {
    text.chars().take(200).collect()
}

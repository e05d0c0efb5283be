//! Server-sent-event stream with auto-retry.
//!
//! Connects to a hub's `/rest/events` endpoint and streams parsed
//! protocol frames through a [`tokio::sync::mpsc`] channel. Transient
//! transport failures are retried in place at the server-advertised
//! retry interval; terminal HTTP statuses (503, 404) end the stream so
//! the owner can decide when to dial again.
//!
//! # Example
//!
//! ```rust,ignore
//! use habflow_api::sse::{EventStreamHandle, StreamConfig, StreamEvent};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let cancel = CancellationToken::new();
//! let url = Url::parse("http://hub:8080/rest/events?topics=smarthome/items/Lamp/statechanged")?;
//!
//! let mut handle = EventStreamHandle::connect(client, url, StreamConfig::default(), cancel.clone());
//!
//! while let Some(event) = handle.recv().await {
//!     match event {
//!         StreamEvent::Opened => println!("subscribed"),
//!         StreamEvent::Message(msg) => println!("{}", msg.data),
//!         other => eprintln!("{other:?}"),
//!     }
//! }
//!
//! handle.shutdown().await;
//! ```

use std::time::Duration;

use futures_util::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

// ── Event channel capacity ───────────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 256;

// ── Stream events ────────────────────────────────────────────────────

/// One parsed server-sent-event frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseMessage {
    /// Event type from the `event:` field, `"message"` when absent.
    pub event: String,

    /// Payload assembled from the frame's `data:` lines.
    pub data: String,
}

/// What the background stream task reports to its consumer.
///
/// The channel closing (`recv` returning `None`) means the task has
/// ended, either because it was cancelled or because the hub answered
/// with a terminal status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The subscription request was accepted and frames may follow.
    /// Sent once per successful connection, including reconnects.
    Opened,

    /// A protocol frame arrived.
    Message(SseMessage),

    /// The hub rejected the subscription with this HTTP status.
    Status(u16),

    /// The transport failed; the task retries after the current
    /// retry interval. Carries a short reason for the failure.
    Retrying(String),

    /// The hub answered with something that is not an event stream.
    Unknown(String),
}

// ── StreamConfig ─────────────────────────────────────────────────────

/// Retry configuration for the event stream.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Delay between transport-level retry attempts. Default: 3s.
    /// A `retry:` directive from the hub overrides this at runtime.
    pub retry_interval: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_secs(3),
        }
    }
}

// ── EventStreamHandle ────────────────────────────────────────────────

/// Handle to a running event stream task.
///
/// There is exactly one consumer per stream. Call
/// [`shutdown`](Self::shutdown) to tear the background task down and
/// wait for it to finish.
#[derive(Debug)]
pub struct EventStreamHandle {
    events: mpsc::Receiver<StreamEvent>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl EventStreamHandle {
    /// Spawn the background stream task against `url`.
    ///
    /// Returns immediately. The first connection attempt happens
    /// asynchronously -- receive from the handle to observe it.
    pub fn connect(
        client: reqwest::Client,
        url: Url,
        config: StreamConfig,
        cancel: CancellationToken,
    ) -> Self {
        let (event_tx, events) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            stream_loop(client, url, config, event_tx, task_cancel).await;
        });

        Self {
            events,
            cancel,
            task,
        }
    }

    /// Receive the next stream event.
    ///
    /// `None` means the background task has ended and no further
    /// events will arrive.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    /// Cancel the background task and wait for it to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        // Join failure here means the task panicked; nothing to salvage.
        let _ = self.task.await;
    }
}

// ── Background retry loop ────────────────────────────────────────────

/// How one connection attempt ended.
enum ReadOutcome {
    /// Cancellation token fired.
    Cancelled,

    /// The consumer dropped its receiver.
    Abandoned,

    /// Terminal HTTP status; the task must not dial again.
    GaveUp,

    /// Transient failure; retry after the current interval.
    Retry,
}

/// Main loop: connect → read frames → on transient failure, wait →
/// reconnect. Exits on cancellation, a terminal status, or a dropped
/// consumer.
async fn stream_loop(
    client: reqwest::Client,
    url: Url,
    config: StreamConfig,
    event_tx: mpsc::Sender<StreamEvent>,
    cancel: CancellationToken,
) {
    let mut retry_interval = config.retry_interval;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            outcome = connect_and_read(&client, &url, &event_tx, &mut retry_interval, &cancel) => {
                match outcome {
                    ReadOutcome::Cancelled => break,
                    ReadOutcome::Abandoned => {
                        tracing::debug!("Event stream consumer gone, stopping");
                        break;
                    }
                    ReadOutcome::GaveUp => {
                        tracing::debug!("Event stream gave up, stopping");
                        break;
                    }
                    ReadOutcome::Retry => {
                        tracing::info!(
                            delay_ms = retry_interval.as_millis() as u64,
                            "Waiting before stream retry"
                        );

                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(retry_interval) => {}
                        }
                    }
                }
            }
        }
    }

    tracing::debug!("Event stream loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one subscription, read frames until the connection drops.
async fn connect_and_read(
    client: &reqwest::Client,
    url: &Url,
    event_tx: &mpsc::Sender<StreamEvent>,
    retry_interval: &mut Duration,
    cancel: &CancellationToken,
) -> ReadOutcome {
    tracing::info!(url = %url, "Connecting to event stream");

    let result = client
        .get(url.clone())
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .header(reqwest::header::CACHE_CONTROL, "no-cache")
        .send()
        .await;

    let resp = match result {
        Ok(resp) => resp,
        Err(e) => {
            tracing::warn!(error = %e, "Event stream request failed");
            if event_tx
                .send(StreamEvent::Retrying(failure_code(&e).to_owned()))
                .await
                .is_err()
            {
                return ReadOutcome::Abandoned;
            }
            return ReadOutcome::Retry;
        }
    };

    let status = resp.status();
    if status != reqwest::StatusCode::OK {
        tracing::warn!(status = status.as_u16(), "Event stream rejected");
        if event_tx
            .send(StreamEvent::Status(status.as_u16()))
            .await
            .is_err()
        {
            return ReadOutcome::Abandoned;
        }
        if is_terminal_status(status.as_u16()) {
            return ReadOutcome::GaveUp;
        }
        return ReadOutcome::Retry;
    }

    if let Some(reason) = content_type_mismatch(&resp) {
        tracing::warn!(%reason, "Event stream response is not an event stream");
        if event_tx.send(StreamEvent::Unknown(reason)).await.is_err() {
            return ReadOutcome::Abandoned;
        }
        return ReadOutcome::Retry;
    }

    tracing::info!("Event stream open");
    if event_tx.send(StreamEvent::Opened).await.is_err() {
        return ReadOutcome::Abandoned;
    }

    let mut body = resp.bytes_stream();
    let mut parser = FrameParser::new();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return ReadOutcome::Cancelled,
            chunk = body.next() => {
                match chunk {
                    Some(Ok(bytes)) => {
                        parser.push(&bytes);

                        while let Some(message) = parser.next_message() {
                            tracing::trace!(event = %message.event, "Stream frame");
                            if event_tx.send(StreamEvent::Message(message)).await.is_err() {
                                return ReadOutcome::Abandoned;
                            }
                        }

                        if let Some(interval) = parser.take_retry() {
                            tracing::debug!(
                                retry_ms = interval.as_millis() as u64,
                                "Hub adjusted retry interval"
                            );
                            *retry_interval = interval;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Event stream interrupted");
                        if event_tx
                            .send(StreamEvent::Retrying(failure_code(&e).to_owned()))
                            .await
                            .is_err()
                        {
                            return ReadOutcome::Abandoned;
                        }
                        return ReadOutcome::Retry;
                    }
                    None => {
                        tracing::info!("Event stream ended");
                        if event_tx
                            .send(StreamEvent::Retrying("stream ended".to_owned()))
                            .await
                            .is_err()
                        {
                            return ReadOutcome::Abandoned;
                        }
                        return ReadOutcome::Retry;
                    }
                }
            }
        }
    }
}

/// 503 and 404 end the stream; the owner decides when to dial again.
fn is_terminal_status(status: u16) -> bool {
    matches!(status, 503 | 404)
}

/// Short reason string for a transport failure.
fn failure_code(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timed out"
    } else if e.is_connect() {
        "connection failed"
    } else if e.is_body() || e.is_decode() {
        "stream interrupted"
    } else {
        "request failed"
    }
}

/// `Some(reason)` when the response's content type is not an event
/// stream.
fn content_type_mismatch(resp: &reqwest::Response) -> Option<String> {
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type
        .to_ascii_lowercase()
        .starts_with("text/event-stream")
    {
        None
    } else {
        Some(format!("unexpected content type {content_type:?}"))
    }
}

// ── Frame parsing ────────────────────────────────────────────────────

/// Incremental parser for the `text/event-stream` wire format.
///
/// Feed raw body chunks with [`push`](Self::push), then drain complete
/// frames with [`next_message`](Self::next_message). Chunk boundaries
/// may fall anywhere, including inside a line or a multi-byte
/// character; only complete lines are decoded.
#[derive(Debug, Default)]
struct FrameParser {
    buf: Vec<u8>,
    data_lines: Vec<String>,
    event: Option<String>,
    retry: Option<Duration>,
}

impl FrameParser {
    fn new() -> Self {
        Self::default()
    }

    /// Append a raw body chunk.
    fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Drain the next complete frame, if a blank line has arrived.
    fn next_message(&mut self) -> Option<SseMessage> {
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            let line = String::from_utf8_lossy(&line);
            if let Some(message) = self.process_line(&line) {
                return Some(message);
            }
        }
        None
    }

    /// Take the most recent `retry:` directive, if any arrived.
    fn take_retry(&mut self) -> Option<Duration> {
        self.retry.take()
    }

    /// Process one decoded line; a blank line dispatches the frame.
    fn process_line(&mut self, line: &str) -> Option<SseMessage> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            // Comment line, commonly used as a keep-alive.
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => self.data_lines.push(value.to_owned()),
            "event" => self.event = Some(value.to_owned()),
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.retry = Some(Duration::from_millis(ms));
                }
            }
            // "id" and unknown fields are ignored; resume via
            // Last-Event-ID is not part of this protocol's use.
            _ => {}
        }
        None
    }

    /// Assemble the buffered frame. Frames with no `data:` lines
    /// produce nothing.
    fn dispatch(&mut self) -> Option<SseMessage> {
        let event = self.event.take();
        if self.data_lines.is_empty() {
            return None;
        }

        let data = self.data_lines.join("\n");
        self.data_lines.clear();

        Some(SseMessage {
            event: event.unwrap_or_else(|| "message".to_owned()),
            data,
        })
    }
}

// ── State-change decoding ────────────────────────────────────────────

/// Envelope the hub wraps every event in. The payload is a JSON
/// document encoded as a string, so decoding takes two passes.
#[derive(Debug, Deserialize)]
struct EventEnvelope {
    payload: String,
}

/// An item's state transition, decoded from a `statechanged` frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StateChange {
    /// The new state value.
    pub value: String,

    /// The state the item held before the change, if reported.
    #[serde(rename = "oldValue", default)]
    pub old_value: Option<String>,

    /// All remaining payload fields (type, oldType, ...).
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// Decode a `statechanged` frame's data into a [`StateChange`].
///
/// The hub double-encodes: the frame data is a JSON envelope whose
/// `payload` field holds another JSON document as a string.
pub fn decode_state_change(data: &str) -> Result<StateChange, Error> {
    let envelope: EventEnvelope = serde_json::from_str(data).map_err(|e| Error::Decode {
        message: format!("bad event envelope: {e}"),
        body: data.to_owned(),
    })?;

    serde_json::from_str(&envelope.payload).map_err(|e| Error::Decode {
        message: format!("bad event payload: {e}"),
        body: envelope.payload,
    })
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn drain(parser: &mut FrameParser) -> Vec<SseMessage> {
        let mut out = Vec::new();
        while let Some(message) = parser.next_message() {
            out.push(message);
        }
        out
    }

    #[test]
    fn default_stream_config() {
        let config = StreamConfig::default();
        assert_eq!(config.retry_interval, Duration::from_secs(3));
    }

    #[test]
    fn parse_single_frame() {
        let mut parser = FrameParser::new();
        parser.push(b"data: hello\n\n");

        let messages = drain(&mut parser);
        assert_eq!(
            messages,
            vec![SseMessage {
                event: "message".to_owned(),
                data: "hello".to_owned(),
            }]
        );
    }

    #[test]
    fn parse_named_event() {
        let mut parser = FrameParser::new();
        parser.push(b"event: statechanged\ndata: {\"value\":\"ON\"}\n\n");

        let messages = drain(&mut parser);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].event, "statechanged");
        assert_eq!(messages[0].data, "{\"value\":\"ON\"}");
    }

    #[test]
    fn parse_across_chunk_boundaries() {
        let mut parser = FrameParser::new();
        parser.push(b"da");
        assert!(drain(&mut parser).is_empty());
        parser.push(b"ta: hel");
        assert!(drain(&mut parser).is_empty());
        parser.push(b"lo\n\nda");
        assert_eq!(drain(&mut parser).len(), 1);
        parser.push(b"ta: again\n\n");

        let messages = drain(&mut parser);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].data, "again");
    }

    #[test]
    fn parse_crlf_lines() {
        let mut parser = FrameParser::new();
        parser.push(b"data: hello\r\n\r\n");

        let messages = drain(&mut parser);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].data, "hello");
    }

    #[test]
    fn parse_multi_line_data() {
        let mut parser = FrameParser::new();
        parser.push(b"data: first\ndata: second\n\n");

        let messages = drain(&mut parser);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].data, "first\nsecond");
    }

    #[test]
    fn comments_and_ids_do_not_dispatch() {
        let mut parser = FrameParser::new();
        parser.push(b": keep-alive\n\nid: 42\ndata: real\n\n");

        let messages = drain(&mut parser);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].data, "real");
    }

    #[test]
    fn blank_frame_produces_nothing() {
        let mut parser = FrameParser::new();
        parser.push(b"event: ping\n\n");

        assert!(drain(&mut parser).is_empty());
    }

    #[test]
    fn retry_directive_is_captured() {
        let mut parser = FrameParser::new();
        parser.push(b"retry: 250\n\n");

        assert!(drain(&mut parser).is_empty());
        assert_eq!(parser.take_retry(), Some(Duration::from_millis(250)));
        assert_eq!(parser.take_retry(), None);
    }

    #[test]
    fn malformed_retry_is_ignored() {
        let mut parser = FrameParser::new();
        parser.push(b"retry: soon\n\n");

        assert!(drain(&mut parser).is_empty());
        assert_eq!(parser.take_retry(), None);
    }

    #[test]
    fn field_without_colon_appends_empty_data() {
        let mut parser = FrameParser::new();
        parser.push(b"data\n\n");

        let messages = drain(&mut parser);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].data, "");
    }

    #[test]
    fn terminal_statuses() {
        assert!(is_terminal_status(503));
        assert!(is_terminal_status(404));
        assert!(!is_terminal_status(500));
        assert!(!is_terminal_status(200));
    }

    #[test]
    fn decode_state_change_frame() {
        let data = r#"{
            "topic": "smarthome/items/Lamp/statechanged",
            "payload": "{\"type\":\"OnOff\",\"value\":\"ON\",\"oldType\":\"OnOff\",\"oldValue\":\"OFF\"}",
            "type": "ItemStateChangedEvent"
        }"#;

        let change = decode_state_change(data).unwrap();
        assert_eq!(change.value, "ON");
        assert_eq!(change.old_value.as_deref(), Some("OFF"));
        assert_eq!(change.extra["type"], "OnOff");
    }

    #[test]
    fn decode_rejects_bad_envelope() {
        let err = decode_state_change("not json").unwrap_err();
        assert!(err.to_string().contains("bad event envelope"));
    }

    #[test]
    fn decode_rejects_bad_payload() {
        let data = r#"{"topic":"t","payload":"not json","type":"x"}"#;

        let err = decode_state_change(data).unwrap_err();
        assert!(err.to_string().contains("bad event payload"));
    }

    #[test]
    fn decode_rejects_object_payload() {
        // A payload that is an object rather than an encoded string
        // fails at the envelope layer.
        let data = r#"{"topic":"t","payload":{"value":"ON"},"type":"x"}"#;

        assert!(decode_state_change(data).is_err());
    }
}

// ── Item subscription node ──
//
// One background task per configured item: holds a live event stream
// subscription against the hub, re-seeds the current value after every
// accepted connection, and translates protocol events into flow
// messages plus status updates.
//
// Two retry layers cooperate here. The stream transport retries
// transient failures internally at its own interval; this node only
// re-dials when the transport has given up for good (terminal HTTP
// status), after a fixed delay. Invariant: at most one live stream
// handle per node, and a replacement is dialed only after the previous
// handle has been shut down.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use habflow_api::{
    EventStreamHandle, RestClient, SseMessage, StreamConfig, StreamEvent, decode_state_change,
};

use crate::config::ItemInConfig;
use crate::error::NodeError;
use crate::message::{FlowMessage, Topic};
use crate::status::StatusSignal;

const MESSAGE_CHANNEL_SIZE: usize = 64;

// ── SubscriptionState ────────────────────────────────────────────────

/// Where the subscription currently stands, observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// No accepted connection right now: dialing, inner retry, or
    /// waiting out the re-dial delay.
    Connecting,

    /// The hub accepted the subscription; the current value is being
    /// fetched.
    Open,

    /// Live: seeded once and following change events.
    Streaming,

    /// Torn down. Terminal.
    Closed,
}

// ── ItemInNode ───────────────────────────────────────────────────────

/// Handle to a running item subscription.
///
/// Constructed with [`spawn`](Self::spawn), torn down with
/// [`stop`](Self::stop). Flow messages arrive through
/// [`recv`](Self::recv); the latest status and subscription state are
/// observable through watch channels.
pub struct ItemInNode {
    item_name: String,
    messages: mpsc::Receiver<FlowMessage>,
    status: watch::Receiver<StatusSignal>,
    state: watch::Receiver<SubscriptionState>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ItemInNode {
    /// Validate the configuration and start the subscription task.
    ///
    /// The item name is trimmed; a blank name is a configuration error.
    pub fn spawn(config: ItemInConfig) -> Result<Self, NodeError> {
        let item_name = config.item_name.trim().to_owned();
        if item_name.is_empty() {
            return Err(NodeError::config("item name must not be blank"));
        }

        let rest = RestClient::new(config.descriptor.clone(), &config.transport)?;
        let stream_client = config.transport.build_stream_client()?;
        let events_url = Url::parse(&config.descriptor.events_url(&item_name))
            .map_err(habflow_api::Error::from)?;

        let (message_tx, messages) = mpsc::channel(MESSAGE_CHANNEL_SIZE);
        let (status_tx, status) = watch::channel(StatusSignal::neutral("?"));
        let (state_tx, state) = watch::channel(SubscriptionState::Connecting);
        let cancel = CancellationToken::new();

        let subscription = Subscription {
            item_name: item_name.clone(),
            rest,
            stream_client,
            events_url,
            stream_config: config.stream,
            reconnect_delay: config.reconnect_delay,
            messages: message_tx,
            status: status_tx,
            state: state_tx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(subscription.run());

        Ok(Self {
            item_name,
            messages,
            status,
            state,
            cancel,
            task,
        })
    }

    /// Name of the item this node follows.
    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    /// Receive the next flow message.
    ///
    /// `None` means the node has stopped and no further messages will
    /// arrive.
    pub async fn recv(&mut self) -> Option<FlowMessage> {
        self.messages.recv().await
    }

    /// Subscribe to status updates.
    pub fn status(&self) -> watch::Receiver<StatusSignal> {
        self.status.clone()
    }

    /// Subscribe to subscription state changes.
    pub fn state(&self) -> watch::Receiver<SubscriptionState> {
        self.state.clone()
    }

    /// Tear the subscription down and wait for the task to finish.
    ///
    /// No messages or status updates are emitted afterwards. A pending
    /// re-dial delay is cancelled rather than served.
    pub async fn stop(self) {
        self.cancel.cancel();
        // Join failure here means the task panicked; nothing to salvage.
        let _ = self.task.await;
    }
}

// ── Subscription task ────────────────────────────────────────────────

/// How one stream lifetime ended.
enum StreamOutcome {
    /// Cancelled, or the consumer dropped its receiver.
    Stopped,

    /// The transport hit a terminal status and ended the event
    /// sequence; re-dial after the configured delay.
    GaveUp,
}

struct Subscription {
    item_name: String,
    rest: RestClient,
    stream_client: reqwest::Client,
    events_url: Url,
    stream_config: StreamConfig,
    reconnect_delay: std::time::Duration,
    messages: mpsc::Sender<FlowMessage>,
    status: watch::Sender<StatusSignal>,
    state: watch::Sender<SubscriptionState>,
    cancel: CancellationToken,
}

impl Subscription {
    /// Outer loop: one stream lifetime per iteration, with the fixed
    /// re-dial delay between lifetimes.
    async fn run(self) {
        loop {
            self.set_state(SubscriptionState::Connecting);
            self.set_status(StatusSignal::neutral("?"));

            match self.run_stream().await {
                StreamOutcome::Stopped => break,
                StreamOutcome::GaveUp => {
                    info!(
                        item = %self.item_name,
                        delay_ms = self.reconnect_delay.as_millis() as u64,
                        "stream gave up, scheduling reconnect"
                    );

                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.reconnect_delay) => {}
                    }
                }
            }
        }

        self.set_state(SubscriptionState::Closed);
        debug!(item = %self.item_name, "subscription closed");
    }

    /// Drive one stream handle from dial to shutdown.
    ///
    /// Every exit path shuts the handle down before returning, so the
    /// caller may dial a replacement immediately.
    async fn run_stream(&self) -> StreamOutcome {
        let mut stream = EventStreamHandle::connect(
            self.stream_client.clone(),
            self.events_url.clone(),
            self.stream_config.clone(),
            self.cancel.child_token(),
        );

        let outcome = loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break StreamOutcome::Stopped,
                event = stream.recv() => {
                    match event {
                        Some(StreamEvent::Opened) => {
                            self.set_state(SubscriptionState::Open);
                            self.set_status(StatusSignal::neutral("?"));
                            if !self.seed_state().await {
                                break StreamOutcome::Stopped;
                            }
                        }
                        Some(StreamEvent::Message(message)) => {
                            if !self.handle_message(&message).await {
                                break StreamOutcome::Stopped;
                            }
                        }
                        Some(StreamEvent::Status(code)) => {
                            self.set_state(SubscriptionState::Connecting);
                            self.set_status(StatusSignal::error(format!(
                                "Connection Status: {code}"
                            )));
                        }
                        Some(StreamEvent::Retrying(reason)) => {
                            self.set_state(SubscriptionState::Connecting);
                            self.set_status(StatusSignal::error(format!(
                                "Connection Error: {reason}"
                            )));
                        }
                        Some(StreamEvent::Unknown(reason)) => {
                            warn!(item = %self.item_name, %reason, "unexpected stream failure");
                            self.set_state(SubscriptionState::Connecting);
                            self.set_status(StatusSignal::error("Unexpected Connection Error"));
                        }
                        None => break StreamOutcome::GaveUp,
                    }
                }
            }
        };

        stream.shutdown().await;
        outcome
    }

    /// Fetch the item's current value and emit the post-connect
    /// message. Fetch failures keep the subscription alive; the stream
    /// may still deliver.
    ///
    /// Returns `false` when the node is shutting down.
    async fn seed_state(&self) -> bool {
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return false,
            result = self.rest.get_item(&self.item_name) => result,
        };

        match result {
            Ok(item) => {
                self.set_state(SubscriptionState::Streaming);
                self.set_status(StatusSignal::for_state(&item.state));
                self.emit(Topic::State, item.state).await
            }
            Err(e) => {
                warn!(item = %self.item_name, error = %e, "state fetch failed");
                self.set_status(StatusSignal::error(e.to_string()));
                true
            }
        }
    }

    /// Decode one change event and emit it. Decode failures are
    /// reported and swallowed; the stream stays open.
    ///
    /// Returns `false` when the consumer is gone.
    async fn handle_message(&self, message: &SseMessage) -> bool {
        if message.event != "message" {
            debug!(item = %self.item_name, event = %message.event, "ignoring named event");
            return true;
        }

        match decode_state_change(&message.data) {
            Ok(change) => {
                self.set_state(SubscriptionState::Streaming);
                self.set_status(StatusSignal::for_state(&change.value));
                self.emit(Topic::StateChanged, change.value).await
            }
            Err(e) => {
                error!(item = %self.item_name, error = %e, "could not decode change event");
                self.set_status(StatusSignal::error(format!("Unexpected Error: {e}")));
                true
            }
        }
    }

    /// Inject a message into the flow. `false` means the consumer
    /// dropped its receiver.
    async fn emit(&self, topic: Topic, payload: String) -> bool {
        let message = FlowMessage::new(topic, payload, self.item_name.clone());
        self.messages.send(message).await.is_ok()
    }

    fn set_status(&self, signal: StatusSignal) {
        self.status.send_replace(signal);
    }

    fn set_state(&self, state: SubscriptionState) {
        self.state.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}

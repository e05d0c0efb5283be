// One-shot REST calls against the hub
//
// Wraps `reqwest::Client` with item-endpoint URL construction and the
// error taxonomy the node layer expects: transport failures, non-200
// responses, and malformed bodies are distinct, typed outcomes.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::descriptor::ConnectionDescriptor;
use crate::error::Error;
use crate::transport::TransportConfig;

/// One item as the hub reports it.
///
/// Only `state` is guaranteed; everything else is best-effort. Uses
/// `#[serde(flatten)]` to capture all fields beyond the core set, so
/// nothing from the hub is silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Current state value, e.g. `"ON"`, `"OFF"`, `"21.5"`.
    pub state: String,

    /// Item name (absent in some hub responses; defaults to empty).
    #[serde(default)]
    pub name: String,

    /// Human-readable label, if configured on the hub.
    #[serde(default)]
    pub label: Option<String>,

    /// Item type, e.g. `"Switch"`, `"Dimmer"`.
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,

    /// All remaining fields the hub sends (link, tags, groupNames, ...).
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// HTTP client for the hub's item REST endpoints.
///
/// Cheaply cloneable (the inner `reqwest::Client` is reference-counted).
/// All methods are one-shot request/response calls — the long-lived
/// event stream lives in [`crate::sse`].
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    descriptor: ConnectionDescriptor,
}

impl RestClient {
    /// Create a new client from a descriptor and transport config.
    pub fn new(
        descriptor: ConnectionDescriptor,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, descriptor })
    }

    /// The descriptor this client talks to.
    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    // ── Item endpoints ───────────────────────────────────────────────

    /// Fetch one item's current record: GET `{base}/rest/items/{name}`.
    pub async fn get_item(&self, name: &str) -> Result<Item, Error> {
        self.get_json(self.descriptor.item_url(name)).await
    }

    /// Fetch the hub's item directory: GET `{base}/rest/items`.
    pub async fn list_items(&self) -> Result<Vec<Item>, Error> {
        self.get_json(self.descriptor.items_url()).await
    }

    /// Send a command to an item: POST `{base}/rest/items/{name}` with
    /// the command string as a plain-text body.
    pub async fn send_command(&self, name: &str, command: &str) -> Result<(), Error> {
        let url = self.descriptor.item_url(name);
        debug!("POST {url}");

        let resp = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(command.to_owned())
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Protocol {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode a JSON body, mapping failures to
    /// the typed taxonomy.
    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, Error> {
        debug!("GET {url}");

        let resp = self.http.get(&url).send().await?;

        let status = resp.status();
        let body = resp.text().await?;

        if status != StatusCode::OK {
            return Err(Error::Protocol {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Decode {
            message: e.to_string(),
            body,
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────

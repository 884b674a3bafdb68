//! Delivery of serialized public keys to a counterparty.
//!
//! [`KeyTransport`] is the seam between the exchange and the outside world.
//! [`LoopbackTransport`] keeps deliveries in memory for in-process runs and
//! tests; [`ResendTransport`] sends the key as an email attachment through
//! the Resend REST API.

use crate::error::TransportError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use keypost_core::TransportConfig;
use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// File name of the attached key.
pub const ATTACHMENT_NAME: &str = "public-key.txt";

const EMAIL_BODY: &str = "<p>Olá, essa é sua chave publica para troca de mensagens</p>";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Carries a payload to a list of recipient addresses.
pub trait KeyTransport {
    fn send(&self, recipients: &[String], payload: &[u8]) -> Result<(), TransportError>;
}

impl<T: KeyTransport + ?Sized> KeyTransport for Box<T> {
    fn send(&self, recipients: &[String], payload: &[u8]) -> Result<(), TransportError> {
        (**self).send(recipients, payload)
    }
}

impl<T: KeyTransport + ?Sized> KeyTransport for &T {
    fn send(&self, recipients: &[String], payload: &[u8]) -> Result<(), TransportError> {
        (**self).send(recipients, payload)
    }
}

/// A payload handed to [`LoopbackTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub recipients: Vec<String>,
    pub payload: Vec<u8>,
}

impl Delivery {
    pub fn payload_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

/// In-memory transport that records every delivery.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    deliveries: Mutex<Vec<Delivery>>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.lock().clone()
    }

    pub fn last_delivery(&self) -> Option<Delivery> {
        self.lock().last().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Delivery>> {
        // A panic while holding the lock leaves the log intact
        self.deliveries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyTransport for LoopbackTransport {
    fn send(&self, recipients: &[String], payload: &[u8]) -> Result<(), TransportError> {
        if recipients.is_empty() {
            return Err(TransportError::NoRecipients);
        }

        self.lock().push(Delivery {
            recipients: recipients.to_vec(),
            payload: payload.to_vec(),
        });
        debug!(recipients = recipients.len(), bytes = payload.len(), "Loopback delivery");
        Ok(())
    }
}

#[derive(Serialize)]
struct Attachment<'a> {
    content: String,
    filename: &'a str,
}

#[derive(Serialize)]
struct EmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
    attachments: Vec<Attachment<'a>>,
}

/// Email delivery through the Resend REST API.
pub struct ResendTransport {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    sender: String,
    subject: String,
}

impl ResendTransport {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        sender: impl Into<String>,
        subject: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            sender: sender.into(),
            subject: subject.into(),
        })
    }

    /// Build from configuration; `None` when no API key is set.
    pub fn from_config(config: &TransportConfig) -> Result<Option<Self>, TransportError> {
        match config.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(Some(Self::new(
                key,
                config.endpoint.as_str(),
                config.sender.as_str(),
                config.subject.as_str(),
            )?)),
            _ => Ok(None),
        }
    }

    fn request_body<'a>(&'a self, recipients: &'a [String], payload: &[u8]) -> EmailRequest<'a> {
        EmailRequest {
            from: &self.sender,
            to: recipients,
            subject: &self.subject,
            html: EMAIL_BODY,
            attachments: vec![Attachment {
                content: BASE64.encode(payload),
                filename: ATTACHMENT_NAME,
            }],
        }
    }
}

impl fmt::Debug for ResendTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResendTransport")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("sender", &self.sender)
            .field("subject", &self.subject)
            .finish()
    }
}

impl KeyTransport for ResendTransport {
    fn send(&self, recipients: &[String], payload: &[u8]) -> Result<(), TransportError> {
        if recipients.is_empty() {
            return Err(TransportError::NoRecipients);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(recipients, payload))
            .send()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(status = status.as_u16(), "Email delivery rejected");
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let id = response
            .json::<serde_json::Value>()
            .ok()
            .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(str::to_string));
        info!(recipients = recipients.len(), id = ?id, "Email successfully sent");
        Ok(())
    }
}

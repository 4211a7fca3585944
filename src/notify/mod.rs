// src/notify/mod.rs
//! Alert delivery: render an `AlertEvent` and hand it to a message transport.

pub mod email;
pub mod log_only;

use crate::analyze::AlertEvent;
use crate::error::DeliveryError;

pub use email::EmailTransport;
pub use log_only::LogTransport;

/// A rendered message, ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub subject: String,
    pub body: String,
}

impl OutboundMessage {
    pub fn render(ev: &AlertEvent) -> Self {
        Self {
            subject: ev.subject.clone(),
            body: ev.body.clone(),
        }
    }
}

#[async_trait::async_trait]
pub trait MessageTransport: Send + Sync {
    /// Send one message to all `recipients`.
    async fn deliver(&self, msg: &OutboundMessage, recipients: &[String])
        -> Result<(), DeliveryError>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub delivered: usize,
    pub failed: usize,
}

/// Sends each alert separately to a fixed recipient list. One failed send
/// never stops the rest.
pub struct Dispatcher {
    transport: Box<dyn MessageTransport>,
    recipients: Vec<String>,
}

impl Dispatcher {
    pub fn new(transport: Box<dyn MessageTransport>, recipients: Vec<String>) -> Self {
        Self {
            transport,
            recipients,
        }
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Deliver one event. Failures are logged and reported as `false`.
    pub async fn notify(&self, ev: &AlertEvent, recipients: &[String]) -> bool {
        let msg = OutboundMessage::render(ev);
        let res = if recipients.is_empty() {
            Err(DeliveryError::NoRecipients)
        } else {
            self.transport.deliver(&msg, recipients).await
        };

        match res {
            Ok(()) => {
                metrics::counter!("notifications_sent_total", "transport" => self.transport.name())
                    .increment(1);
                tracing::info!(
                    transport = self.transport.name(),
                    source = %ev.source_id,
                    severity = ev.severity.as_str(),
                    subject = %ev.subject,
                    recipients = recipients.len(),
                    "alert delivered"
                );
                true
            }
            Err(e) => {
                metrics::counter!("notifications_failed_total", "transport" => self.transport.name())
                    .increment(1);
                tracing::warn!(
                    transport = self.transport.name(),
                    source = %ev.source_id,
                    subject = %ev.subject,
                    error = %e,
                    "alert delivery failed"
                );
                false
            }
        }
    }

    /// Deliver every event, in order, to the configured recipients.
    pub async fn notify_all(&self, events: &[AlertEvent]) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        for ev in events {
            if self.notify(ev, &self.recipients).await {
                summary.delivered += 1;
            } else {
                summary.failed += 1;
            }
        }
        summary
    }
}

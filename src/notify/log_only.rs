use super::{MessageTransport, OutboundMessage};
use crate::error::DeliveryError;

/// Logs alerts instead of sending them. Used when no SMTP relay is configured.
#[derive(Debug, Clone, Default)]
pub struct LogTransport;

#[async_trait::async_trait]
impl MessageTransport for LogTransport {
    async fn deliver(
        &self,
        msg: &OutboundMessage,
        recipients: &[String],
    ) -> Result<(), DeliveryError> {
        tracing::info!(
            target: "alerts",
            subject = %msg.subject,
            body = %msg.body,
            recipients = ?recipients,
            "alert (log transport)"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

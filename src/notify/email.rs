use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{MessageTransport, OutboundMessage};
use crate::error::DeliveryError;

/// SMTP relay transport (STARTTLS; port 465 switches to implicit TLS).
pub struct EmailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailTransport {
    pub fn new(
        host: &str,
        port: u16,
        from: &str,
        credentials: Option<(String, String)>,
    ) -> Result<Self, DeliveryError> {
        let from: Mailbox = from
            .parse()
            .map_err(|_| DeliveryError::Address(from.to_string()))?;

        let builder = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        }
        .map_err(|e| DeliveryError::Smtp(e.to_string()))?
        .port(port);

        let builder = match credentials {
            Some((user, pass)) => builder.credentials(Credentials::new(user, pass)),
            None => builder,
        };

        Ok(Self {
            mailer: builder.build(),
            from,
        })
    }
}

#[async_trait::async_trait]
impl MessageTransport for EmailTransport {
    async fn deliver(
        &self,
        msg: &OutboundMessage,
        recipients: &[String],
    ) -> Result<(), DeliveryError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(msg.subject.clone())
            .header(header::ContentType::TEXT_PLAIN);
        for r in recipients {
            let to: Mailbox = r.parse().map_err(|_| DeliveryError::Address(r.clone()))?;
            builder = builder.to(to);
        }

        let email = builder
            .body(msg.body.clone())
            .map_err(|e| DeliveryError::Build(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| DeliveryError::Smtp(e.to_string()))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}

use super::{Alert, AlertSink};
use crate::api::retry::{retry, RetryPolicy};
use crate::config::EmailConfig;
use crate::error::{KrakenWatchError, Result};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use log::info;

/// Delivers alerts through an SMTP relay.
pub struct EmailSink {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
    relay: String,
    retry: RetryPolicy,
}

impl EmailSink {
    pub fn new(config: &EmailConfig, retry: RetryPolicy) -> Result<Self> {
        let from = parse_mailbox("EMAIL_FROM", &config.from)?;
        let to = parse_mailbox("EMAIL_TO", &config.to)?;

        // Plain relays on port 25 take unauthenticated, unencrypted mail.
        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.smtp_host.as_str())
        };
        let mut builder = builder.port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            to,
            relay: format!("{}:{}", config.smtp_host, config.smtp_port),
            retry,
        })
    }

    fn message(&self, alert: &Alert) -> Result<Message> {
        build_message(&self.from, &self.to, alert)
    }
}

fn parse_mailbox(key: &str, raw: &str) -> Result<Mailbox> {
    raw.parse::<Mailbox>()
        .map_err(|e| KrakenWatchError::ConfigError {
            key: key.to_string(),
            reason: format!("'{}': {}", raw, e),
        })
}

pub(crate) fn build_message(from: &Mailbox, to: &Mailbox, alert: &Alert) -> Result<Message> {
    Message::builder()
        .from(from.clone())
        .to(to.clone())
        .subject(alert.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(alert.body.clone())
        .map_err(|e| KrakenWatchError::EmailError(e.to_string()))
}

#[async_trait]
impl AlertSink for EmailSink {
    async fn send(&self, alert: &Alert) -> Result<()> {
        let message = self.message(alert)?;
        retry(&self.retry, "smtp send", || async {
            self.transport
                .send(message.clone())
                .await
                .map(|_| ())
                .map_err(KrakenWatchError::from)
        })
        .await?;
        info!("Sent '{}' to {} via {}", alert.subject, self.to, self.relay);
        Ok(())
    }
}

//! Mail transport seam.
//!
//! The dispatch loop only needs one operation per recipient, `send`, which
//! either returns a receipt or fails. Two implementations exist:
//!
//! - `SmtpTransport`: lettre's `AsyncSmtpTransport` on tokio.
//! - `LogTransport`: accepts every message and only logs it, selected with
//!   `KAMPAIGN_DRY_RUN=true`.

use crate::campaign::attachments::ResolvedAttachment;
use crate::config::{AppConfig, ConfigError, SmtpSettings};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::{debug, info, warn};
use std::sync::Arc;
use thiserror::Error;

/// A fully rendered message for one recipient.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<ResolvedAttachment>,
}

/// What the transport reported for an accepted message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    /// Addresses the server refused even though the call itself succeeded.
    pub rejected: Vec<String>,
    /// First line of the server reply, when there is one.
    pub reply: Option<String>,
}

impl SendReceipt {
    pub fn rejects(&self, recipient: &str) -> bool {
        let recipient = recipient.trim();
        self.rejected
            .iter()
            .any(|address| address.trim().eq_ignore_ascii_case(recipient))
    }

    pub fn rejection_reason(&self) -> String {
        match &self.reply {
            Some(reply) => format!("recipient rejected by transport: {}", reply),
            None => "recipient rejected by transport".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("failed to build message: {0}")]
    Message(String),
    #[error("SMTP delivery failed: {0}")]
    Smtp(String),
    #[error("SMTP server refused the connection check")]
    Unreachable,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &OutgoingMessage) -> Result<SendReceipt, TransportError>;

    /// Checks that the server is reachable and accepts our credentials.
    async fn verify(&self) -> Result<(), TransportError>;
}

/// Builds the transport selected by configuration, or `None` when mail
/// delivery is not configured.
pub fn from_config(config: &AppConfig) -> Result<Option<Arc<dyn MailTransport>>, ConfigError> {
    if config.dry_run {
        info!("Dry run enabled: campaign messages will be logged, not sent");
        return Ok(Some(Arc::new(LogTransport)));
    }
    match &config.smtp {
        Some(settings) => {
            info!("Using SMTP server {}:{}", settings.host, settings.port);
            Ok(Some(Arc::new(SmtpTransport::new(settings)?)))
        }
        None => {
            warn!("SMTP is not configured; campaign sends will be refused");
            Ok(None)
        }
    }
}

pub struct SmtpTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    pub fn new(settings: &SmtpSettings) -> Result<Self, ConfigError> {
        let tls_parameters = TlsParameters::new(settings.host.clone())
            .map_err(|e| ConfigError::Smtp(format!("TLS configuration error: {}", e)))?;
        let tls = if settings.secure {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Opportunistic(tls_parameters)
        };

        let inner = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
            .port(settings.port)
            .tls(tls)
            .credentials(Credentials::new(
                settings.user.clone(),
                settings.password.clone(),
            ))
            .build();

        Ok(Self { inner })
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, message: &OutgoingMessage) -> Result<SendReceipt, TransportError> {
        let email = build_message(message)?;
        let response = self
            .inner
            .send(email)
            .await
            .map_err(|e| TransportError::Smtp(e.to_string()))?;

        debug!("SMTP accepted message for {}: {:?}", message.to, response.code());
        Ok(SendReceipt {
            rejected: Vec::new(),
            reply: response.first_line().map(str::to_string),
        })
    }

    async fn verify(&self) -> Result<(), TransportError> {
        match self.inner.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(TransportError::Unreachable),
            Err(e) => Err(TransportError::Smtp(e.to_string())),
        }
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, TransportError> {
    address
        .parse()
        .map_err(|e: lettre::address::AddressError| TransportError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

/// One HTML part followed by one part per attachment.
fn build_message(message: &OutgoingMessage) -> Result<Message, TransportError> {
    let mut body = MultiPart::mixed().singlepart(SinglePart::html(message.html.clone()));
    for attachment in &message.attachments {
        let mime = mime_guess::from_path(&attachment.filename).first_or_octet_stream();
        let content_type = ContentType::parse(mime.as_ref())
            .map_err(|e| TransportError::Message(e.to_string()))?;
        body = body.singlepart(
            Attachment::new(attachment.filename.clone())
                .body(attachment.content.clone(), content_type),
        );
    }

    Message::builder()
        .from(parse_mailbox(&message.from)?)
        .to(parse_mailbox(&message.to)?)
        .subject(message.subject.clone())
        .multipart(body)
        .map_err(|e| TransportError::Message(e.to_string()))
}

/// Dry-run transport: logs what would have been sent and reports success.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, message: &OutgoingMessage) -> Result<SendReceipt, TransportError> {
        let names: Vec<&str> = message
            .attachments
            .iter()
            .map(|a| a.filename.as_str())
            .collect();
        info!(
            "Dry run: to={} subject={:?} attachments={:?}",
            message.to, message.subject, names
        );
        debug!("Dry run body for {}: {}", message.to, message.html);
        Ok(SendReceipt::default())
    }

    async fn verify(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(to: &str) -> OutgoingMessage {
        OutgoingMessage {
            from: "Kampaign <news@example.com>".to_string(),
            to: to.to_string(),
            subject: "Launch".to_string(),
            html: "<p>Hello</p>".to_string(),
            attachments: vec![ResolvedAttachment {
                filename: "invoice_42.pdf".to_string(),
                content: b"%PDF-1.7".to_vec(),
            }],
        }
    }

    #[test]
    fn builds_multipart_message_with_attachment() {
        let email = build_message(&message("alice@example.com")).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();

        assert!(raw.contains("To: alice@example.com"));
        assert!(raw.contains("Subject: Launch"));
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("text/html"));
        assert!(raw.contains("application/pdf"));
        assert!(raw.contains("invoice_42.pdf"));
    }

    #[test]
    fn invalid_recipient_is_a_transport_error() {
        let err = build_message(&message("not an address")).unwrap_err();

        assert!(matches!(err, TransportError::InvalidAddress { .. }));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn receipt_rejection_matches_case_insensitively() {
        let receipt = SendReceipt {
            rejected: vec!["Bob@Example.com".to_string()],
            reply: Some("550 mailbox unavailable".to_string()),
        };

        assert!(receipt.rejects("bob@example.com"));
        assert!(!receipt.rejects("alice@example.com"));
        assert_eq!(
            receipt.rejection_reason(),
            "recipient rejected by transport: 550 mailbox unavailable"
        );
    }

    #[tokio::test]
    async fn log_transport_accepts_everything() {
        let receipt = LogTransport.send(&message("alice@example.com")).await.unwrap();

        assert_eq!(receipt, SendReceipt::default());
        assert!(LogTransport.verify().await.is_ok());
    }

    #[test]
    fn dry_run_takes_precedence_over_missing_smtp() {
        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            db_path: "kampaign.sqlite".into(),
            log_root: "logs/campaigns".into(),
            dry_run: true,
            from: None,
            smtp: None,
        };
        assert!(from_config(&config).unwrap().is_some());

        let unconfigured = AppConfig {
            dry_run: false,
            ..config
        };
        assert!(from_config(&unconfigured).unwrap().is_none());
    }

    #[test]
    fn trait_objects_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<SmtpTransport>();
        assert_send_sync::<dyn MailTransport>();
    }
}

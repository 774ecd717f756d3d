//! # Invoice Mailer
//!
//! Sends comprobante PDFs by email.
//!
//! ```text
//! POST /api/ventas/{id}/enviar-comprobante
//!        │
//!        ▼
//! render PDF ──► InvoiceMailer::send
//!                   ├── SmtpMailer      (lettre, async tokio transport)
//!                   └── DisabledMailer  (SMTP not configured → 503)
//! ```

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::SmtpSettings;

/// An email carrying a comprobante.
#[derive(Debug, Clone)]
pub struct InvoiceEmail {
    pub to: String,
    pub numero_venta: String,
    pub pdf: Vec<u8>,
}

impl InvoiceEmail {
    pub fn subject(&self) -> String {
        format!("Comprobante de Venta N° {}", self.numero_venta)
    }

    pub fn filename(&self) -> String {
        format!("comprobante-{}.pdf", self.numero_venta)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail is not configured")]
    Disabled,

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait InvoiceMailer: Send + Sync {
    async fn send(&self, email: InvoiceEmail) -> Result<(), MailError>;

    fn is_enabled(&self) -> bool {
        true
    }
}

// =============================================================================
// SMTP
// =============================================================================

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Builds the transport. No connection is made until the first send.
    pub fn new(settings: &SmtpSettings) -> Result<Self, MailError> {
        let builder = if settings.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
        }
        .map_err(|e| MailError::Transport(e.to_string()))?;

        let transport = builder
            .port(settings.port)
            .credentials(Credentials::new(settings.user.clone(), settings.pass.clone()))
            .build();

        let from = parse_mailbox(&settings.from)?;

        Ok(SmtpMailer { transport, from })
    }

    fn message(&self, email: &InvoiceEmail) -> Result<Message, MailError> {
        let to = parse_mailbox(&email.to)?;
        let pdf = ContentType::parse("application/pdf").map_err(|e| MailError::Build(e.to_string()))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject())
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(
                        "Adjunto se encuentra su comprobante de venta.".to_string(),
                    ))
                    .singlepart(Attachment::new(email.filename()).body(email.pdf.clone(), pdf)),
            )
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl InvoiceMailer for SmtpMailer {
    async fn send(&self, email: InvoiceEmail) -> Result<(), MailError> {
        let message = self.message(&email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        info!(to = %email.to, numero_venta = %email.numero_venta, "Comprobante emailed");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|e: lettre::address::AddressError| MailError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

// =============================================================================
// Disabled
// =============================================================================

/// Used when SMTP is not configured.
pub struct DisabledMailer;

#[async_trait]
impl InvoiceMailer for DisabledMailer {
    async fn send(&self, _email: InvoiceEmail) -> Result<(), MailError> {
        Err(MailError::Disabled)
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SmtpSettings {
        SmtpSettings {
            host: "smtp.cajas.pe".to_string(),
            port: 587,
            secure: false,
            user: "ventas@cajas.pe".to_string(),
            pass: "secreto".to_string(),
            from: "Ferreteria Ejemplo <ventas@cajas.pe>".to_string(),
        }
    }

    fn email() -> InvoiceEmail {
        InvoiceEmail {
            to: "cliente@correo.pe".to_string(),
            numero_venta: "V-1760540000000".to_string(),
            pdf: b"%PDF-1.4".to_vec(),
        }
    }

    #[test]
    fn test_subject_and_filename() {
        let email = email();
        assert_eq!(email.subject(), "Comprobante de Venta N° V-1760540000000");
        assert_eq!(email.filename(), "comprobante-V-1760540000000.pdf");
    }

    #[tokio::test]
    async fn test_message_has_pdf_attachment() {
        let mailer = SmtpMailer::new(&settings()).unwrap();
        let message = mailer.message(&email()).unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();

        assert!(raw.contains("application/pdf"));
        assert!(raw.contains("comprobante-V-1760540000000.pdf"));
    }

    #[tokio::test]
    async fn test_invalid_recipient() {
        let mailer = SmtpMailer::new(&settings()).unwrap();
        let mut email = email();
        email.to = "no es un correo".to_string();
        assert!(matches!(mailer.message(&email), Err(MailError::InvalidAddress { .. })));
    }

    #[tokio::test]
    async fn test_disabled_mailer() {
        let mailer = DisabledMailer;
        assert!(!mailer.is_enabled());
        assert!(matches!(mailer.send(email()).await, Err(MailError::Disabled)));
    }
}

// ============================================================================
// BizDesk Infrastructure - SMTP Mailer
// File: crates/bizdesk-infrastructure/src/gateways/smtp.rs
// ============================================================================

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use bizdesk_core::error::DomainError;
use bizdesk_core::gateways::Mailer;
use bizdesk_shared::config::MailSettings;

const SERVICE: &str = "smtp";

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Builds a STARTTLS transport; plain SMTP on port 25 or with an empty
    /// username (local relays).
    pub fn new(settings: &MailSettings) -> Result<Self, DomainError> {
        let from: Mailbox = settings
            .from_address
            .parse()
            .map_err(|e| DomainError::Validation(format!("invalid mail.from_address: {}", e)))?;

        let transport = if settings.username.is_empty() || settings.smtp_port == 25 {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.smtp_host)
                .port(settings.smtp_port)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)
                .map_err(|e| DomainError::external(SERVICE, e.to_string()))?
                .port(settings.smtp_port)
                .credentials(Credentials::new(settings.username.clone(), settings.password.clone()))
                .build()
        };

        Ok(Self { transport, from })
    }
}

fn build_message(from: &Mailbox, to: &str, subject: &str, body: &str) -> Result<Message, DomainError> {
    let to: Mailbox = to
        .parse()
        .map_err(|e| DomainError::Validation(format!("invalid recipient address: {}", e)))?;
    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| DomainError::InternalError(format!("failed to build e-mail: {}", e)))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DomainError> {
        let message = build_message(&self.from, to, subject, body)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| DomainError::external(SERVICE, e.to_string()))?;
        info!(to = %bizdesk_shared::utils::mask_email(to), "E-mail sent");
        Ok(())
    }
}

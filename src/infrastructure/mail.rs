use crate::config::{EmailSettings, SmtpSettings};
use crate::domain::notification::OutgoingMessage;
use crate::domain::ports::Notifier;
use crate::error::{DispatchError, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MailAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{
    Address, AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;
use std::path::{Path, PathBuf};

enum Transport {
    Smtp {
        relay: String,
        transport: AsyncSmtpTransport<Tokio1Executor>,
    },
    Outbox {
        dir: PathBuf,
        transport: AsyncFileTransport<Tokio1Executor>,
    },
}

/// Email notifier built on `lettre`.
///
/// Delivers over an authenticated STARTTLS relay, or stores each message as an
/// `.eml` file in an outbox directory.
///
/// The returned transcript is a summary, not a raw SMTP session log: lettre's
/// async transport does not expose the command/reply exchange per message. For
/// SMTP it lists the relay, the envelope addresses and the server's final reply
/// code and text; for the outbox it names the stored `.eml` file.
pub struct MailNotifier {
    from: Mailbox,
    transport: Transport,
}

impl MailNotifier {
    pub fn smtp(smtp: &SmtpSettings, email: &EmailSettings) -> Result<Self> {
        let credentials = Credentials::new(smtp.user.clone(), smtp.api_key.expose_secret().clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            .map_err(|e| DispatchError::Delivery(format!("Failed to create SMTP relay: {e}")))?
            .port(smtp.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            from: sender(email, &smtp.user)?,
            transport: Transport::Smtp {
                relay: format!("{}:{}", smtp.host, smtp.port),
                transport,
            },
        })
    }

    pub fn outbox<P: AsRef<Path>>(dir: P, email: &EmailSettings) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        let fallback = email.from_address.clone();

        Ok(Self {
            from: sender(email, &fallback)?,
            transport: Transport::Outbox {
                transport: AsyncFileTransport::<Tokio1Executor>::new(&dir),
                dir,
            },
        })
    }

    fn build_message(&self, message: &OutgoingMessage) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(message.subject.clone());
        for to in &message.destinations {
            let mailbox: Mailbox = to.parse().map_err(|e| {
                DispatchError::Delivery(format!("Invalid recipient '{to}': {e}"))
            })?;
            builder = builder.to(mailbox);
        }

        let mut body = MultiPart::mixed().singlepart(SinglePart::plain(message.body.clone()));
        for attachment in &message.attachments {
            let content_type = ContentType::parse(attachment.content_type()).map_err(|e| {
                DispatchError::Delivery(format!(
                    "Invalid content type for {}: {e}",
                    attachment.file_name
                ))
            })?;
            body = body.singlepart(
                MailAttachment::new(attachment.file_name.clone())
                    .body(attachment.data.clone(), content_type),
            );
        }

        builder
            .multipart(body)
            .map_err(|e| DispatchError::Delivery(format!("Failed to build message: {e}")))
    }
}

fn sender(email: &EmailSettings, address: &str) -> Result<Mailbox> {
    let address: Address = address
        .parse()
        .map_err(|e| DispatchError::Delivery(format!("Invalid sender address '{address}': {e}")))?;
    Ok(Mailbox::new(Some(email.from_name.clone()), address))
}

/// Summary of an accepted SMTP submission: relay, envelope and final reply.
fn smtp_transcript(relay: &str, from: &Address, destinations: &[String], reply: &str) -> String {
    format!(
        "Relay: {relay}\nFrom: {from}\nRcpt: {}\nReply: {reply}",
        destinations.join(", ")
    )
}

#[async_trait]
impl Notifier for MailNotifier {
    async fn send(&self, message: &OutgoingMessage) -> Result<String> {
        if message.destinations.is_empty() {
            return Err(DispatchError::Delivery(
                "Message has no destinations".to_string(),
            ));
        }
        let mail = self.build_message(message)?;

        match &self.transport {
            Transport::Smtp { relay, transport } => {
                let response = transport
                    .send(mail)
                    .await
                    .map_err(|e| DispatchError::Delivery(format!("SMTP send failed: {e}")))?;
                let reply: Vec<&str> = response.message().collect();
                let reply = format!("{} {}", response.code(), reply.join(" "));
                Ok(smtp_transcript(
                    relay,
                    &self.from.email,
                    &message.destinations,
                    &reply,
                ))
            }
            Transport::Outbox { dir, transport } => {
                let id = transport
                    .send(mail)
                    .await
                    .map_err(|e| DispatchError::Delivery(format!("Outbox write failed: {e}")))?;
                Ok(format!(
                    "Stored as {}\nFrom: {}\nRcpt: {}",
                    dir.join(format!("{id}.eml")).display(),
                    self.from.email,
                    message.destinations.join(", ")
                ))
            }
        }
    }
}

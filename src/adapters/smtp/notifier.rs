use crate::config::EmailConfig;
use crate::domain::value_objects::ContactAddress;
use crate::ports::notifier::{Notifier as NotifierTrait, Result};
use async_trait::async_trait;
use lettre::{
    Message, SmtpTransport, Transport,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

/// SMTPでメールを送信するNotifier
///
/// lettreの同期トランスポートを使い、送信はブロッキングスレッドで行う。
pub struct SmtpNotifier {
    mailer: SmtpTransport,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let from_name = config.smtp_from_name.as_deref().unwrap_or("Library");
        let from: Mailbox = format!("{} <{}>", from_name, config.smtp_from).parse()?;

        let builder = if config.smtp_use_tls {
            // Use STARTTLS for secure connection
            SmtpTransport::starttls_relay(&config.smtp_host)?
        } else {
            SmtpTransport::builder_dangerous(&config.smtp_host)
        }
        .port(config.smtp_port);

        let builder = match (&config.smtp_username, &config.smtp_password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        Ok(Self {
            mailer: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl NotifierTrait for SmtpNotifier {
    async fn send(&self, recipient: &ContactAddress, subject: &str, body: &str) -> Result<()> {
        let to: Mailbox = recipient.as_str().parse()?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        let mailer = self.mailer.clone();
        tokio::task::spawn_blocking(move || mailer.send(&email)).await??;

        tracing::debug!(recipient = %recipient, subject, "Email sent");
        Ok(())
    }
}

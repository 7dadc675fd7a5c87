pub mod templates;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::EmailSettings;
use crate::error::AuthResult;

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> AuthResult<()>;
}

pub struct SmtpMailer {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(settings: &EmailSettings) -> AuthResult<Self> {
        let from: Mailbox = settings.from.parse()?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.server.host)?
            .port(settings.server.port);
        if let (Some(user), Some(password)) = (&settings.server.user, &settings.server.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            from,
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> AuthResult<()> {
        let to: Mailbox = email.to.parse()?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html),
                    ),
            )?;

        match self.transport.send(message).await {
            Ok(_) => {
                tracing::info!(to = %email.to, "Verification email sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(to = %email.to, "Failed to send email via SMTP: {}", e);
                Err(e.into())
            }
        }
    }
}

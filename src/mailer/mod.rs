use crate::error::DispatchError;
use crate::types::SmtpConfig;
use async_trait::async_trait;
use lettre::message::MultiPart;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// A fully rendered email ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), DispatchError>;
}

/// Builds a transport from the SMTP settings read at the start of a run.
pub trait TransportProvider: Send + Sync {
    fn transport(&self, config: &SmtpConfig) -> Result<Box<dyn EmailTransport>, DispatchError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SmtpProvider;

impl TransportProvider for SmtpProvider {
    fn transport(&self, config: &SmtpConfig) -> Result<Box<dyn EmailTransport>, DispatchError> {
        Ok(Box::new(SmtpMailer::new(config)?))
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, DispatchError> {
        config
            .validate()
            .map_err(DispatchError::InvalidSmtpConfig)?;

        // secure = implicit TLS (usually 465); otherwise STARTTLS when the server offers it
        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else {
            let tls = TlsParameters::new(config.host.clone())?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .tls(Tls::Opportunistic(tls))
        };

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.pass.clone()))
            .build();

        Ok(Self { transport })
    }
}

#[async_trait]
impl EmailTransport for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), DispatchError> {
        let message = Message::builder()
            .from(email.from.parse()?)
            .to(email.to.parse()?)
            .subject(email.subject)
            .multipart(MultiPart::alternative_plain_html(email.text, email.html))?;

        self.transport.send(message).await?;
        Ok(())
    }
}

use crate::digest::{parse_digest, Digest};
use crate::error::DispatchError;
use crate::mailer::{EmailTransport, OutgoingEmail, TransportProvider};
use crate::push::{notify_best_effort, PushNotification, PushNotifier, PushOutcome};
use crate::render::render_email_html;
use crate::types::SmtpConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Email and push plumbing shared by the batch and immediate send paths.
#[derive(Clone)]
pub struct Dispatcher {
    transports: Arc<dyn TransportProvider>,
    push: Option<Arc<dyn PushNotifier>>,
    send_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        transports: Arc<dyn TransportProvider>,
        push: Option<Arc<dyn PushNotifier>>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            transports,
            push,
            send_timeout,
        }
    }

    /// Opens a connection for one run. `config` must be the copy read for
    /// that run; it is not consulted again afterwards.
    pub fn connect(&self, config: &SmtpConfig) -> Result<Connection<'_>, DispatchError> {
        let transport = self.transports.transport(config)?;
        Ok(Connection {
            dispatcher: self,
            transport,
            from: config.from.clone(),
        })
    }
}

pub struct Connection<'a> {
    dispatcher: &'a Dispatcher,
    transport: Box<dyn EmailTransport>,
    from: String,
}

impl Connection<'_> {
    /// Sends a typed digest; the plain-text part is its text form.
    pub async fn send_digest(
        &self,
        to: &str,
        subject: &str,
        digest: &Digest,
    ) -> Result<(), DispatchError> {
        self.deliver(to, subject, digest.to_text(), digest).await
    }

    /// Sends a plain-text digest, parsed to build the HTML part.
    pub async fn send_text(&self, to: &str, subject: &str, text: &str) -> Result<(), DispatchError> {
        let digest = parse_digest(text);
        self.deliver(to, subject, text.to_string(), &digest).await
    }

    pub async fn push(&self, token: Option<&str>, notification: &PushNotification) -> PushOutcome {
        notify_best_effort(
            self.dispatcher.push.as_deref(),
            token,
            notification,
            self.dispatcher.send_timeout,
        )
        .await
    }

    async fn deliver(
        &self,
        to: &str,
        subject: &str,
        text: String,
        digest: &Digest,
    ) -> Result<(), DispatchError> {
        let email = OutgoingEmail {
            from: self.from.clone(),
            to: to.to_string(),
            subject: subject.to_string(),
            html: render_email_html(digest, subject),
            text,
        };

        let limit = self.dispatcher.send_timeout;
        match timeout(limit, self.transport.send(email)).await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::Timeout(limit)),
        }
    }
}

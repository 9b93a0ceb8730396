//! Push notifications.
//!
//! Pushes are a secondary side effect of a reminder: [`notify_best_effort`]
//! reports what happened but never returns an error to the caller.

use crate::config::{FcmCredential, FcmSettings};
use crate::error::PushError;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const FCM_ENDPOINT: &str = "https://fcm.googleapis.com/v1/projects/{project}/messages:send";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
}

impl PushNotification {
    pub fn reminder(subject: &str, active_count: usize) -> Self {
        Self {
            title: subject.to_string(),
            body: format!("You have {} active prayers to review.", active_count),
        }
    }
}

#[async_trait]
pub trait PushNotifier: Send + Sync {
    async fn notify(&self, token: &str, notification: &PushNotification) -> Result<(), PushError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Delivered,
    Skipped,
    Failed(String),
}

/// Sends a push if a notifier and token are available. Failures are logged and
/// folded into the returned outcome.
pub async fn notify_best_effort(
    notifier: Option<&dyn PushNotifier>,
    token: Option<&str>,
    notification: &PushNotification,
    limit: Duration,
) -> PushOutcome {
    let (Some(notifier), Some(token)) = (notifier, token) else {
        return PushOutcome::Skipped;
    };

    match tokio::time::timeout(limit, notifier.notify(token, notification)).await {
        Ok(Ok(())) => PushOutcome::Delivered,
        Ok(Err(e)) => {
            log::warn!("Push notification failed: {}", e);
            PushOutcome::Failed(e.to_string())
        }
        Err(_) => {
            log::warn!("Push notification timed out after {}s", limit.as_secs());
            PushOutcome::Failed("timeout".to_string())
        }
    }
}

/// Firebase Cloud Messaging HTTP v1 client.
#[derive(Clone)]
pub struct FcmNotifier {
    endpoint: String,
    credential: FcmCredential,
    client: reqwest::Client,
}

impl FcmNotifier {
    pub fn new(settings: &FcmSettings) -> Self {
        let endpoint = settings
            .endpoint
            .clone()
            .unwrap_or_else(|| FCM_ENDPOINT.replace("{project}", &settings.project_id));
        Self {
            endpoint,
            credential: settings.credential.clone(),
            client: reqwest::Client::new(),
        }
    }

    async fn access_token(&self) -> Result<String, PushError> {
        match &self.credential {
            FcmCredential::Static(token) => Ok(token.clone()),
            FcmCredential::File(path) => tokio::fs::read_to_string(path)
                .await
                .map(|token| token.trim().to_string())
                .map_err(PushError::Credential),
        }
    }
}

#[async_trait]
impl PushNotifier for FcmNotifier {
    async fn notify(&self, token: &str, notification: &PushNotification) -> Result<(), PushError> {
        let body = serde_json::json!({
            "message": {
                "token": token,
                "notification": notification,
            }
        });
        let access_token = self.access_token().await?;
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(PushError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PushError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

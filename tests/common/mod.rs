#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use prayer_reminder::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 20, 12, 0, 0).unwrap()
}

pub fn smtp_config() -> SmtpConfig {
    SmtpConfig {
        host: "smtp.example.com".to_string(),
        port: 587,
        secure: false,
        user: "mailer".to_string(),
        pass: "secret".to_string(),
        from: "Prayer App <noreply@example.com>".to_string(),
    }
}

pub fn record(id: &str, user_id: &str, kind: RecordKind, text: &str) -> PrayerRecord {
    PrayerRecord {
        id: id.to_string(),
        user_id: user_id.to_string(),
        date: "2025-01-15".to_string(),
        kind,
        text: text.to_string(),
        journal: String::new(),
        pray_for: String::new(),
        archived: false,
        reminder_frequency: Frequency::Weekly,
        include_active_summary: false,
    }
}

pub fn user(email: &str, frequency: Frequency, last: Option<DateTime<Utc>>) -> UserReminderState {
    UserReminderState {
        email: email.to_string(),
        reminder_frequency: frequency,
        last_email_sent: last,
        fcm_token: None,
        include_active_summary: false,
    }
}

/// Email transport that records what it was asked to send.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    pub sent: Arc<Mutex<Vec<OutgoingEmail>>>,
    pub fail_for: Arc<Vec<String>>,
    pub delay: Option<Duration>,
}

impl RecordingTransport {
    pub fn failing_for(addresses: &[&str]) -> Self {
        Self {
            fail_for: Arc::new(addresses.iter().map(|a| a.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailTransport for RecordingTransport {
    async fn send(&self, email: OutgoingEmail) -> Result<(), DispatchError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_for.contains(&email.to) {
            return Err(DispatchError::Transport(format!("rejected {}", email.to)));
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct FakeProvider {
    pub transport: RecordingTransport,
    pub configs: Arc<Mutex<Vec<SmtpConfig>>>,
}

impl TransportProvider for FakeProvider {
    fn transport(&self, config: &SmtpConfig) -> Result<Box<dyn EmailTransport>, DispatchError> {
        self.configs.lock().unwrap().push(config.clone());
        Ok(Box::new(self.transport.clone()))
    }
}

#[derive(Clone, Default)]
pub struct FakePush {
    pub sent: Arc<Mutex<Vec<(String, PushNotification)>>>,
    pub fail: bool,
}

#[async_trait]
impl PushNotifier for FakePush {
    async fn notify(&self, token: &str, notification: &PushNotification) -> Result<(), PushError> {
        if self.fail {
            return Err(PushError::Rejected {
                status: 500,
                body: "unavailable".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((token.to_string(), notification.clone()));
        Ok(())
    }
}

pub fn dispatcher(provider: &FakeProvider, push: Option<FakePush>) -> Dispatcher {
    let push: Option<Arc<dyn PushNotifier>> = match push {
        Some(p) => Some(Arc::new(p)),
        None => None,
    };
    Dispatcher::new(Arc::new(provider.clone()), push, Duration::from_millis(500))
}

pub async fn seed_user(state: &AppState, id: &str, user: UserReminderState) {
    state.users.lock().await.insert(id.to_string(), user);
}

pub async fn seed_record(state: &AppState, record: PrayerRecord) {
    state.prayers.lock().await.push(record);
}

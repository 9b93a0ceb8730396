use crate::digest::compose_summary;
use crate::error::DispatchError;
use crate::handlers::dispatch::{Connection, Dispatcher};
use crate::push::{PushNotification, PushOutcome};
use crate::state::AppState;
use crate::types::UserReminderState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

const SAVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Whether a reminder is due for this user at `now`. A missing last-sent
/// time counts as the epoch. Thresholds are strict.
pub fn is_due(state: &UserReminderState, now: DateTime<Utc>) -> bool {
    let Some(threshold) = state.reminder_frequency.threshold() else {
        return false;
    };
    let last_sent = state.last_email_sent.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    now - last_sent > threshold
}

/// Pairs every user id with its eligibility at `now`.
pub fn scan_users(users: &[(String, UserReminderState)], now: DateTime<Utc>) -> Vec<(String, bool)> {
    users
        .iter()
        .map(|(id, state)| (id.clone(), is_due(state, now)))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub emails_sent: usize,
    pub not_due: usize,
    pub skipped_empty: usize,
    pub failed: usize,
    pub pushes_delivered: usize,
    pub pushes_failed: usize,
}

impl BatchReport {
    pub fn message(&self) -> String {
        format!(
            "Scheduled email check complete. Sent {} emails.",
            self.emails_sent
        )
    }
}

enum UserOutcome {
    Sent(PushOutcome),
    NoActiveRecords,
}

/// One pass over all users: send a digest to everyone who is due.
///
/// A missing SMTP configuration aborts the run before anything is sent.
/// Every other failure is confined to the user it happened for.
pub async fn send_scheduled_reminders(
    state: &AppState,
    dispatcher: &Dispatcher,
    now: DateTime<Utc>,
) -> Result<BatchReport, DispatchError> {
    log::info!("Checking for scheduled emails...");

    let smtp = state.smtp_config().await?.ok_or_else(|| {
        log::error!("SMTP configuration not found");
        DispatchError::MissingSmtpConfig
    })?;
    let connection = dispatcher.connect(&smtp)?;

    let users = state.users_snapshot().await?;
    let mut report = BatchReport::default();

    for ((user_id, user), (_, due)) in users.iter().zip(scan_users(&users, now)) {
        if !due {
            report.not_due += 1;
            continue;
        }

        match remind_user(state, &connection, user_id, user, now).await {
            Ok(UserOutcome::Sent(push)) => {
                report.emails_sent += 1;
                match push {
                    PushOutcome::Delivered => report.pushes_delivered += 1,
                    PushOutcome::Failed(_) => report.pushes_failed += 1,
                    PushOutcome::Skipped => {}
                }
                log::info!(
                    "Sent {} reminder email to {}",
                    user.reminder_frequency,
                    user.email
                );
            }
            Ok(UserOutcome::NoActiveRecords) => {
                report.skipped_empty += 1;
                log::debug!("No active prayers for user {}, skipping", user_id);
            }
            Err(e) => {
                report.failed += 1;
                log::error!("Failed to send email to {}: {}", user.email, e);
            }
        }
    }

    match tokio::time::timeout(SAVE_TIMEOUT, state.save_users()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::error!("Error saving reminder state: {}", e),
        Err(_) => log::error!("Timeout while saving reminder state"),
    }

    log::info!("{}", report.message());
    Ok(report)
}

async fn remind_user(
    state: &AppState,
    connection: &Connection<'_>,
    user_id: &str,
    user: &UserReminderState,
    now: DateTime<Utc>,
) -> Result<UserOutcome, DispatchError> {
    let records = state.active_records_for(user_id).await?;
    if records.is_empty() {
        return Ok(UserOutcome::NoActiveRecords);
    }

    let digest = compose_summary(&records);
    let subject = format!(
        "Your {} prayer reminder - {} active prayers",
        user.reminder_frequency,
        records.len()
    );

    connection.send_digest(&user.email, &subject, &digest).await?;

    let push = connection
        .push(
            user.push_token(),
            &PushNotification::reminder(&subject, records.len()),
        )
        .await;
    if push == PushOutcome::Delivered {
        log::info!("Sent push notification to {}", user.email);
    }

    state.mark_email_sent(user_id, now).await?;
    Ok(UserOutcome::Sent(push))
}

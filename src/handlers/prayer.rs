use crate::digest::compose_new_entry;
use crate::error::{DispatchError, PrayerError};
use crate::handlers::dispatch::Dispatcher;
use crate::state::AppState;
use crate::types::{Frequency, NewPrayer, PrayerRecord, ReminderPreferenceUpdate};

/// Stores a new record. With reminders on, the owner's reminder state is
/// merged and a confirmation email goes out; that email never fails the
/// submission.
pub async fn submit_prayer(
    state: &AppState,
    dispatcher: &Dispatcher,
    new: NewPrayer,
) -> Result<PrayerRecord, PrayerError> {
    new.validate().map_err(PrayerError::Invalid)?;

    let email = new.email.clone().filter(|e| !e.trim().is_empty());
    let record = new.into_record(uuid::Uuid::new_v4().to_string());
    state.add_record(record.clone()).await?;
    log::info!("Saved {} {} for user {}", record.kind, record.id, record.user_id);

    if record.reminder_frequency == Frequency::Never {
        return Ok(record);
    }

    let user = state
        .upsert_reminder_preferences(
            &record.user_id,
            ReminderPreferenceUpdate {
                email,
                reminder_frequency: record.reminder_frequency,
                include_active_summary: record.include_active_summary,
            },
        )
        .await?;
    log::info!("Reminder preferences saved for user {}", record.user_id);

    if user.email.trim().is_empty() {
        return Ok(record);
    }
    if let Err(e) = send_confirmation(state, dispatcher, &record, &user.email).await {
        log::error!("Failed to send confirmation to {}: {}", user.email, e);
    }

    Ok(record)
}

async fn send_confirmation(
    state: &AppState,
    dispatcher: &Dispatcher,
    record: &PrayerRecord,
    to: &str,
) -> Result<(), DispatchError> {
    let smtp = state
        .smtp_config()
        .await?
        .ok_or(DispatchError::MissingSmtpConfig)?;
    let connection = dispatcher.connect(&smtp)?;

    let active = state.active_records_for(&record.user_id).await?;
    let digest = compose_new_entry(record, &active);
    let subject = format!(
        "New {} added - {} reminders enabled",
        record.kind, record.reminder_frequency
    );

    connection.send_digest(to, &subject, &digest).await
}

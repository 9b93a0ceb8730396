use crate::error::DispatchError;
use crate::handlers::dispatch::Dispatcher;
use crate::state::AppState;
use serde::Deserialize;

/// Body of an ad-hoc send.
#[derive(Debug, Clone, Deserialize)]
pub struct SendEmailRequest {
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Sends one email right away. `message` is a plain-text digest; it goes out
/// as the text part and is parsed to build the HTML part.
pub async fn send_immediate_email(
    state: &AppState,
    dispatcher: &Dispatcher,
    request: &SendEmailRequest,
) -> Result<(), DispatchError> {
    let smtp = state
        .smtp_config()
        .await?
        .ok_or(DispatchError::MissingSmtpConfig)?;
    let connection = dispatcher.connect(&smtp)?;

    connection
        .send_text(&request.email, &request.subject, &request.message)
        .await?;

    log::info!("Sent email to {}", request.email);
    Ok(())
}

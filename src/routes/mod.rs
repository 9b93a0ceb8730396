use crate::config::AdminPolicy;
use crate::error::{DispatchError, PrayerError, StoreError};
use crate::handlers::{
    send_immediate_email, send_scheduled_reminders, submit_prayer, Dispatcher, SendEmailRequest,
};
use crate::state::{AppState, RecordStatus};
use crate::types::{NewPrayer, SmtpConfig};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub const IDENTITY_HEADER: &str = "x-user-email";

#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<AppState>,
    pub dispatcher: Dispatcher,
    pub admins: Arc<AdminPolicy>,
}

pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/send-scheduled-emails", get(send_scheduled_emails))
        .route("/api/send-email", post(send_email))
        .route("/api/prayers", post(create_prayer).get(list_prayers))
        .route("/api/prayers/:id/archive", patch(archive_prayer))
        .route("/api/users/:id/push-token", put(update_push_token))
        .route("/api/admin/smtp", get(get_smtp_config).put(put_smtp_config))
        .route("/api/admin/metrics", get(metrics))
        .with_state(ctx)
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ApiError::new(StatusCode::NOT_FOUND, format!("{} not found", id)),
            other => {
                log::error!("{}", other);
                ApiError::internal("Storage failure")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<PrayerError> for ApiError {
    fn from(err: PrayerError) -> Self {
        match err {
            PrayerError::Invalid(msg) => ApiError::new(StatusCode::BAD_REQUEST, msg),
            PrayerError::Store(e) => e.into(),
        }
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn send_scheduled_emails(State(ctx): State<AppContext>) -> Result<impl IntoResponse, ApiError> {
    match send_scheduled_reminders(&ctx.state, &ctx.dispatcher, Utc::now()).await {
        Ok(report) => Ok(Json(json!({
            "message": report.message(),
            "emailsSent": report.emails_sent,
        }))),
        Err(DispatchError::MissingSmtpConfig) => {
            Err(ApiError::internal(DispatchError::MissingSmtpConfig.to_string()))
        }
        Err(e) => {
            log::error!("Scheduled email error: {}", e);
            Err(ApiError::internal("Failed to process scheduled emails"))
        }
    }
}

async fn send_email(
    State(ctx): State<AppContext>,
    body: Result<Json<SendEmailRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        log::error!("Email send error: {}", rejection.body_text());
        ApiError::internal("Failed to send email")
    })?;
    match send_immediate_email(&ctx.state, &ctx.dispatcher, &request).await {
        Ok(()) => Ok(Json(json!({ "success": true }))),
        Err(DispatchError::MissingSmtpConfig) => {
            Err(ApiError::internal(DispatchError::MissingSmtpConfig.to_string()))
        }
        Err(e) => {
            log::error!("Email send error: {}", e);
            Err(ApiError::internal("Failed to send email"))
        }
    }
}

async fn create_prayer(
    State(ctx): State<AppContext>,
    body: Result<Json<NewPrayer>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(new) = body?;
    let record = submit_prayer(&ctx.state, &ctx.dispatcher, new).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    user_id: String,
    #[serde(default)]
    status: RecordStatus,
    q: Option<String>,
}

async fn list_prayers(
    State(ctx): State<AppContext>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let search = query.q.as_deref().filter(|q| !q.trim().is_empty());
    let records = ctx
        .state
        .records_for(&query.user_id, query.status, search)
        .await?;
    Ok(Json(records))
}

#[derive(Debug, Deserialize)]
struct ArchiveBody {
    archived: bool,
}

async fn archive_prayer(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    body: Result<Json<ArchiveBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let record = ctx.state.set_archived(&id, body.archived).await?;
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PushTokenBody {
    fcm_token: String,
}

async fn update_push_token(
    State(ctx): State<AppContext>,
    Path(user_id): Path<String>,
    body: Result<Json<PushTokenBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    if body.fcm_token.trim().is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "fcmToken is required"));
    }
    ctx.state.set_push_token(&user_id, body.fcm_token).await?;
    Ok(Json(json!({ "success": true })))
}

fn require_admin(ctx: &AppContext, headers: &HeaderMap) -> Result<(), ApiError> {
    let identity = headers
        .get(IDENTITY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if ctx.admins.is_admin(identity) {
        Ok(())
    } else {
        log::warn!("Admin access denied for '{}'", identity);
        Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "You don't have permission to access the admin panel.",
        ))
    }
}

async fn get_smtp_config(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&ctx, &headers)?;
    match ctx.state.smtp_config().await? {
        Some(config) => Ok(Json(config.redacted())),
        None => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            DispatchError::MissingSmtpConfig.to_string(),
        )),
    }
}

async fn put_smtp_config(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    body: Result<Json<SmtpConfig>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&ctx, &headers)?;
    let Json(config) = body?;
    config
        .validate()
        .map_err(|msg| ApiError::new(StatusCode::BAD_REQUEST, msg))?;
    ctx.state.set_smtp_config(config).await?;
    log::info!("SMTP configuration updated");
    Ok(Json(json!({ "success": true })))
}

async fn metrics(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&ctx, &headers)?;
    Ok(Json(ctx.state.metrics().await?))
}

mod common;

#[cfg(test)]
mod tests {
    use super::common::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use chrono::{TimeDelta, Utc};
    use prayer_reminder::*;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    const ADMIN: &str = "admin@example.com";

    fn app(state: Arc<AppState>, provider: &FakeProvider) -> Router {
        router(AppContext {
            state,
            dispatcher: dispatcher(provider, None),
            admins: Arc::new(AdminPolicy::new([ADMIN])),
        })
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let state = Arc::new(AppState::in_memory());
        let response = app(state, &FakeProvider::default())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_scheduled_emails_reports_count() {
        let state = Arc::new(AppState::in_memory());
        state.set_smtp_config(smtp_config()).await.unwrap();
        seed_user(
            &state,
            "u1",
            user("u1@example.com", Frequency::Daily, Some(Utc::now() - TimeDelta::days(2))),
        )
        .await;
        seed_record(&state, record("p1", "u1", RecordKind::Prayer, "Hope")).await;

        let provider = FakeProvider::default();
        let response = app(state.clone(), &provider)
            .oneshot(
                Request::builder()
                    .uri("/api/send-scheduled-emails")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["emailsSent"], 1);
        assert_eq!(
            json["message"],
            "Scheduled email check complete. Sent 1 emails."
        );
        assert_eq!(provider.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_scheduled_emails_without_smtp_is_500() {
        let state = Arc::new(AppState::in_memory());
        let response = app(state, &FakeProvider::default())
            .oneshot(
                Request::builder()
                    .uri("/api/send-scheduled-emails")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await["error"],
            "SMTP configuration not found"
        );
    }

    #[tokio::test]
    async fn test_send_email_success_and_failure() {
        let state = Arc::new(AppState::in_memory());
        state.set_smtp_config(smtp_config()).await.unwrap();
        let provider = FakeProvider {
            transport: RecordingTransport::failing_for(&["bad@example.com"]),
            ..FakeProvider::default()
        };

        let ok = app(state.clone(), &provider)
            .oneshot(json_request(
                "POST",
                "/api/send-email",
                json!({"email": "good@example.com", "subject": "Hi", "message": "Hello"}),
            ))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(body_json(ok).await, json!({"success": true}));

        let failed = app(state, &provider)
            .oneshot(json_request(
                "POST",
                "/api/send-email",
                json!({"email": "bad@example.com", "subject": "Hi", "message": "Hello"}),
            ))
            .await
            .unwrap();
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(failed).await["error"], "Failed to send email");
    }

    #[tokio::test]
    async fn test_send_email_without_smtp_is_500() {
        let state = Arc::new(AppState::in_memory());
        let provider = FakeProvider::default();
        let response = app(state, &provider)
            .oneshot(json_request(
                "POST",
                "/api/send-email",
                json!({"email": "a@example.com", "subject": "Hi", "message": "Hello"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await["error"],
            "SMTP configuration not found"
        );
        assert!(provider.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_send_email_incomplete_body_is_json_500() {
        let state = Arc::new(AppState::in_memory());
        state.set_smtp_config(smtp_config()).await.unwrap();
        let provider = FakeProvider::default();
        let response = app(state, &provider)
            .oneshot(json_request(
                "POST",
                "/api/send-email",
                json!({"email": "a@example.com"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Failed to send email"})
        );
        assert!(provider.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_400() {
        let state = Arc::new(AppState::in_memory());
        let request = Request::builder()
            .method("POST")
            .uri("/api/prayers")
            .header("content-type", "application/json")
            .body(Body::from("{\"userId\": "))
            .unwrap();

        let response = app(state.clone(), &FakeProvider::default())
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().is_some_and(|e| !e.is_empty()));
        assert!(state.prayers.lock().await.is_empty());

        let archive = app(state, &FakeProvider::default())
            .oneshot(json_request(
                "PATCH",
                "/api/prayers/p1/archive",
                json!({"archived": "yes"}),
            ))
            .await
            .unwrap();
        assert_eq!(archive.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(archive).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_prayer_lifecycle() {
        let state = Arc::new(AppState::in_memory());
        let provider = FakeProvider::default();

        let created = app(state.clone(), &provider)
            .oneshot(json_request(
                "POST",
                "/api/prayers",
                json!({
                    "userId": "u1",
                    "date": "2025-01-15",
                    "type": "prayer",
                    "text": "Healing for Sam",
                    "prayFor": "Sam",
                    "reminderFrequency": "never"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let created = body_json(created).await;
        assert_eq!(created["prayFor"], "Sam");
        assert_eq!(created["archived"], false);
        let id = created["id"].as_str().unwrap().to_string();

        let archived = app(state.clone(), &provider)
            .oneshot(json_request(
                "PATCH",
                &format!("/api/prayers/{}/archive", id),
                json!({"archived": true}),
            ))
            .await
            .unwrap();
        assert_eq!(archived.status(), StatusCode::OK);

        let active = app(state.clone(), &provider)
            .oneshot(
                Request::builder()
                    .uri("/api/prayers?userId=u1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(body_json(active).await, json!([]));

        let all = app(state, &provider)
            .oneshot(
                Request::builder()
                    .uri("/api/prayers?userId=u1&status=archived&q=sam")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let all = body_json(all).await;
        assert_eq!(all.as_array().unwrap().len(), 1);
        assert_eq!(all[0]["id"], id.as_str());
    }

    #[tokio::test]
    async fn test_create_prayer_rejects_empty_text() {
        let state = Arc::new(AppState::in_memory());
        let response = app(state, &FakeProvider::default())
            .oneshot(json_request(
                "POST",
                "/api/prayers",
                json!({"userId": "u1", "date": "2025-01-15", "type": "praise", "text": "  "}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "text is required");
    }

    #[tokio::test]
    async fn test_archive_unknown_prayer_is_404() {
        let state = Arc::new(AppState::in_memory());
        let response = app(state, &FakeProvider::default())
            .oneshot(json_request(
                "PATCH",
                "/api/prayers/missing/archive",
                json!({"archived": true}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_push_token_is_merged() {
        let state = Arc::new(AppState::in_memory());
        seed_user(&state, "u1", user("u1@example.com", Frequency::Weekly, None)).await;

        let response = app(state.clone(), &FakeProvider::default())
            .oneshot(json_request(
                "PUT",
                "/api/users/u1/push-token",
                json!({"fcmToken": "device-9"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let u1 = state.user("u1").await.unwrap().unwrap();
        assert_eq!(u1.fcm_token.as_deref(), Some("device-9"));
        assert_eq!(u1.reminder_frequency, Frequency::Weekly);
        assert_eq!(u1.email, "u1@example.com");
    }

    #[tokio::test]
    async fn test_admin_endpoints_require_admin() {
        let state = Arc::new(AppState::in_memory());
        let response = app(state, &FakeProvider::default())
            .oneshot(
                Request::builder()
                    .uri("/api/admin/metrics")
                    .header(IDENTITY_HEADER, "someone@example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_smtp_config_round_trip() {
        let state = Arc::new(AppState::in_memory());
        let provider = FakeProvider::default();

        let mut request = json_request("PUT", "/api/admin/smtp", serde_json::to_value(smtp_config()).unwrap());
        request
            .headers_mut()
            .insert(IDENTITY_HEADER, "Admin@Example.com".parse().unwrap());
        let saved = app(state.clone(), &provider).oneshot(request).await.unwrap();
        assert_eq!(saved.status(), StatusCode::OK);
        assert_eq!(state.smtp_config().await.unwrap(), Some(smtp_config()));

        let fetched = app(state, &provider)
            .oneshot(
                Request::builder()
                    .uri("/api/admin/smtp")
                    .header(IDENTITY_HEADER, ADMIN)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(fetched.status(), StatusCode::OK);
        let json = body_json(fetched).await;
        assert_eq!(json["host"], "smtp.example.com");
        assert_eq!(json["port"], 587);
        assert_eq!(json["pass"], "");
    }

    #[tokio::test]
    async fn test_admin_smtp_config_validation() {
        let state = Arc::new(AppState::in_memory());
        let mut config = serde_json::to_value(smtp_config()).unwrap();
        config["from"] = json!("");
        let mut request = json_request("PUT", "/api/admin/smtp", config);
        request
            .headers_mut()
            .insert(IDENTITY_HEADER, ADMIN.parse().unwrap());

        let response = app(state.clone(), &FakeProvider::default())
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "From email is required.");
        assert_eq!(state.smtp_config().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_admin_metrics() {
        let state = Arc::new(AppState::in_memory());
        seed_user(&state, "u1", user("u1@example.com", Frequency::Daily, None)).await;
        seed_record(&state, record("p1", "u1", RecordKind::Prayer, "Hope")).await;
        let mut archived = record("p2", "u1", RecordKind::Praise, "Done");
        archived.archived = true;
        seed_record(&state, archived).await;

        let response = app(state, &FakeProvider::default())
            .oneshot(
                Request::builder()
                    .uri("/api/admin/metrics")
                    .header(IDENTITY_HEADER, ADMIN)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"totalUsers": 1, "totalPrayers": 2, "activePrayers": 1, "archivedPrayers": 1})
        );
    }
}

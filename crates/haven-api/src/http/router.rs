//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/` except `/health`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Expert sessions
        .route(
            "/expert-sessions",
            post(handlers::expert::create_session).get(handlers::expert::list_sessions),
        )
        .route(
            "/expert-sessions/{id}",
            get(handlers::expert::get_session).delete(handlers::expert::delete_session),
        )
        .route(
            "/expert-sessions/{id}/messages",
            post(handlers::expert::append_message),
        )
        .route(
            "/expert-sessions/{id}/accept",
            post(handlers::expert::accept_session),
        )
        .route(
            "/expert-sessions/{id}/complete",
            post(handlers::expert::complete_session),
        )
        // Realtime change feed
        .route("/ws/expert-sessions", get(handlers::ws::feed_ws))
        .route("/ws/expert-sessions/{id}", get(handlers::ws::session_ws))
        // AI assistant
        .route("/assistant/reply", post(handlers::assistant::reply))
        .route(
            "/assistant/conversations",
            get(handlers::assistant::list_conversations),
        )
        .route(
            "/assistant/conversations/{id}",
            get(handlers::assistant::get_conversation),
        )
        // Identity
        .route("/me", get(handlers::profile::get_me))
        // Dashboard stats
        .route("/stats", get(handlers::stats::get_stats));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use haven_types::identity::UserRole;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::state::test_support::test_state;

    async fn call(
        router: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn token_for(state: &AppState, role: UserRole) -> String {
        let profile = state
            .identity_service
            .register(Some("Test".to_string()), None, role)
            .await
            .unwrap();
        state.identity_service.issue_token(&profile.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_health_needs_no_auth() {
        let router = build_router(test_state().await);
        let (status, body) = call(&router, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_missing_or_bad_token_is_unauthorized() {
        let router = build_router(test_state().await);

        let (status, body) = call(&router, "GET", "/api/v1/expert-sessions", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errors"][0]["code"], "UNAUTHORIZED");

        let (status, _) = call(
            &router,
            "GET",
            "/api/v1/expert-sessions",
            Some("hvn_not_a_real_token"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expert_session_lifecycle_over_http() {
        let state = test_state().await;
        let user = token_for(&state, UserRole::User).await;
        let admin = token_for(&state, UserRole::Admin).await;
        let router = build_router(state);

        let (status, body) = call(
            &router,
            "POST",
            "/api/v1/expert-sessions",
            Some(&user),
            Some(json!({ "reason": "feeling overwhelmed", "urgency": "high" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "pending");
        assert_eq!(body["data"]["urgency"], "high");
        assert_eq!(body["data"]["messages"].as_array().unwrap().len(), 1);
        let id = body["data"]["id"].as_str().unwrap().to_string();

        // Users cannot accept
        let (status, _) = call(
            &router,
            "POST",
            &format!("/api/v1/expert-sessions/{id}/accept"),
            Some(&user),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(
            &router,
            "POST",
            &format!("/api/v1/expert-sessions/{id}/accept"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "active");
        assert!(body["data"]["admin_id"].is_string());

        let (status, body) = call(
            &router,
            "POST",
            &format!("/api/v1/expert-sessions/{id}/messages"),
            Some(&user),
            Some(json!({ "text": "thank you for joining" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["messages"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"]["messages"][1]["sender"], "user");

        let (status, body) = call(
            &router,
            "POST",
            &format!("/api/v1/expert-sessions/{id}/complete"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "completed");

        let (status, body) = call(
            &router,
            "POST",
            &format!("/api/v1/expert-sessions/{id}/messages"),
            Some(&user),
            Some(json!({ "text": "one more thing" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["errors"][0]["code"], "SESSION_CLOSED");
    }

    #[tokio::test]
    async fn test_users_only_list_their_own_sessions() {
        let state = test_state().await;
        let alice = token_for(&state, UserRole::User).await;
        let bob = token_for(&state, UserRole::User).await;
        let admin = token_for(&state, UserRole::Admin).await;
        let router = build_router(state);

        for token in [&alice, &bob] {
            let (status, _) = call(
                &router,
                "POST",
                "/api/v1/expert-sessions",
                Some(token),
                Some(json!({ "reason": "exam stress" })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, body) = call(&router, "GET", "/api/v1/expert-sessions", Some(&alice), None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (_, body) = call(
            &router,
            "GET",
            "/api/v1/expert-sessions?status=pending",
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);

        let (status, _) = call(
            &router,
            "GET",
            "/api/v1/expert-sessions?status=archived",
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_blank_reason_and_bad_id_are_rejected() {
        let state = test_state().await;
        let user = token_for(&state, UserRole::User).await;
        let router = build_router(state);

        let (status, _) = call(
            &router,
            "POST",
            "/api/v1/expert-sessions",
            Some(&user),
            Some(json!({ "reason": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &router,
            "GET",
            "/api/v1/expert-sessions/not-a-uuid",
            Some(&user),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_stats_are_admin_only() {
        let state = test_state().await;
        let user = token_for(&state, UserRole::User).await;
        let admin = token_for(&state, UserRole::Admin).await;
        let router = build_router(state);

        let (status, _) = call(&router, "GET", "/api/v1/stats", Some(&user), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(&router, "GET", "/api/v1/stats", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total_users"], 2);
        assert_eq!(body["data"]["pending_expert_sessions"], 0);
    }

    #[tokio::test]
    async fn test_assistant_reply_and_history() {
        let state = test_state().await;
        let user = token_for(&state, UserRole::User).await;
        let router = build_router(state);

        let (status, body) = call(
            &router,
            "POST",
            "/api/v1/assistant/reply",
            Some(&user),
            Some(json!({ "message": "I can't sleep before exams" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["reply"]["sender"], "ai");
        assert_eq!(body["data"]["intent"], "general");
        let conversation_id = body["data"]["conversation_id"].as_str().unwrap().to_string();

        let (status, body) = call(
            &router,
            "POST",
            "/api/v1/assistant/reply",
            Some(&user),
            Some(json!({
                "conversation_id": conversation_id,
                "message": "Can I talk to a real person?"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["intent"], "escalation");
        assert_eq!(body["data"]["suggested_urgency"], "normal");

        let (_, body) = call(
            &router,
            "GET",
            "/api/v1/assistant/conversations",
            Some(&user),
            None,
        )
        .await;
        let conversations = body["data"].as_array().unwrap();
        assert_eq!(conversations.len(), 1);
        // greeting + two user turns + two replies
        assert_eq!(conversations[0]["messages"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_me_returns_profile() {
        let state = test_state().await;
        let admin = token_for(&state, UserRole::Admin).await;
        let router = build_router(state);

        let (status, body) = call(&router, "GET", "/api/v1/me", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["role"], "admin");
        assert_eq!(body["data"]["first_name"], "Test");
    }
}

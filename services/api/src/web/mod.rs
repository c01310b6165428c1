pub mod analysis;
pub mod auth;
pub mod goals;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod training_types;
pub mod workouts;

#[cfg(test)]
mod test_support;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiError;
use rest::ApiDoc;
use state::AppState;

pub use middleware::require_auth;

/// Builds the full application: public auth routes, session-protected
/// routes, CORS for the configured frontend origin and the Swagger UI.
pub fn app_router(state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS origin: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/workouts",
            get(workouts::workout_history_handler).post(workouts::add_workout_handler),
        )
        .route(
            "/workouts/{id}",
            get(workouts::get_workout_handler).put(workouts::update_workout_handler),
        )
        .route(
            "/goals",
            get(goals::list_goals_handler).post(goals::add_goal_handler),
        )
        .route("/goals/progress", get(goals::goal_progress_handler))
        .route("/goals/{id}", patch(goals::update_goal_handler))
        .route("/analysis", get(analysis::analysis_handler))
        .route(
            "/training-types",
            get(training_types::list_training_types_handler)
                .post(training_types::add_training_type_handler),
        )
        .route(
            "/training-types/{id}",
            patch(training_types::update_training_type_handler)
                .delete(training_types::delete_training_type_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(state);

    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::test_support::{register_user, test_state};
    use axum::{
        body::{to_bytes, Body},
        http::{header::COOKIE, Request, StatusCode},
    };
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    /// A state with one registered user holding a session that expires at
    /// `expires_at`.
    async fn state_with_session(
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> (Arc<AppState>, Uuid) {
        let state = test_state(now());
        let user = register_user(&state, "ana@example.com").await;
        state
            .db
            .create_auth_session(token, user, expires_at)
            .await
            .unwrap();
        (state, user)
    }

    async fn send(state: Arc<AppState>, request: Request<Body>) -> (StatusCode, Option<Value>) {
        let response = app_router(state).unwrap().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).ok())
    }

    fn get(uri: &str) -> axum::http::request::Builder {
        Request::builder().method("GET").uri(uri)
    }

    #[tokio::test]
    async fn protected_routes_reject_missing_token() {
        let (state, _) = state_with_session("token", now() + Duration::days(1)).await;

        let (status, _) = send(state, get("/goals/progress").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn protected_routes_reject_unknown_and_expired_tokens() {
        let (state, _) = state_with_session("old", now() - Duration::seconds(1)).await;

        for token in ["old", "never-issued"] {
            let request = get("/goals/progress")
                .header(AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap();
            let (status, _) = send(state.clone(), request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "token {}", token);
        }
    }

    #[tokio::test]
    async fn bearer_token_reaches_the_handler() {
        let (state, _) = state_with_session("good", now() + Duration::days(1)).await;

        let request = get("/goals/progress")
            .header(AUTHORIZATION, "Bearer good")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap()["goals"], Value::Array(vec![]));
    }

    #[tokio::test]
    async fn session_cookie_identifies_the_user() {
        let (state, user) = state_with_session("good", now() + Duration::days(1)).await;

        let request = get("/auth/me")
            .header(COOKIE, "theme=dark; session=good")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(state, request).await;
        assert_eq!(status, StatusCode::OK);
        let body = body.unwrap();
        assert_eq!(body["id"], user.to_string());
        assert_eq!(body["email"], "ana@example.com");
    }

    #[tokio::test]
    async fn auth_routes_stay_public() {
        let state = test_state(now());
        let request = Request::builder()
            .method("POST")
            .uri("/auth/login")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"email":"nobody@example.com","password":"Secret123"}"#,
            ))
            .unwrap();
        let (status, _) = send(state, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn router_builds_with_valid_origin() {
        assert!(app_router(test_state(now())).is_ok());
    }

    #[test]
    fn malformed_cors_origin_is_rejected() {
        let state = test_state(now());
        let mut config = (*state.config).clone();
        config.cors_origin = "bad\norigin".to_string();
        let state = Arc::new(AppState {
            config: Arc::new(config),
            ..(*state).clone()
        });
        assert!(matches!(app_router(state), Err(ApiError::Internal(_))));
    }
}

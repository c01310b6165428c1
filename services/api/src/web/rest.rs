//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, plus the error
//! mapping shared by every REST handler.

use crate::web::{analysis, auth, goals, training_types, workouts};
use axum::http::StatusCode;
use std::fmt::Display;
use tracing::error;
use utoipa::OpenApi;
use workout_log_core::ports::PortError;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        workouts::add_workout_handler,
        workouts::workout_history_handler,
        workouts::get_workout_handler,
        workouts::update_workout_handler,
        goals::add_goal_handler,
        goals::list_goals_handler,
        goals::update_goal_handler,
        goals::goal_progress_handler,
        analysis::analysis_handler,
        training_types::list_training_types_handler,
        training_types::add_training_type_handler,
        training_types::update_training_type_handler,
        training_types::delete_training_type_handler,
    ),
    components(
        schemas(
            auth::SignupRequest,
            auth::LoginRequest,
            auth::UserResponse,
            auth::LoginResponse,
            workouts::WorkoutRequest,
            workouts::WorkoutResponse,
            workouts::WorkoutHistoryResponse,
            goals::GoalRequest,
            goals::UpdateGoalRequest,
            goals::GoalResponse,
            goals::GoalsResponse,
            goals::ProgressResponse,
            goals::GoalProgressEntry,
            goals::GoalProgressListResponse,
            analysis::SummaryResponse,
            analysis::AnalysisResponse,
            training_types::TrainingTypeRequest,
            training_types::UpdateTrainingTypeRequest,
            training_types::TrainingTypeResponse,
            training_types::TrainingTypesResponse,
        )
    ),
    tags(
        (name = "Workout Log API", description = "Workout logging, periodic goals and training analysis.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Handler Error Mapping
//=========================================================================================

/// The error half of every REST handler's result.
pub type HandlerError = (StatusCode, String);

/// Maps a port failure to a status code. Unexpected failures are logged and
/// reported with `context` only, so storage details never reach the client.
pub fn port_error(context: &str, e: PortError) -> HandlerError {
    match e {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        PortError::Invalid(msg) => (StatusCode::BAD_REQUEST, msg),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::Unexpected(_) => {
            error!("{}: {:?}", context, e);
            (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
        }
    }
}

pub fn bad_request(e: impl Display) -> HandlerError {
    (StatusCode::BAD_REQUEST, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_errors_map_to_status_codes() {
        let cases = [
            (PortError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (PortError::Conflict("x".into()), StatusCode::CONFLICT),
            (PortError::Invalid("x".into()), StatusCode::BAD_REQUEST),
            (PortError::Unauthorized, StatusCode::UNAUTHORIZED),
            (PortError::Unexpected("db down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(port_error("Failed", err).0, status);
        }
    }

    #[test]
    fn unexpected_errors_hide_details() {
        let (_, body) = port_error("Failed to load goals", PortError::Unexpected("secret".into()));
        assert_eq!(body, "Failed to load goals");
    }

    #[test]
    fn openapi_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/signup",
            "/auth/me",
            "/workouts",
            "/workouts/{id}",
            "/goals",
            "/goals/{id}",
            "/goals/progress",
            "/analysis",
            "/training-types",
            "/training-types/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}

//! services/api/src/web/workouts.rs
//!
//! Handlers for logging, reading and editing workouts.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use workout_log_core::domain::{DomainError, NewWorkout, WorkoutRecord};

use crate::web::rest::{bad_request, port_error, HandlerError};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// Body for both logging a workout and replacing one.
#[derive(Deserialize, ToSchema)]
pub struct WorkoutRequest {
    /// Duration in minutes.
    pub training_time: u32,
    pub training_type: String,
    pub date: DateTime<Utc>,
    pub sensations: String,
}

impl WorkoutRequest {
    fn into_domain(self) -> Result<NewWorkout, DomainError> {
        NewWorkout::new(
            self.training_time,
            &self.training_type,
            self.date,
            &self.sensations,
        )
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WorkoutResponse {
    pub id: Uuid,
    pub training_time: u32,
    pub training_type: String,
    pub date: DateTime<Utc>,
    pub sensations: String,
    pub created_at: DateTime<Utc>,
}

impl From<WorkoutRecord> for WorkoutResponse {
    fn from(w: WorkoutRecord) -> Self {
        Self {
            id: w.id,
            training_time: w.training_time,
            training_type: w.training_type,
            date: w.date,
            sensations: w.sensations,
            created_at: w.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WorkoutHistoryResponse {
    pub workouts: Vec<WorkoutResponse>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Log a new workout.
#[utoipa::path(
    post,
    path = "/workouts",
    request_body = WorkoutRequest,
    responses(
        (status = 201, description = "Workout logged", body = WorkoutResponse),
        (status = 400, description = "Invalid workout"),
        (status = 401, description = "Missing or invalid session")
    )
)]
pub async fn add_workout_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<WorkoutRequest>,
) -> Result<(StatusCode, Json<WorkoutResponse>), HandlerError> {
    let workout = req.into_domain().map_err(bad_request)?;
    let record = state
        .db
        .create_workout(user_id, workout)
        .await
        .map_err(|e| port_error("Failed to save workout", e))?;

    info!("User {} logged workout {}", user_id, record.id);
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// The user's full workout history, newest first.
#[utoipa::path(
    get,
    path = "/workouts",
    responses(
        (status = 200, description = "Workout history", body = WorkoutHistoryResponse),
        (status = 401, description = "Missing or invalid session")
    )
)]
pub async fn workout_history_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<WorkoutHistoryResponse>, HandlerError> {
    let workouts = state
        .db
        .list_workouts(user_id)
        .await
        .map_err(|e| port_error("Failed to load workouts", e))?;

    Ok(Json(WorkoutHistoryResponse {
        workouts: workouts.into_iter().map(Into::into).collect(),
    }))
}

/// Fetch one of the user's workouts.
#[utoipa::path(
    get,
    path = "/workouts/{id}",
    params(("id" = Uuid, Path, description = "Workout id")),
    responses(
        (status = 200, description = "The workout", body = WorkoutResponse),
        (status = 404, description = "No such workout for this user")
    )
)]
pub async fn get_workout_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(workout_id): Path<Uuid>,
) -> Result<Json<WorkoutResponse>, HandlerError> {
    let record = state
        .db
        .get_workout(user_id, workout_id)
        .await
        .map_err(|e| port_error("Failed to load workout", e))?;
    Ok(Json(record.into()))
}

/// Replace every editable field of a workout.
#[utoipa::path(
    put,
    path = "/workouts/{id}",
    params(("id" = Uuid, Path, description = "Workout id")),
    request_body = WorkoutRequest,
    responses(
        (status = 200, description = "Workout replaced", body = WorkoutResponse),
        (status = 400, description = "Invalid workout"),
        (status = 404, description = "No such workout for this user")
    )
)]
pub async fn update_workout_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(workout_id): Path<Uuid>,
    Json(req): Json<WorkoutRequest>,
) -> Result<Json<WorkoutResponse>, HandlerError> {
    let workout = req.into_domain().map_err(bad_request)?;
    let record = state
        .db
        .replace_workout(user_id, workout_id, workout)
        .await
        .map_err(|e| port_error("Failed to update workout", e))?;

    info!("User {} updated workout {}", user_id, record.id);
    Ok(Json(record.into()))
}

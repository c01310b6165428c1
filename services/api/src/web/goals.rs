//! services/api/src/web/goals.rs
//!
//! Handlers for weekly/monthly goals and their progress. Every view that
//! shows progress goes through `active_goal_progress`, which calls the core
//! evaluator once per active goal.

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
use workout_log_core::domain::{DomainError, Goal, GoalPatch, NewGoal, TargetValue, WorkoutRecord};
use workout_log_core::progress::{evaluate_goal_progress, GoalProgress};

use crate::web::rest::{bad_request, port_error, HandlerError};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct GoalRequest {
    /// `weekly` or `monthly`.
    #[serde(rename = "type")]
    pub goal_type: String,
    pub target_value: f64,
    /// `workouts` or `hours`.
    pub unit: String,
    pub start_date: DateTime<Utc>,
}

impl GoalRequest {
    fn into_domain(self) -> Result<NewGoal, DomainError> {
        Ok(NewGoal {
            cadence: self.goal_type.parse()?,
            target_value: TargetValue::new(self.target_value)?,
            unit: self.unit.parse()?,
            start_date: self.start_date,
        })
    }
}

/// Partial update; omitted fields are left as they are. Setting
/// `is_active` to false retires the goal.
#[derive(Deserialize, ToSchema, Default)]
pub struct UpdateGoalRequest {
    #[serde(rename = "type")]
    pub goal_type: Option<String>,
    pub target_value: Option<f64>,
    pub unit: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

impl UpdateGoalRequest {
    fn into_domain(self) -> Result<GoalPatch, DomainError> {
        Ok(GoalPatch {
            cadence: self.goal_type.map(|t| t.parse()).transpose()?,
            target_value: self.target_value.map(TargetValue::new).transpose()?,
            unit: self.unit.map(|u| u.parse()).transpose()?,
            start_date: self.start_date,
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GoalResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub goal_type: String,
    pub target_value: f64,
    pub unit: String,
    pub start_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Goal> for GoalResponse {
    fn from(g: Goal) -> Self {
        Self {
            id: g.id,
            goal_type: g.cadence.to_string(),
            target_value: g.target_value.get(),
            unit: g.unit.to_string(),
            start_date: g.start_date,
            is_active: g.is_active,
            created_at: g.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GoalsResponse {
    pub goals: Vec<GoalResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProgressResponse {
    /// Not capped: may exceed `target_value`.
    pub current: f64,
    pub target_value: f64,
    /// Capped at 100, unrounded.
    pub percentage: f64,
    pub is_completed: bool,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

impl From<GoalProgress> for ProgressResponse {
    fn from(p: GoalProgress) -> Self {
        Self {
            current: p.current,
            target_value: p.target_value,
            percentage: p.percentage,
            is_completed: p.is_completed,
            period_start: p.period.start,
            period_end: p.period.end,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GoalProgressEntry {
    pub goal: GoalResponse,
    pub progress: ProgressResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GoalProgressListResponse {
    pub goals: Vec<GoalProgressEntry>,
}

//=========================================================================================
// Shared Progress Evaluation
//=========================================================================================

/// Evaluates each of the user's active goals against `workouts` at the
/// clock's current instant.
pub(crate) async fn active_goal_progress(
    state: &AppState,
    user_id: Uuid,
    workouts: &[WorkoutRecord],
) -> Result<Vec<GoalProgressEntry>, HandlerError> {
    let goals = state
        .db
        .list_active_goals(user_id)
        .await
        .map_err(|e| port_error("Failed to load goals", e))?;

    let now = state.local_now();
    Ok(goals
        .into_iter()
        .map(|goal| {
            let progress = evaluate_goal_progress(&goal, workouts, now);
            GoalProgressEntry {
                goal: goal.into(),
                progress: progress.into(),
            }
        })
        .collect())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Create a goal, retiring any active goal of the same type.
#[utoipa::path(
    post,
    path = "/goals",
    request_body = GoalRequest,
    responses(
        (status = 201, description = "Goal created", body = GoalResponse),
        (status = 400, description = "Invalid goal"),
        (status = 401, description = "Missing or invalid session")
    )
)]
pub async fn add_goal_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<GoalRequest>,
) -> Result<(StatusCode, Json<GoalResponse>), HandlerError> {
    let goal = req.into_domain().map_err(bad_request)?;
    let created = state
        .db
        .create_goal(user_id, goal)
        .await
        .map_err(|e| port_error("Failed to create goal", e))?;

    info!("User {} set {} goal {}", user_id, created.cadence, created.id);
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// The user's active goals, newest first.
#[utoipa::path(
    get,
    path = "/goals",
    responses(
        (status = 200, description = "Active goals", body = GoalsResponse),
        (status = 401, description = "Missing or invalid session")
    )
)]
pub async fn list_goals_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<GoalsResponse>, HandlerError> {
    let goals = state
        .db
        .list_active_goals(user_id)
        .await
        .map_err(|e| port_error("Failed to load goals", e))?;

    Ok(Json(GoalsResponse {
        goals: goals.into_iter().map(Into::into).collect(),
    }))
}

/// Update some fields of a goal.
#[utoipa::path(
    patch,
    path = "/goals/{id}",
    params(("id" = Uuid, Path, description = "Goal id")),
    request_body = UpdateGoalRequest,
    responses(
        (status = 200, description = "Goal updated", body = GoalResponse),
        (status = 400, description = "Invalid field value"),
        (status = 404, description = "No such goal for this user")
    )
)]
pub async fn update_goal_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(goal_id): Path<Uuid>,
    Json(req): Json<UpdateGoalRequest>,
) -> Result<Json<GoalResponse>, HandlerError> {
    let patch = req.into_domain().map_err(bad_request)?;
    let updated = state
        .db
        .update_goal(user_id, goal_id, patch)
        .await
        .map_err(|e| port_error("Failed to update goal", e))?;

    info!("User {} updated goal {}", user_id, updated.id);
    Ok(Json(updated.into()))
}

/// Progress of every active goal in its current week or month.
#[utoipa::path(
    get,
    path = "/goals/progress",
    responses(
        (status = 200, description = "Progress per active goal", body = GoalProgressListResponse),
        (status = 401, description = "Missing or invalid session")
    )
)]
pub async fn goal_progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<GoalProgressListResponse>, HandlerError> {
    let workouts = state
        .db
        .list_workouts(user_id)
        .await
        .map_err(|e| port_error("Failed to load workouts", e))?;

    let goals = active_goal_progress(&state, user_id, &workouts).await?;
    Ok(Json(GoalProgressListResponse { goals }))
}

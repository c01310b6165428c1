//! services/api/src/web/analysis.rs
//!
//! The analysis page: history aggregates plus progress on active goals.

use axum::{extract::State, Extension, Json};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use workout_log_core::analysis::WorkoutSummary;

use crate::web::goals::{active_goal_progress, GoalProgressEntry};
use crate::web::rest::{port_error, HandlerError};
use crate::web::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryResponse {
    pub total_workouts: usize,
    pub total_minutes: u64,
    pub average_minutes: u64,
    /// Workout count per training type.
    pub type_distribution: BTreeMap<String, usize>,
    /// Minutes per `YYYY-MM` month.
    pub monthly_minutes: BTreeMap<String, u64>,
    /// Workout count per weekday, Monday first.
    pub weekday_pattern: Vec<usize>,
    pub this_month_workouts: usize,
    pub current_streak: usize,
}

impl From<WorkoutSummary> for SummaryResponse {
    fn from(s: WorkoutSummary) -> Self {
        Self {
            total_workouts: s.total_workouts,
            total_minutes: s.total_minutes,
            average_minutes: s.average_minutes,
            type_distribution: s.type_distribution,
            monthly_minutes: s.monthly_minutes,
            weekday_pattern: s.weekday_pattern.to_vec(),
            this_month_workouts: s.this_month_workouts,
            current_streak: s.current_streak,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalysisResponse {
    pub summary: SummaryResponse,
    pub goals: Vec<GoalProgressEntry>,
}

#[utoipa::path(
    get,
    path = "/analysis",
    responses(
        (status = 200, description = "History aggregates and goal progress", body = AnalysisResponse),
        (status = 401, description = "Missing or invalid session")
    )
)]
pub async fn analysis_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<AnalysisResponse>, HandlerError> {
    let workouts = state
        .db
        .list_workouts(user_id)
        .await
        .map_err(|e| port_error("Failed to load workouts", e))?;

    let summary = WorkoutSummary::compute(&workouts, state.local_now());
    let goals = active_goal_progress(&state, user_id, &workouts).await?;

    Ok(Json(AnalysisResponse {
        summary: summary.into(),
        goals,
    }))
}

//! crates/workout_log_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or clocks.

use crate::domain::{
    Goal, GoalPatch, NewGoal, NewTrainingType, NewWorkout, TrainingType, TrainingTypePatch,
    User, UserCredentials, WorkoutRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Invalid(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The record store. Every workout, goal and training-type method is scoped
/// to `user_id`; records owned by someone else are reported as `NotFound`.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users ---
    /// Fails with `Conflict` when the email is already registered.
    async fn create_user(&self, email: &str, name: &str, hashed_password: &str)
        -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    // --- Auth Sessions ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the owning user, or `Unauthorized` for unknown or expired sessions.
    async fn validate_auth_session(&self, session_id: &str, now: DateTime<Utc>)
        -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    /// Drops every session that expired at or before `now`.
    async fn delete_expired_auth_sessions(&self, now: DateTime<Utc>) -> PortResult<u64>;

    // --- Workouts ---
    async fn create_workout(&self, user_id: Uuid, workout: NewWorkout)
        -> PortResult<WorkoutRecord>;

    async fn get_workout(&self, user_id: Uuid, workout_id: Uuid) -> PortResult<WorkoutRecord>;

    /// Full replacement of the user-editable fields.
    async fn replace_workout(
        &self,
        user_id: Uuid,
        workout_id: Uuid,
        workout: NewWorkout,
    ) -> PortResult<WorkoutRecord>;

    /// All of the user's workouts, newest `date` first.
    async fn list_workouts(&self, user_id: Uuid) -> PortResult<Vec<WorkoutRecord>>;

    // --- Goals ---
    /// Deactivates the user's active goals of the same cadence and inserts the
    /// new one as active, atomically.
    async fn create_goal(&self, user_id: Uuid, goal: NewGoal) -> PortResult<Goal>;

    /// Active goals only, newest first.
    async fn list_active_goals(&self, user_id: Uuid) -> PortResult<Vec<Goal>>;

    /// Applies `patch` in place. If the result is active, every other active
    /// goal of the resulting cadence is deactivated.
    async fn update_goal(&self, user_id: Uuid, goal_id: Uuid, patch: GoalPatch)
        -> PortResult<Goal>;

    // --- Training Types ---
    async fn list_training_types(&self, user_id: Uuid) -> PortResult<Vec<TrainingType>>;

    /// Fails with `Conflict` when the user already has a type with that name.
    async fn create_training_type(
        &self,
        user_id: Uuid,
        training_type: NewTrainingType,
    ) -> PortResult<TrainingType>;

    async fn update_training_type(
        &self,
        user_id: Uuid,
        training_type_id: Uuid,
        patch: TrainingTypePatch,
    ) -> PortResult<TrainingType>;

    async fn delete_training_type(&self, user_id: Uuid, training_type_id: Uuid)
        -> PortResult<()>;
}

/// Source of the current instant, injectable so period windows are testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the host's wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

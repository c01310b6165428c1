//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;
use workout_log_core::domain::{
    Goal, GoalPatch, NewGoal, NewTrainingType, NewWorkout, TargetValue, TrainingType,
    TrainingTypePatch, User, UserCredentials, WorkoutRecord,
};
use workout_log_core::ports::{DatabaseService, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Maps unique-constraint violations to `Conflict`, everything else to `Unexpected`.
fn conflict_or_unexpected(e: sqlx::Error, what: &str) -> PortError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            PortError::Conflict(format!("{} already exists", what))
        }
        _ => unexpected(e),
    }
}

const ACTIVE_GOAL: &str = "An active goal of this type";

/// Serialises goal writes per user so a deactivate-then-write pair never
/// races another one on the one-active-goal index.
async fn lock_user_goals(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> PortResult<()> {
    sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
    Ok(())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    name: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            email: self.email,
            name: self.name,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    password_hash: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.id,
            email: self.email,
            hashed_password: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct WorkoutRow {
    id: Uuid,
    user_id: Uuid,
    training_time: i32,
    training_type: String,
    workout_date: DateTime<Utc>,
    sensations: String,
    created_at: DateTime<Utc>,
}
impl WorkoutRow {
    fn to_domain(self) -> WorkoutRecord {
        WorkoutRecord {
            id: self.id,
            user_id: self.user_id,
            // The column carries a CHECK (training_time > 0).
            training_time: u32::try_from(self.training_time).unwrap_or(0),
            training_type: self.training_type,
            date: self.workout_date,
            sensations: self.sensations,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct GoalRow {
    id: Uuid,
    user_id: Uuid,
    goal_type: String,
    target_value: f64,
    unit: String,
    start_date: DateTime<Utc>,
    is_active: bool,
    created_at: DateTime<Utc>,
}
impl GoalRow {
    fn to_domain(self) -> PortResult<Goal> {
        let invalid = |e: workout_log_core::DomainError| {
            PortError::Unexpected(format!("Stored goal {} is invalid: {}", self.id, e))
        };
        Ok(Goal {
            id: self.id,
            user_id: self.user_id,
            cadence: self.goal_type.parse().map_err(invalid)?,
            target_value: TargetValue::new(self.target_value).map_err(invalid)?,
            unit: self.unit.parse().map_err(invalid)?,
            start_date: self.start_date,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct TrainingTypeRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    emoji: String,
    color: String,
}
impl TrainingTypeRow {
    fn to_domain(self) -> TrainingType {
        TrainingType {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            emoji: self.emoji,
            color: self.color,
        }
    }
}

const WORKOUT_COLUMNS: &str =
    "id, user_id, training_time, training_type, workout_date, sensations, created_at";
const GOAL_COLUMNS: &str =
    "id, user_id, goal_type, target_value, unit, start_date, is_active, created_at";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    // --- Users ---

    async fn create_user(
        &self,
        email: &str,
        name: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, email, name, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING id, email, name, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(name)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_unexpected(e, "A user with this email"))?;
        Ok(record.to_domain())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, name, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound("User not found".to_string()),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    // --- Auth Sessions ---

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> PortResult<Uuid> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > $2",
        )
        .bind(session_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        user_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_expired_auth_sessions(&self, now: DateTime<Utc>) -> PortResult<u64> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected())
    }

    // --- Workouts ---

    async fn create_workout(
        &self,
        user_id: Uuid,
        workout: NewWorkout,
    ) -> PortResult<WorkoutRecord> {
        let row = sqlx::query_as::<_, WorkoutRow>(&format!(
            "INSERT INTO workouts (id, user_id, training_time, training_type, workout_date, sensations) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            WORKOUT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(training_time_column(workout.training_time)?)
        .bind(&workout.training_type)
        .bind(workout.date)
        .bind(&workout.sensations)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(row.to_domain())
    }

    async fn get_workout(&self, user_id: Uuid, workout_id: Uuid) -> PortResult<WorkoutRecord> {
        let row = sqlx::query_as::<_, WorkoutRow>(&format!(
            "SELECT {} FROM workouts WHERE id = $1 AND user_id = $2",
            WORKOUT_COLUMNS
        ))
        .bind(workout_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        row.map(WorkoutRow::to_domain)
            .ok_or_else(|| PortError::NotFound(format!("Workout {} not found", workout_id)))
    }

    async fn replace_workout(
        &self,
        user_id: Uuid,
        workout_id: Uuid,
        workout: NewWorkout,
    ) -> PortResult<WorkoutRecord> {
        let row = sqlx::query_as::<_, WorkoutRow>(&format!(
            "UPDATE workouts SET training_time = $3, training_type = $4, workout_date = $5, sensations = $6 \
             WHERE id = $1 AND user_id = $2 RETURNING {}",
            WORKOUT_COLUMNS
        ))
        .bind(workout_id)
        .bind(user_id)
        .bind(training_time_column(workout.training_time)?)
        .bind(&workout.training_type)
        .bind(workout.date)
        .bind(&workout.sensations)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        row.map(WorkoutRow::to_domain)
            .ok_or_else(|| PortError::NotFound(format!("Workout {} not found", workout_id)))
    }

    async fn list_workouts(&self, user_id: Uuid) -> PortResult<Vec<WorkoutRecord>> {
        let rows = sqlx::query_as::<_, WorkoutRow>(&format!(
            "SELECT {} FROM workouts WHERE user_id = $1 ORDER BY workout_date DESC",
            WORKOUT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(rows.into_iter().map(WorkoutRow::to_domain).collect())
    }

    // --- Goals ---

    async fn create_goal(&self, user_id: Uuid, goal: NewGoal) -> PortResult<Goal> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        lock_user_goals(&mut tx, user_id).await?;

        sqlx::query(
            "UPDATE goals SET is_active = FALSE WHERE user_id = $1 AND goal_type = $2 AND is_active",
        )
        .bind(user_id)
        .bind(goal.cadence.as_str())
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        let row = sqlx::query_as::<_, GoalRow>(&format!(
            "INSERT INTO goals (id, user_id, goal_type, target_value, unit, start_date, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, TRUE) RETURNING {}",
            GOAL_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(goal.cadence.as_str())
        .bind(goal.target_value.get())
        .bind(goal.unit.as_str())
        .bind(goal.start_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_or_unexpected(e, ACTIVE_GOAL))?;

        tx.commit().await.map_err(unexpected)?;
        row.to_domain()
    }

    async fn list_active_goals(&self, user_id: Uuid) -> PortResult<Vec<Goal>> {
        let rows = sqlx::query_as::<_, GoalRow>(&format!(
            "SELECT {} FROM goals WHERE user_id = $1 AND is_active ORDER BY created_at DESC",
            GOAL_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        rows.into_iter().map(GoalRow::to_domain).collect()
    }

    async fn update_goal(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        patch: GoalPatch,
    ) -> PortResult<Goal> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        lock_user_goals(&mut tx, user_id).await?;

        let existing = sqlx::query_as::<_, GoalRow>(&format!(
            "SELECT {} FROM goals WHERE id = $1 AND user_id = $2 FOR UPDATE",
            GOAL_COLUMNS
        ))
        .bind(goal_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Goal {} not found", goal_id)))?
        .to_domain()?;

        let updated = existing.apply_patch(&patch);

        if updated.is_active {
            sqlx::query(
                "UPDATE goals SET is_active = FALSE \
                 WHERE user_id = $1 AND goal_type = $2 AND is_active AND id <> $3",
            )
            .bind(user_id)
            .bind(updated.cadence.as_str())
            .bind(goal_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        let row = sqlx::query_as::<_, GoalRow>(&format!(
            "UPDATE goals SET goal_type = $2, target_value = $3, unit = $4, start_date = $5, is_active = $6 \
             WHERE id = $1 RETURNING {}",
            GOAL_COLUMNS
        ))
        .bind(goal_id)
        .bind(updated.cadence.as_str())
        .bind(updated.target_value.get())
        .bind(updated.unit.as_str())
        .bind(updated.start_date)
        .bind(updated.is_active)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_or_unexpected(e, ACTIVE_GOAL))?;

        tx.commit().await.map_err(unexpected)?;
        row.to_domain()
    }

    // --- Training Types ---

    async fn list_training_types(&self, user_id: Uuid) -> PortResult<Vec<TrainingType>> {
        let rows = sqlx::query_as::<_, TrainingTypeRow>(
            "SELECT id, user_id, name, emoji, color FROM training_types \
             WHERE user_id = $1 ORDER BY created_at ASC, name ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(rows.into_iter().map(TrainingTypeRow::to_domain).collect())
    }

    async fn create_training_type(
        &self,
        user_id: Uuid,
        training_type: NewTrainingType,
    ) -> PortResult<TrainingType> {
        let row = sqlx::query_as::<_, TrainingTypeRow>(
            "INSERT INTO training_types (id, user_id, name, emoji, color) VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, user_id, name, emoji, color",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&training_type.name)
        .bind(&training_type.emoji)
        .bind(&training_type.color)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_unexpected(e, "A training type with this name"))?;
        Ok(row.to_domain())
    }

    async fn update_training_type(
        &self,
        user_id: Uuid,
        training_type_id: Uuid,
        patch: TrainingTypePatch,
    ) -> PortResult<TrainingType> {
        let row = sqlx::query_as::<_, TrainingTypeRow>(
            "UPDATE training_types SET name = COALESCE($3, name), emoji = COALESCE($4, emoji), \
             color = COALESCE($5, color) WHERE id = $1 AND user_id = $2 \
             RETURNING id, user_id, name, emoji, color",
        )
        .bind(training_type_id)
        .bind(user_id)
        .bind(patch.name)
        .bind(patch.emoji)
        .bind(patch.color)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_or_unexpected(e, "A training type with this name"))?;
        row.map(TrainingTypeRow::to_domain).ok_or_else(|| {
            PortError::NotFound(format!("Training type {} not found", training_type_id))
        })
    }

    async fn delete_training_type(
        &self,
        user_id: Uuid,
        training_type_id: Uuid,
    ) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM training_types WHERE id = $1 AND user_id = $2")
            .bind(training_type_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Training type {} not found",
                training_type_id
            )));
        }
        Ok(())
    }
}

fn training_time_column(minutes: u32) -> PortResult<i32> {
    i32::try_from(minutes)
        .map_err(|_| PortError::Invalid(format!("Training time {} is too large", minutes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use workout_log_core::domain::{GoalCadence, GoalUnit};

    async fn adapter() -> DbAdapter {
        let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&url)
            .await
            .unwrap();
        let db = DbAdapter::new(pool);
        db.run_migrations().await.unwrap();
        db
    }

    fn weekly(target: f64) -> NewGoal {
        NewGoal {
            cadence: GoalCadence::Weekly,
            target_value: TargetValue::new(target).unwrap(),
            unit: GoalUnit::Workouts,
            start_date: Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    #[ignore = "needs a Postgres database at TEST_DATABASE_URL"]
    async fn concurrent_goal_creation_leaves_one_active_goal() {
        let db = Arc::new(adapter().await);
        let email = format!("{}@example.com", Uuid::new_v4());
        let user = db.create_user(&email, "Ana", "hash").await.unwrap();

        let writes: Vec<_> = (1..=8)
            .map(|n| {
                let db = db.clone();
                tokio::spawn(async move { db.create_goal(user.id, weekly(f64::from(n))).await })
            })
            .collect();
        for write in writes {
            write.await.unwrap().unwrap();
        }

        let active = db.list_active_goals(user.id).await.unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    #[ignore = "needs a Postgres database at TEST_DATABASE_URL"]
    async fn reactivating_a_goal_retires_the_current_one() {
        let db = adapter().await;
        let email = format!("{}@example.com", Uuid::new_v4());
        let user = db.create_user(&email, "Ana", "hash").await.unwrap();

        let first = db.create_goal(user.id, weekly(3.0)).await.unwrap();
        let second = db.create_goal(user.id, weekly(4.0)).await.unwrap();

        let patch = GoalPatch {
            is_active: Some(true),
            ..Default::default()
        };
        db.update_goal(user.id, first.id, patch).await.unwrap();

        let active = db.list_active_goals(user.id).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, first.id);
        assert_ne!(active[0].id, second.id);
    }
}

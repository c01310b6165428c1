//! services/api/src/adapters/memory.rs
//!
//! An in-memory implementation of the `DatabaseService` port. Used by the
//! handler tests and selectable at runtime with `DATABASE_URL=memory` for
//! local runs without Postgres. Nothing survives a restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use workout_log_core::domain::{
    AuthSession, Goal, GoalPatch, NewGoal, NewTrainingType, NewWorkout, TrainingType,
    TrainingTypePatch, User, UserCredentials, WorkoutRecord,
};
use workout_log_core::ports::{Clock, DatabaseService, PortError, PortResult};

struct StoredUser {
    user: User,
    hashed_password: String,
}

/// Rows are kept in insertion order.
#[derive(Default)]
struct Store {
    users: Vec<StoredUser>,
    sessions: Vec<AuthSession>,
    workouts: Vec<WorkoutRecord>,
    goals: Vec<Goal>,
    training_types: Vec<TrainingType>,
}

/// `created_at` stamps come from `clock`, as the database's `now()` would.
pub struct InMemoryDb {
    store: RwLock<Store>,
    clock: Arc<dyn Clock>,
}

impl InMemoryDb {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: RwLock::new(Store::default()),
            clock,
        }
    }
}

fn workout_not_found(id: Uuid) -> PortError {
    PortError::NotFound(format!("Workout {} not found", id))
}

fn training_type_not_found(id: Uuid) -> PortError {
    PortError::NotFound(format!("Training type {} not found", id))
}

fn duplicate_training_type() -> PortError {
    PortError::Conflict("A training type with this name already exists".to_string())
}

#[async_trait]
impl DatabaseService for InMemoryDb {
    // --- Users ---

    async fn create_user(
        &self,
        email: &str,
        name: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let mut store = self.store.write().await;
        if store.users.iter().any(|u| u.user.email == email) {
            return Err(PortError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
            created_at: self.clock.now(),
        };
        store.users.push(StoredUser {
            user: user.clone(),
            hashed_password: hashed_password.to_string(),
        });
        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let store = self.store.read().await;
        store
            .users
            .iter()
            .find(|u| u.user.id == user_id)
            .map(|u| u.user.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let store = self.store.read().await;
        store
            .users
            .iter()
            .find(|u| u.user.email == email)
            .map(|u| UserCredentials {
                user_id: u.user.id,
                email: u.user.email.clone(),
                hashed_password: u.hashed_password.clone(),
            })
            .ok_or_else(|| PortError::NotFound("User not found".to_string()))
    }

    // --- Auth Sessions ---

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut store = self.store.write().await;
        store.sessions.push(AuthSession {
            id: session_id.to_string(),
            user_id,
            expires_at,
        });
        Ok(())
    }

    async fn validate_auth_session(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> PortResult<Uuid> {
        let store = self.store.read().await;
        store
            .sessions
            .iter()
            .find(|s| s.id == session_id && s.expires_at > now)
            .map(|s| s.user_id)
            .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        let mut store = self.store.write().await;
        store.sessions.retain(|s| s.id != session_id);
        Ok(())
    }

    async fn delete_expired_auth_sessions(&self, now: DateTime<Utc>) -> PortResult<u64> {
        let mut store = self.store.write().await;
        let before = store.sessions.len();
        store.sessions.retain(|s| s.expires_at > now);
        Ok((before - store.sessions.len()) as u64)
    }

    // --- Workouts ---

    async fn create_workout(
        &self,
        user_id: Uuid,
        workout: NewWorkout,
    ) -> PortResult<WorkoutRecord> {
        let record = WorkoutRecord {
            id: Uuid::new_v4(),
            user_id,
            training_time: workout.training_time,
            training_type: workout.training_type,
            date: workout.date,
            sensations: workout.sensations,
            created_at: self.clock.now(),
        };
        self.store.write().await.workouts.push(record.clone());
        Ok(record)
    }

    async fn get_workout(&self, user_id: Uuid, workout_id: Uuid) -> PortResult<WorkoutRecord> {
        let store = self.store.read().await;
        store
            .workouts
            .iter()
            .find(|w| w.id == workout_id && w.user_id == user_id)
            .cloned()
            .ok_or_else(|| workout_not_found(workout_id))
    }

    async fn replace_workout(
        &self,
        user_id: Uuid,
        workout_id: Uuid,
        workout: NewWorkout,
    ) -> PortResult<WorkoutRecord> {
        let mut store = self.store.write().await;
        let record = store
            .workouts
            .iter_mut()
            .find(|w| w.id == workout_id && w.user_id == user_id)
            .ok_or_else(|| workout_not_found(workout_id))?;
        record.training_time = workout.training_time;
        record.training_type = workout.training_type;
        record.date = workout.date;
        record.sensations = workout.sensations;
        Ok(record.clone())
    }

    async fn list_workouts(&self, user_id: Uuid) -> PortResult<Vec<WorkoutRecord>> {
        let store = self.store.read().await;
        let mut workouts: Vec<WorkoutRecord> = store
            .workouts
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect();
        workouts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(workouts)
    }

    // --- Goals ---

    async fn create_goal(&self, user_id: Uuid, goal: NewGoal) -> PortResult<Goal> {
        let mut store = self.store.write().await;
        for existing in store
            .goals
            .iter_mut()
            .filter(|g| g.user_id == user_id && g.cadence == goal.cadence)
        {
            existing.is_active = false;
        }
        let created = Goal {
            id: Uuid::new_v4(),
            user_id,
            cadence: goal.cadence,
            target_value: goal.target_value,
            unit: goal.unit,
            start_date: goal.start_date,
            is_active: true,
            created_at: self.clock.now(),
        };
        store.goals.push(created.clone());
        Ok(created)
    }

    async fn list_active_goals(&self, user_id: Uuid) -> PortResult<Vec<Goal>> {
        let store = self.store.read().await;
        let mut goals: Vec<Goal> = store
            .goals
            .iter()
            .rev()
            .filter(|g| g.user_id == user_id && g.is_active)
            .cloned()
            .collect();
        // Stable, so goals created in the same instant stay newest-inserted first.
        goals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(goals)
    }

    async fn update_goal(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        patch: GoalPatch,
    ) -> PortResult<Goal> {
        let mut store = self.store.write().await;
        let index = store
            .goals
            .iter()
            .position(|g| g.id == goal_id && g.user_id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("Goal {} not found", goal_id)))?;

        let updated = store.goals[index].clone().apply_patch(&patch);
        if updated.is_active {
            for other in store.goals.iter_mut().filter(|g| {
                g.user_id == user_id && g.cadence == updated.cadence && g.id != goal_id
            }) {
                other.is_active = false;
            }
        }
        store.goals[index] = updated.clone();
        Ok(updated)
    }

    // --- Training Types ---

    async fn list_training_types(&self, user_id: Uuid) -> PortResult<Vec<TrainingType>> {
        let store = self.store.read().await;
        Ok(store
            .training_types
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_training_type(
        &self,
        user_id: Uuid,
        training_type: NewTrainingType,
    ) -> PortResult<TrainingType> {
        let mut store = self.store.write().await;
        if store
            .training_types
            .iter()
            .any(|t| t.user_id == user_id && t.name == training_type.name)
        {
            return Err(duplicate_training_type());
        }
        let created = TrainingType {
            id: Uuid::new_v4(),
            user_id,
            name: training_type.name,
            emoji: training_type.emoji,
            color: training_type.color,
        };
        store.training_types.push(created.clone());
        Ok(created)
    }

    async fn update_training_type(
        &self,
        user_id: Uuid,
        training_type_id: Uuid,
        patch: TrainingTypePatch,
    ) -> PortResult<TrainingType> {
        let mut store = self.store.write().await;
        let index = store
            .training_types
            .iter()
            .position(|t| t.id == training_type_id && t.user_id == user_id)
            .ok_or_else(|| training_type_not_found(training_type_id))?;

        let updated = store.training_types[index].clone().apply_patch(&patch);
        if store
            .training_types
            .iter()
            .any(|t| t.user_id == user_id && t.id != training_type_id && t.name == updated.name)
        {
            return Err(duplicate_training_type());
        }
        store.training_types[index] = updated.clone();
        Ok(updated)
    }

    async fn delete_training_type(
        &self,
        user_id: Uuid,
        training_type_id: Uuid,
    ) -> PortResult<()> {
        let mut store = self.store.write().await;
        let before = store.training_types.len();
        store
            .training_types
            .retain(|t| !(t.id == training_type_id && t.user_id == user_id));
        if store.training_types.len() == before {
            return Err(training_type_not_found(training_type_id));
        }
        Ok(())
    }
}

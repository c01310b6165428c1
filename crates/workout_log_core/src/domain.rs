//! crates/workout_log_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Longest accepted training-type label, in characters.
pub const MAX_TRAINING_TYPE_LEN: usize = 50;

//=========================================================================================
// Domain Validation Errors
//=========================================================================================

/// Rejections raised when constructing domain values from untrusted input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("Target value must be a positive number, got {0}")]
    InvalidTargetValue(f64),
    #[error("Unknown goal type: {0}")]
    UnknownCadence(String),
    #[error("Unknown goal unit: {0}")]
    UnknownUnit(String),
    #[error("Training time must be at least 1 minute")]
    InvalidTrainingTime,
    #[error("Training type is required")]
    EmptyTrainingType,
    #[error("Training type must be at most 50 characters")]
    TrainingTypeTooLong,
    #[error("Sensations are required")]
    EmptySensations,
}

//=========================================================================================
// Users and Auth
//=========================================================================================

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a login session backing an opaque bearer token
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Workouts
//=========================================================================================

/// A single logged training session.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Duration in minutes, always at least 1.
    pub training_time: u32,
    pub training_type: String,
    pub date: DateTime<Utc>,
    pub sensations: String,
    pub created_at: DateTime<Utc>,
}

/// The user-supplied fields of a workout, used both for logging and for
/// full replacement on edit.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkout {
    pub training_time: u32,
    pub training_type: String,
    pub date: DateTime<Utc>,
    pub sensations: String,
}

impl NewWorkout {
    pub fn new(
        training_time: u32,
        training_type: &str,
        date: DateTime<Utc>,
        sensations: &str,
    ) -> Result<Self, DomainError> {
        if training_time == 0 {
            return Err(DomainError::InvalidTrainingTime);
        }
        let training_type = training_type.trim();
        if training_type.is_empty() {
            return Err(DomainError::EmptyTrainingType);
        }
        if training_type.chars().count() > MAX_TRAINING_TYPE_LEN {
            return Err(DomainError::TrainingTypeTooLong);
        }
        let sensations = sensations.trim();
        if sensations.is_empty() {
            return Err(DomainError::EmptySensations);
        }

        Ok(Self {
            training_time,
            training_type: training_type.to_string(),
            date,
            sensations: sensations.to_string(),
        })
    }
}

//=========================================================================================
// Goals
//=========================================================================================

/// How often a goal's progress resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoalCadence {
    Weekly,
    Monthly,
}

impl GoalCadence {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalCadence::Weekly => "weekly",
            GoalCadence::Monthly => "monthly",
        }
    }
}

impl FromStr for GoalCadence {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(GoalCadence::Weekly),
            "monthly" => Ok(GoalCadence::Monthly),
            other => Err(DomainError::UnknownCadence(other.to_string())),
        }
    }
}

impl fmt::Display for GoalCadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a goal's target value counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoalUnit {
    Workouts,
    Hours,
}

impl GoalUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalUnit::Workouts => "workouts",
            GoalUnit::Hours => "hours",
        }
    }
}

impl FromStr for GoalUnit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "workouts" => Ok(GoalUnit::Workouts),
            "hours" => Ok(GoalUnit::Hours),
            other => Err(DomainError::UnknownUnit(other.to_string())),
        }
    }
}

impl fmt::Display for GoalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A strictly positive, finite goal target.
///
/// This is the only way to put a number into a [`Goal`], so the evaluator
/// never sees a zero or negative target.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TargetValue(f64);

impl TargetValue {
    pub fn new(value: f64) -> Result<Self, DomainError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(DomainError::InvalidTargetValue(value))
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for TargetValue {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A recurring weekly or monthly target.
#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cadence: GoalCadence,
    pub target_value: TargetValue,
    pub unit: GoalUnit,
    pub start_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Goal {
    /// Returns the goal with every field present in `patch` overwritten.
    pub fn apply_patch(mut self, patch: &GoalPatch) -> Self {
        if let Some(cadence) = patch.cadence {
            self.cadence = cadence;
        }
        if let Some(target_value) = patch.target_value {
            self.target_value = target_value;
        }
        if let Some(unit) = patch.unit {
            self.unit = unit;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        self
    }
}

/// Fields needed to create a goal. New goals always start active.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    pub cadence: GoalCadence,
    pub target_value: TargetValue,
    pub unit: GoalUnit,
    pub start_date: DateTime<Utc>,
}

/// A partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalPatch {
    pub cadence: Option<GoalCadence>,
    pub target_value: Option<TargetValue>,
    pub unit: Option<GoalUnit>,
    pub start_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

//=========================================================================================
// Training-Type Taxonomy
//=========================================================================================

/// A user-defined training category shown alongside workouts.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingType {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub emoji: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTrainingType {
    pub name: String,
    pub emoji: String,
    pub color: String,
}

impl NewTrainingType {
    pub fn new(name: &str, emoji: &str, color: &str) -> Result<Self, DomainError> {
        Ok(Self {
            name: validate_training_type_name(name)?,
            emoji: emoji.trim().to_string(),
            color: color.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingTypePatch {
    pub name: Option<String>,
    pub emoji: Option<String>,
    pub color: Option<String>,
}

impl TrainingTypePatch {
    pub fn new(
        name: Option<&str>,
        emoji: Option<&str>,
        color: Option<&str>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            name: name.map(validate_training_type_name).transpose()?,
            emoji: emoji.map(|e| e.trim().to_string()),
            color: color.map(|c| c.trim().to_string()),
        })
    }
}

impl TrainingType {
    pub fn apply_patch(mut self, patch: &TrainingTypePatch) -> Self {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(emoji) = &patch.emoji {
            self.emoji = emoji.clone();
        }
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
        self
    }
}

fn validate_training_type_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::EmptyTrainingType);
    }
    if name.chars().count() > MAX_TRAINING_TYPE_LEN {
        return Err(DomainError::TrainingTypeTooLong);
    }
    Ok(name.to_string())
}

/// The taxonomy every new account starts with.
pub fn default_training_types() -> Vec<NewTrainingType> {
    [
        ("Strength", "💪", "from-red-500 to-pink-500"),
        ("Running", "🏃", "from-blue-500 to-cyan-500"),
        ("Fartlek", "🏃", "from-green-500 to-emerald-500"),
        ("Sprints", "⚡", "from-yellow-500 to-orange-500"),
        ("Cycling", "🚴", "from-purple-500 to-violet-500"),
        ("Swimming", "🏊", "from-cyan-500 to-blue-500"),
        ("Yoga", "🧘", "from-indigo-500 to-purple-500"),
        ("Pilates", "🤸", "from-pink-500 to-rose-500"),
        ("CrossFit", "🏋️", "from-orange-500 to-red-500"),
        ("Cardio", "❤️", "from-red-500 to-pink-500"),
        ("Other", "🏃", "from-gray-500 to-slate-500"),
    ]
    .into_iter()
    .map(|(name, emoji, color)| NewTrainingType {
        name: name.to_string(),
        emoji: emoji.to_string(),
        color: color.to_string(),
    })
    .collect()
}

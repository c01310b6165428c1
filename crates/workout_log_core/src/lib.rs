pub mod analysis;
pub mod domain;
pub mod ports;
pub mod progress;

pub use analysis::{current_streak, WorkoutSummary};
pub use domain::{
    default_training_types, AuthSession, DomainError, Goal, GoalCadence, GoalPatch, GoalUnit,
    NewGoal, NewTrainingType, NewWorkout, TargetValue, TrainingType, TrainingTypePatch, User,
    UserCredentials, WorkoutRecord,
};
pub use ports::{Clock, DatabaseService, FixedClock, PortError, PortResult, SystemClock};
pub use progress::{evaluate_goal_progress, GoalProgress, PeriodWindow};

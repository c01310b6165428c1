//! Shared fixtures for handler tests.

use crate::adapters::InMemoryDb;
use crate::config::Config;
use crate::web::state::AppState;
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;
use workout_log_core::ports::{Clock, FixedClock};

/// App state over an empty in-memory store with the clock frozen at `now`.
pub(crate) fn test_state(now: DateTime<Utc>) -> Arc<AppState> {
    test_state_with_offset(now, FixedOffset::east_opt(0).unwrap())
}

pub(crate) fn test_state_with_offset(now: DateTime<Utc>, utc_offset: FixedOffset) -> Arc<AppState> {
    let config = Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "memory".to_string(),
        log_level: Level::DEBUG,
        session_ttl_days: 30,
        utc_offset,
        cors_origin: "http://localhost:3000".to_string(),
    };
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(now));
    Arc::new(AppState {
        db: Arc::new(InMemoryDb::new(clock.clone())),
        config: Arc::new(config),
        clock,
    })
}

/// Registers a user straight through the port and returns its id.
pub(crate) async fn register_user(state: &AppState, email: &str) -> Uuid {
    state
        .db
        .create_user(email, "Test User", "not-a-real-hash")
        .await
        .unwrap()
        .id
}

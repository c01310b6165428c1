//! services/api/src/web/training_types.rs
//!
//! Per-user taxonomy of training types. Workouts store the type by name, so
//! renaming or deleting a type never touches logged workouts.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use workout_log_core::domain::{NewTrainingType, TrainingType, TrainingTypePatch};

use crate::web::rest::{bad_request, port_error, HandlerError};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct TrainingTypeRequest {
    pub name: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Deserialize, ToSchema, Default)]
pub struct UpdateTrainingTypeRequest {
    pub name: Option<String>,
    pub emoji: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrainingTypeResponse {
    pub id: Uuid,
    pub name: String,
    pub emoji: String,
    pub color: String,
}

impl From<TrainingType> for TrainingTypeResponse {
    fn from(t: TrainingType) -> Self {
        Self {
            id: t.id,
            name: t.name,
            emoji: t.emoji,
            color: t.color,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrainingTypesResponse {
    pub training_types: Vec<TrainingTypeResponse>,
}

//=========================================================================================
// Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/training-types",
    responses(
        (status = 200, description = "The user's training types", body = TrainingTypesResponse),
        (status = 401, description = "Missing or invalid session")
    )
)]
pub async fn list_training_types_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<TrainingTypesResponse>, HandlerError> {
    let types = state
        .db
        .list_training_types(user_id)
        .await
        .map_err(|e| port_error("Failed to load training types", e))?;

    Ok(Json(TrainingTypesResponse {
        training_types: types.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/training-types",
    request_body = TrainingTypeRequest,
    responses(
        (status = 201, description = "Training type created", body = TrainingTypeResponse),
        (status = 400, description = "Invalid name"),
        (status = 409, description = "Name already in use")
    )
)]
pub async fn add_training_type_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<TrainingTypeRequest>,
) -> Result<(StatusCode, Json<TrainingTypeResponse>), HandlerError> {
    let new_type = NewTrainingType::new(&req.name, &req.emoji, &req.color).map_err(bad_request)?;
    let created = state
        .db
        .create_training_type(user_id, new_type)
        .await
        .map_err(|e| port_error("Failed to create training type", e))?;

    info!("User {} added training type '{}'", user_id, created.name);
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    patch,
    path = "/training-types/{id}",
    params(("id" = Uuid, Path, description = "Training type id")),
    request_body = UpdateTrainingTypeRequest,
    responses(
        (status = 200, description = "Training type updated", body = TrainingTypeResponse),
        (status = 400, description = "Invalid name"),
        (status = 404, description = "No such training type for this user"),
        (status = 409, description = "Name already in use")
    )
)]
pub async fn update_training_type_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(training_type_id): Path<Uuid>,
    Json(req): Json<UpdateTrainingTypeRequest>,
) -> Result<Json<TrainingTypeResponse>, HandlerError> {
    let patch = TrainingTypePatch::new(
        req.name.as_deref(),
        req.emoji.as_deref(),
        req.color.as_deref(),
    )
    .map_err(bad_request)?;

    let updated = state
        .db
        .update_training_type(user_id, training_type_id, patch)
        .await
        .map_err(|e| port_error("Failed to update training type", e))?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/training-types/{id}",
    params(("id" = Uuid, Path, description = "Training type id")),
    responses(
        (status = 204, description = "Training type deleted"),
        (status = 404, description = "No such training type for this user")
    )
)]
pub async fn delete_training_type_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(training_type_id): Path<Uuid>,
) -> Result<StatusCode, HandlerError> {
    state
        .db
        .delete_training_type(user_id, training_type_id)
        .await
        .map_err(|e| port_error("Failed to delete training type", e))?;

    info!("User {} deleted training type {}", user_id, training_type_id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::test_support::{register_user, test_state};
    use chrono::Utc;

    fn request(name: &str) -> TrainingTypeRequest {
        TrainingTypeRequest {
            name: name.to_string(),
            emoji: "🥊".to_string(),
            color: "from-red-500 to-pink-500".to_string(),
        }
    }

    #[tokio::test]
    async fn names_are_validated_and_unique_per_user() {
        let state = test_state(Utc::now());
        let ana = register_user(&state, "ana@example.com").await;
        let bob = register_user(&state, "bob@example.com").await;

        let (status, Json(created)) =
            add_training_type_handler(State(state.clone()), Extension(ana), Json(request(" Boxing ")))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.name, "Boxing");

        let err = add_training_type_handler(State(state.clone()), Extension(ana), Json(request("Boxing")))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);

        let err = add_training_type_handler(State(state.clone()), Extension(ana), Json(request("   ")))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        let err = add_training_type_handler(
            State(state.clone()),
            Extension(ana),
            Json(request(&"x".repeat(51))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        add_training_type_handler(State(state), Extension(bob), Json(request("Boxing")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_and_delete_are_scoped_to_the_owner() {
        let state = test_state(Utc::now());
        let ana = register_user(&state, "ana@example.com").await;
        let bob = register_user(&state, "bob@example.com").await;

        let (_, Json(created)) =
            add_training_type_handler(State(state.clone()), Extension(ana), Json(request("Boxing")))
                .await
                .unwrap();

        let rename = || UpdateTrainingTypeRequest {
            name: Some("Kickboxing".to_string()),
            ..Default::default()
        };
        let err = update_training_type_handler(
            State(state.clone()),
            Extension(bob),
            Path(created.id),
            Json(rename()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);

        let Json(updated) = update_training_type_handler(
            State(state.clone()),
            Extension(ana),
            Path(created.id),
            Json(rename()),
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Kickboxing");
        assert_eq!(updated.emoji, "🥊");

        let err = delete_training_type_handler(State(state.clone()), Extension(bob), Path(created.id))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);

        let status = delete_training_type_handler(State(state.clone()), Extension(ana), Path(created.id))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(list) = list_training_types_handler(State(state), Extension(ana)).await.unwrap();
        assert!(list.training_types.is_empty());
    }
}

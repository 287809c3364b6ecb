//! User Handlers

use axum::{extract::State, Json};

use crate::application::dto::response::PersonResponse;
use crate::application::services::{UserService, UserServiceImpl};
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Every registered user
pub async fn list_people(State(state): State<AppState>) -> Result<Json<Vec<PersonResponse>>, AppError> {
    let user_service = UserServiceImpl::new(state.users.clone());

    let people = user_service
        .list_people()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(people.into_iter().map(PersonResponse::from).collect()))
}

use crate::{
    api::error::ApiError,
    application::{Application, ApplicationError, ProblemDraft},
};

use axum::{
    Json,
    extract::{Path, State},
};
use mtd_core::model::problem::{Problem, ProblemId};
use uuid::Uuid;

pub async fn list(State(state): State<Application>) -> Result<Json<Vec<Problem>>, ApiError> {
    let problems = state.problems.list().await?;
    Ok(Json(problems))
}

pub async fn show(State(state): State<Application>, Path(id): Path<Uuid>) -> Result<Json<Problem>, ApiError> {
    let problem = state
        .problems
        .find(ProblemId(id))
        .await?
        .ok_or(ApplicationError::NotFound(id))?;
    Ok(Json(problem))
}

pub async fn create(
    State(state): State<Application>,
    Json(draft): Json<ProblemDraft>,
) -> Result<Json<Problem>, ApiError> {
    let created = state.problems.create(draft).await?;
    Ok(Json(created))
}

pub async fn update(
    State(state): State<Application>,
    Path(id): Path<Uuid>,
    Json(draft): Json<ProblemDraft>,
) -> Result<Json<Problem>, ApiError> {
    let updated = state.problems.update(ProblemId(id), draft).await?;
    Ok(Json(updated))
}

pub async fn remove(State(state): State<Application>, Path(id): Path<Uuid>) -> Result<(), ApiError> {
    state.problems.delete(ProblemId(id)).await?;
    Ok(())
}

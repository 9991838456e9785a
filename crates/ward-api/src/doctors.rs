//! Handlers for `/doctors` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/doctors` | Optional `?role=human\|veterinarian`; public profiles only |
//! | `GET`  | `/doctors/:id/conversations` | Subjects with chat history, most recent first |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use ward_core::{
  doctor::{DoctorId, DoctorProfile, DoctorRole},
  store::{MessageLog as _, RecordStore as _},
  subject::SubjectId,
};
use ward_dispatch::Store;

use crate::{ApiState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub role: Option<DoctorRole>,
}

/// `GET /doctors[?role=<role>]` — the chat-partner picker for patients.
/// Credential hashes never leave the store; only profiles are serialized.
pub async fn list<S: Store>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<DoctorProfile>>, ApiError> {
  let doctors = state
    .store
    .list_doctors(params.role)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(doctors.iter().map(|d| d.profile()).collect()))
}

// ─── Conversations ────────────────────────────────────────────────────────────

/// `GET /doctors/:id/conversations` — the doctor's chat sidebar.
pub async fn conversations<S: Store>(
  State(state): State<ApiState<S>>,
  Path(id): Path<DoctorId>,
) -> Result<Json<Vec<SubjectId>>, ApiError> {
  state
    .store
    .get_doctor(&id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("doctor {id} not found")))?;

  let partners = state
    .store
    .conversation_partners(&id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(partners))
}

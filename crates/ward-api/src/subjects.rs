//! Handlers for `/subjects` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/subjects` | Optional `?kind=human\|animal` |
//! | `POST`   | `/subjects` | Body: tagged intake form; dispatches the intake alert |
//! | `GET`    | `/subjects/:id` | 404 if not found |
//! | `DELETE` | `/subjects/:id` | Administrative clear |
//! | `GET`    | `/subjects/:id/queue` | Waiting-queue position estimate |
//! | `POST`   | `/subjects/:id/prescription` | Body: `{"text":...,"doctor_id":...}` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use ward_core::{
  doctor::DoctorId,
  store::RecordStore as _,
  subject::{IntakeDetails, SubjectId, SubjectKind, SubjectRecord, SubjectStatus},
};
use ward_dispatch::Store;

use crate::{ApiState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub kind: Option<SubjectKind>,
}

/// `GET /subjects[?kind=<kind>]` — newest first.
pub async fn list<S: Store>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<SubjectRecord>>, ApiError> {
  let subjects = state
    .store
    .list_subjects(params.kind)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(subjects))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct IntakeResponse {
  pub subject:              SubjectRecord,
  /// Emergency labels triggered by the submitted vitals, empty when none.
  pub emergency_conditions: Vec<&'static str>,
}

/// `POST /subjects` — body is the tagged intake form.
///
/// Persists the record and alerts the matching doctor-role group.
pub async fn create<S: Store>(
  State(state): State<ApiState<S>>,
  Json(intake): Json<IntakeDetails>,
) -> Result<impl IntoResponse, ApiError> {
  let record = state
    .dispatcher
    .intake(intake)
    .await
    .map_err(ApiError::store)?;

  let emergency_conditions = record.intake.emergency_conditions();
  Ok((
    StatusCode::CREATED,
    Json(IntakeResponse {
      subject: record,
      emergency_conditions,
    }),
  ))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /subjects/:id`
pub async fn get_one<S: Store>(
  State(state): State<ApiState<S>>,
  Path(id): Path<SubjectId>,
) -> Result<Json<SubjectRecord>, ApiError> {
  let subject = state
    .store
    .get_subject(&id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {id} not found")))?;
  Ok(Json(subject))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /subjects/:id` — explicit administrative clear.
pub async fn delete_one<S: Store>(
  State(state): State<ApiState<S>>,
  Path(id): Path<SubjectId>,
) -> Result<impl IntoResponse, ApiError> {
  let deleted = state
    .store
    .delete_subject(&id)
    .await
    .map_err(ApiError::store)?;

  if !deleted {
    return Err(ApiError::NotFound(format!("subject {id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}

// ─── Queue position ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct QueueStatus {
  /// 1-based position among waiting subjects of the same kind; 0 once
  /// prescribed.
  pub position:               usize,
  pub waiting_total:          usize,
  pub estimated_wait_minutes: usize,
}

/// `GET /subjects/:id/queue`
pub async fn queue_position<S: Store>(
  State(state): State<ApiState<S>>,
  Path(id): Path<SubjectId>,
) -> Result<Json<QueueStatus>, ApiError> {
  let subject = state
    .store
    .get_subject(&id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {id} not found")))?;

  let waiting: Vec<SubjectRecord> = state
    .store
    .list_subjects(Some(subject.kind()))
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .filter(|r| r.status == SubjectStatus::Waiting)
    .collect();

  let position = if subject.status == SubjectStatus::Waiting {
    1 + waiting
      .iter()
      .filter(|r| r.created_at < subject.created_at)
      .count()
  } else {
    0
  };

  Ok(Json(QueueStatus {
    position,
    waiting_total: waiting.len(),
    // The kiosk's rule of thumb: five minutes per patient ahead.
    estimated_wait_minutes: position.saturating_sub(1) * 5,
  }))
}

// ─── Prescribe ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PrescribeBody {
  pub text:      String,
  pub doctor_id: DoctorId,
}

/// `POST /subjects/:id/prescription`
///
/// Attaches the prescription and notifies the subject's personal channel on
/// the waiting → prescribed transition.
pub async fn prescribe<S: Store>(
  State(state): State<ApiState<S>>,
  Path(id): Path<SubjectId>,
  Json(body): Json<PrescribeBody>,
) -> Result<Json<SubjectRecord>, ApiError> {
  state
    .store
    .get_subject(&id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {id} not found")))?;

  let doctor = state
    .store
    .get_doctor(&body.doctor_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("doctor {} not found", body.doctor_id))
    })?;

  let record = state
    .dispatcher
    .write_prescription(&id, body.text, &doctor)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(record))
}

//! Handlers for `/messages` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/messages` | `?subject_id` and `?doctor_id` required |
//! | `POST` | `/messages` | Body: [`SendBody`]; 400 when both text and image are missing |

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use ward_core::{
  doctor::DoctorId,
  message::{ImagePayload, Message, NewMessage, SenderRole},
  store::{MessageLog as _, RecordStore as _},
  subject::SubjectId,
};
use ward_dispatch::Store;

use crate::{ApiState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub subject_id: SubjectId,
  pub doctor_id:  DoctorId,
}

/// `GET /messages?subject_id=<id>&doctor_id=<id>` — the conversation in
/// send order. An unknown pair yields an empty list.
pub async fn list<S: Store>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Message>>, ApiError> {
  let messages = state
    .store
    .list(&params.subject_id, &params.doctor_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(messages))
}

// ─── Send ─────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /messages`.
#[derive(Debug, Deserialize)]
pub struct SendBody {
  pub subject_id: SubjectId,
  pub doctor_id:  DoctorId,
  pub sender:     SenderRole,
  pub text:       Option<String>,
  pub image:      Option<ImagePayload>,
}

/// `POST /messages` — appends to the log, then notifies the conversation
/// channel and both participants' personal channels. Returns 201 + the
/// stored message.
pub async fn send<S: Store>(
  State(state): State<ApiState<S>>,
  Json(body): Json<SendBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = NewMessage {
    subject_id: body.subject_id,
    doctor_id:  body.doctor_id,
    sender:     body.sender,
    body:       body.text,
    image:      body.image,
  };

  // Rejected synchronously and reported to the sender only.
  if !input.has_content() {
    return Err(ApiError::BadRequest(
      "message needs text or an image".to_string(),
    ));
  }

  state
    .store
    .get_subject(&input.subject_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("subject {} not found", input.subject_id))
    })?;
  state
    .store
    .get_doctor(&input.doctor_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("doctor {} not found", input.doctor_id))
    })?;

  let message = state
    .dispatcher
    .send_message(input)
    .await
    .map_err(ApiError::store)?;

  Ok((StatusCode::CREATED, Json(message)))
}

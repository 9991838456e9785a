//! Error type for `ward-store-sqlite`.

use thiserror::Error;
use ward_core::{doctor::DoctorId, subject::SubjectId};

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] ward_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// Attempted to prescribe for a subject that was not found.
  #[error("subject not found: {0}")]
  SubjectNotFound(SubjectId),

  #[error("doctor not found: {0}")]
  DoctorNotFound(DoctorId),

  #[error("username already registered: {0:?}")]
  UsernameTaken(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

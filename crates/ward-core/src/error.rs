//! Error types for `ward-core`.

use thiserror::Error;

use crate::{doctor::DoctorId, subject::SubjectId};

#[derive(Debug, Error)]
pub enum Error {
  /// A message must carry text, an image, or both.
  #[error("message has neither text nor image content")]
  EmptyMessage,

  #[error("subject not found: {0}")]
  SubjectNotFound(SubjectId),

  #[error("doctor not found: {0}")]
  DoctorNotFound(DoctorId),

  #[error("username already registered: {0:?}")]
  UsernameTaken(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

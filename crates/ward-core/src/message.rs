//! Message types — the unit of the append-only conversation log.
//!
//! A message belongs to exactly one (subject, doctor) pair. Once appended it
//! is never updated or reordered; a conversation is only ever a query over
//! the log, never a stored entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{doctor::DoctorId, subject::SubjectId};

// ─── Sender ──────────────────────────────────────────────────────────────────

/// Which side of the conversation authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
  Subject,
  Doctor,
}

// ─── Image payload ───────────────────────────────────────────────────────────

/// An image attached to a message; the blob is opaque to the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePayload {
  pub media_type:   String,
  /// Base64-encoded image bytes, exactly as submitted by the kiosk camera.
  pub data:         String,
  /// SHA-256 hex digest of `data`; recomputed on ingest, not trusted from
  /// the client.
  #[serde(default)]
  pub content_hash: String,
}

// ─── Message ─────────────────────────────────────────────────────────────────

/// A persisted chat message.
///
/// `message_id` is monotonic within the log. Within a (subject, doctor) pair
/// messages are totally ordered by `sent_at`, ties broken by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
  pub message_id: i64,
  pub subject_id: SubjectId,
  pub doctor_id:  DoctorId,
  pub sender:     SenderRole,
  pub body:       Option<String>,
  pub image:      Option<ImagePayload>,
  /// Server-assigned; never changes after the append.
  pub sent_at:    DateTime<Utc>,
}

// ─── NewMessage ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::MessageLog::append`]. `message_id` and `sent_at`
/// are always assigned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
  pub subject_id: SubjectId,
  pub doctor_id:  DoctorId,
  pub sender:     SenderRole,
  pub body:       Option<String>,
  pub image:      Option<ImagePayload>,
}

impl NewMessage {
  /// Convenience constructor for a plain text message.
  pub fn text(
    subject_id: SubjectId,
    doctor_id: DoctorId,
    sender: SenderRole,
    body: impl Into<String>,
  ) -> Self {
    Self {
      subject_id,
      doctor_id,
      sender,
      body: Some(body.into()),
      image: None,
    }
  }

  /// A message must carry text, an image, or both.
  pub fn has_content(&self) -> bool {
    self.body.as_deref().is_some_and(|b| !b.is_empty())
      || self.image.is_some()
  }
}

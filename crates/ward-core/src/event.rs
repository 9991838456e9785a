//! The closed set of notification events.
//!
//! Events are ephemeral: constructed by the dispatcher after a successful
//! persistence step (or, for typing, from a live connection), routed through
//! channels, and never stored. Delivery is at-most-once with no redelivery —
//! the message log remains the durable source of truth and a client that
//! missed an event re-fetches the conversation.

use serde::{Deserialize, Serialize};

use crate::{
  doctor::DoctorId,
  message::{Message, SenderRole},
  subject::{Prescription, SubjectId, SubjectRecord},
};

/// A notification event, tagged for the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
  /// A subject completed intake; sent to the matching doctor-role group.
  NewPatient { subject: SubjectRecord },

  /// A message was appended; sent to the conversation channel and to both
  /// participants' personal channels.
  NewMessage { message: Message },

  /// A subject's record transitioned waiting → prescribed; sent to the
  /// subject's personal channel only.
  PrescriptionReady {
    subject_id:   SubjectId,
    prescription: Prescription,
  },

  /// One side started or stopped typing; never persisted.
  Typing {
    subject_id: SubjectId,
    doctor_id:  DoctorId,
    sender:     SenderRole,
    active:     bool,
  },
}

impl Event {
  /// The wire tag, useful for logging.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::NewPatient { .. } => "new_patient",
      Self::NewMessage { .. } => "new_message",
      Self::PrescriptionReady { .. } => "prescription_ready",
      Self::Typing { .. } => "typing",
    }
  }
}

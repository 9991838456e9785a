//! Channel — a named delivery group that connections join to receive
//! broadcast events.
//!
//! The naming scheme gives every subject and doctor a personal channel, every
//! (subject, doctor) pair an active-conversation channel, and each doctor
//! role a shared broadcast group for intake alerts.

use std::fmt;

use crate::{
  doctor::{DoctorId, DoctorRole},
  subject::{SubjectId, SubjectKind},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
  /// Personal channel of one subject: `patient_<id>`.
  Subject(SubjectId),
  /// Personal channel of one doctor: `doctor_<id>`.
  Doctor(DoctorId),
  /// The active conversation between a pair: `chat_<subject>_<doctor>`.
  Conversation(SubjectId, DoctorId),
  /// Every connected human-medicine doctor.
  AllDoctors,
  /// Every connected veterinarian.
  AllVeterinarians,
}

impl Channel {
  /// The broadcast group alerted when a subject of `kind` completes intake.
  pub fn intake_alerts(kind: SubjectKind) -> Self {
    match kind {
      SubjectKind::Human => Self::AllDoctors,
      SubjectKind::Animal => Self::AllVeterinarians,
    }
  }

  /// The broadcast group a doctor of `role` belongs to.
  pub fn role_group(role: DoctorRole) -> Self {
    match role {
      DoctorRole::Human => Self::AllDoctors,
      DoctorRole::Veterinarian => Self::AllVeterinarians,
    }
  }
}

impl fmt::Display for Channel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Subject(id) => write!(f, "patient_{id}"),
      Self::Doctor(id) => write!(f, "doctor_{id}"),
      Self::Conversation(sid, did) => write!(f, "chat_{sid}_{did}"),
      Self::AllDoctors => f.write_str("doctors"),
      Self::AllVeterinarians => f.write_str("veterinarians"),
    }
  }
}

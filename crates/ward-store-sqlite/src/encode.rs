//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Structured fields (intake
//! forms, prescriptions, image payloads) are stored as compact JSON.
//! Identifiers are stored exactly as their string form.

use chrono::{DateTime, Utc};
use ward_core::{
  doctor::{Doctor, DoctorRole},
  message::{Message, SenderRole},
  subject::{SubjectRecord, SubjectKind, SubjectStatus},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── SubjectKind ─────────────────────────────────────────────────────────────

pub fn encode_subject_kind(k: SubjectKind) -> &'static str {
  match k {
    SubjectKind::Human => "human",
    SubjectKind::Animal => "animal",
  }
}

// ─── SubjectStatus ───────────────────────────────────────────────────────────

pub fn encode_status(s: SubjectStatus) -> &'static str {
  match s {
    SubjectStatus::Waiting => "waiting",
    SubjectStatus::Prescribed => "prescribed",
  }
}

pub fn decode_status(s: &str) -> Result<SubjectStatus> {
  match s {
    "waiting" => Ok(SubjectStatus::Waiting),
    "prescribed" => Ok(SubjectStatus::Prescribed),
    other => Err(Error::DateParse(format!("unknown subject status: {other:?}"))),
  }
}

// ─── DoctorRole ──────────────────────────────────────────────────────────────

pub fn encode_role(r: DoctorRole) -> &'static str {
  match r {
    DoctorRole::Human => "human",
    DoctorRole::Veterinarian => "veterinarian",
  }
}

pub fn decode_role(s: &str) -> Result<DoctorRole> {
  match s {
    "human" => Ok(DoctorRole::Human),
    "veterinarian" => Ok(DoctorRole::Veterinarian),
    other => Err(Error::DateParse(format!("unknown doctor role: {other:?}"))),
  }
}

// ─── SenderRole ──────────────────────────────────────────────────────────────

pub fn encode_sender(s: SenderRole) -> &'static str {
  match s {
    SenderRole::Subject => "subject",
    SenderRole::Doctor => "doctor",
  }
}

pub fn decode_sender(s: &str) -> Result<SenderRole> {
  match s {
    "subject" => Ok(SenderRole::Subject),
    "doctor" => Ok(SenderRole::Doctor),
    other => Err(Error::DateParse(format!("unknown sender role: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id:        String,
  pub intake_json:       String,
  pub emergency:         bool,
  pub status:            String,
  pub prescription_json: Option<String>,
  pub created_at:        String,
}

impl RawSubject {
  pub fn into_record(self) -> Result<SubjectRecord> {
    Ok(SubjectRecord {
      subject_id:   self.subject_id.into(),
      intake:       serde_json::from_str(&self.intake_json)?,
      emergency:    self.emergency,
      status:       decode_status(&self.status)?,
      prescription: self
        .prescription_json
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `doctors` row.
pub struct RawDoctor {
  pub doctor_id:      String,
  pub username:       String,
  pub password_hash:  String,
  pub display_name:   String,
  pub specialization: Option<String>,
  pub role:           String,
  pub registered_at:  String,
}

impl RawDoctor {
  pub fn into_doctor(self) -> Result<Doctor> {
    Ok(Doctor {
      doctor_id:      self.doctor_id.into(),
      username:       self.username,
      password_hash:  self.password_hash,
      display_name:   self.display_name,
      specialization: self.specialization,
      role:           decode_role(&self.role)?,
      registered_at:  decode_dt(&self.registered_at)?,
    })
  }
}

/// Raw strings read directly from a `messages` row.
pub struct RawMessage {
  pub message_id: i64,
  pub subject_id: String,
  pub doctor_id:  String,
  pub sender:     String,
  pub body:       Option<String>,
  pub image_json: Option<String>,
  pub sent_at:    String,
}

impl RawMessage {
  pub fn into_message(self) -> Result<Message> {
    Ok(Message {
      message_id: self.message_id,
      subject_id: self.subject_id.into(),
      doctor_id:  self.doctor_id.into(),
      sender:     decode_sender(&self.sender)?,
      body:       self.body,
      image:      self
        .image_json
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?,
      sent_at:    decode_dt(&self.sent_at)?,
    })
  }
}

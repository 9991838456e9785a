//! Doctor identities. Created at registration or seed time and effectively
//! immutable afterwards.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Identifier ──────────────────────────────────────────────────────────────

/// Opaque doctor identifier. Generated ids are `DOC-<uuid>`; externally
/// supplied ids are accepted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoctorId(String);

impl DoctorId {
  pub fn generate() -> Self {
    Self(format!("DOC-{}", Uuid::new_v4().simple()))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl From<String> for DoctorId {
  fn from(s: String) -> Self { Self(s) }
}

impl From<&str> for DoctorId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl fmt::Display for DoctorId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Role ────────────────────────────────────────────────────────────────────

/// Which side of the service a doctor works: human patients or animals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoctorRole {
  Human,
  Veterinarian,
}

// ─── Doctor ──────────────────────────────────────────────────────────────────

/// A stored doctor identity, credential hash included.
///
/// Deliberately not `Serialize`: anything leaving the process goes through
/// [`DoctorProfile`] so the password hash cannot end up on the wire.
#[derive(Debug, Clone)]
pub struct Doctor {
  pub doctor_id:      DoctorId,
  pub username:       String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash:  String,
  pub display_name:   String,
  pub specialization: Option<String>,
  pub role:           DoctorRole,
  pub registered_at:  DateTime<Utc>,
}

impl Doctor {
  /// The public projection of this doctor.
  pub fn profile(&self) -> DoctorProfile {
    DoctorProfile {
      doctor_id:      self.doctor_id.clone(),
      display_name:   self.display_name.clone(),
      specialization: self.specialization.clone(),
      role:           self.role,
    }
  }
}

/// What patients and peers see of a doctor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfile {
  pub doctor_id:      DoctorId,
  pub display_name:   String,
  pub specialization: Option<String>,
  pub role:           DoctorRole,
}

// ─── NewDoctor ───────────────────────────────────────────────────────────────

/// Input to [`crate::store::RecordStore::add_doctor`]. `doctor_id` and
/// `registered_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewDoctor {
  pub username:       String,
  pub password_hash:  String,
  pub display_name:   String,
  pub specialization: Option<String>,
  pub role:           DoctorRole,
}

//! Subject — a patient or animal-owner record undergoing intake.
//!
//! A subject is created once by intake submission and afterwards mutated only
//! for its status fields: attaching a prescription flips `waiting` to
//! `prescribed`. Records are never deleted except by explicit administrative
//! clear.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::doctor::DoctorId;

// ─── Identifier ──────────────────────────────────────────────────────────────

/// Opaque subject identifier.
///
/// Generated ids are `PAT-<uuid>` / `ANI-<uuid>`; externally supplied ids are
/// accepted verbatim. Uniqueness of generated ids does not lean on timestamp
/// granularity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
  pub fn generate(kind: SubjectKind) -> Self {
    let prefix = match kind {
      SubjectKind::Human => "PAT",
      SubjectKind::Animal => "ANI",
    };
    Self(format!("{prefix}-{}", Uuid::new_v4().simple()))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl From<String> for SubjectId {
  fn from(s: String) -> Self { Self(s) }
}

impl From<&str> for SubjectId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl fmt::Display for SubjectId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Kind and status ─────────────────────────────────────────────────────────

/// The species side of the service a subject belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
  Human,
  Animal,
}

/// Prescription state of a subject. `waiting -> prescribed` is the only
/// modeled transition and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectStatus {
  Waiting,
  Prescribed,
}

// ─── Vitals ──────────────────────────────────────────────────────────────────

/// Measured vitals from a human intake form. Every reading is optional; the
/// kiosk records whatever sensors were used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
  pub bp_systolic:  Option<i32>,
  pub bp_diastolic: Option<i32>,
  pub temperature:  Option<f64>,
  pub pulse:        Option<i32>,
  pub sugar:        Option<i32>,
  pub oxygen:       Option<i32>,
}

impl Vitals {
  /// Emergency conditions triggered by these readings, empty when none.
  pub fn emergency_conditions(&self) -> Vec<&'static str> {
    let mut conditions = Vec::new();
    if self.bp_systolic.is_some_and(|v| v > 180)
      || self.bp_diastolic.is_some_and(|v| v > 120)
    {
      conditions.push("Hypertensive Crisis");
    }
    if self.bp_systolic.is_some_and(|v| v < 90)
      || self.bp_diastolic.is_some_and(|v| v < 60)
    {
      conditions.push("Hypotensive Emergency");
    }
    if self.oxygen.is_some_and(|v| v < 90) {
      conditions.push("Low Oxygen Emergency");
    }
    if self.sugar.is_some_and(|v| v > 400) {
      conditions.push("Hyperglycemia Emergency");
    }
    if self.sugar.is_some_and(|v| v < 70) {
      conditions.push("Hypoglycemia Emergency");
    }
    if self.temperature.is_some_and(|v| v > 39.5) {
      conditions.push("High Fever Emergency");
    }
    conditions
  }
}

// ─── Intake payload ──────────────────────────────────────────────────────────

/// The typed intake form. The tag doubles as the `kind` discriminant stored
/// in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IntakeDetails {
  Human {
    village:  Option<String>,
    age:      Option<u16>,
    gender:   Option<String>,
    #[serde(default)]
    vitals:   Vitals,
    symptoms: String,
  },
  Animal {
    owner_name:  String,
    owner_phone: Option<String>,
    species:     String,
    breed:       Option<String>,
    /// Free-text; owners report "6 months" as often as a number.
    age:         Option<String>,
    gender:      Option<String>,
    symptoms:    String,
  },
}

impl IntakeDetails {
  pub fn kind(&self) -> SubjectKind {
    match self {
      Self::Human { .. } => SubjectKind::Human,
      Self::Animal { .. } => SubjectKind::Animal,
    }
  }

  /// Emergency labels derived from the form. Animal intakes carry no vitals
  /// and never auto-flag.
  pub fn emergency_conditions(&self) -> Vec<&'static str> {
    match self {
      Self::Human { vitals, .. } => vitals.emergency_conditions(),
      Self::Animal { .. } => Vec::new(),
    }
  }
}

// ─── Prescription ────────────────────────────────────────────────────────────

/// A prescription attached to a subject record by a doctor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
  pub text:        String,
  pub doctor_id:   DoctorId,
  pub doctor_name: String,
  pub written_at:  DateTime<Utc>,
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A subject record as persisted. `subject_id` and `created_at` are assigned
/// by the store at intake time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectRecord {
  pub subject_id:   SubjectId,
  pub intake:       IntakeDetails,
  pub emergency:    bool,
  pub status:       SubjectStatus,
  pub prescription: Option<Prescription>,
  pub created_at:   DateTime<Utc>,
}

impl SubjectRecord {
  pub fn kind(&self) -> SubjectKind { self.intake.kind() }
}

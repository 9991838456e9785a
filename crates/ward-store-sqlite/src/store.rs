//! [`SqliteStore`] — the SQLite implementation of [`RecordStore`] and
//! [`MessageLog`].
//!
//! Record writes go through direct overwrites with no locking discipline
//! beyond SQLite's own; concurrent writers to the same subject race
//! last-write-wins. Message appends are single INSERTs through one
//! serialized connection and are therefore atomic and immediately visible.

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use ward_core::{
  doctor::{Doctor, DoctorId, DoctorRole, NewDoctor},
  message::{Message, NewMessage},
  store::{MessageLog, RecordStore},
  subject::{
    IntakeDetails, Prescription, SubjectId, SubjectKind, SubjectRecord,
    SubjectStatus,
  },
};

use crate::{
  encode::{
    decode_status, encode_dt, encode_role, encode_sender, encode_status,
    encode_subject_kind, RawDoctor, RawMessage, RawSubject,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Ward store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Write a fully-built [`SubjectRecord`], replacing any existing row.
  async fn upsert_subject(&self, record: &SubjectRecord) -> Result<()> {
    let subject_id_str    = record.subject_id.as_str().to_owned();
    let kind_str          = encode_subject_kind(record.kind()).to_owned();
    let intake_json_str   = serde_json::to_string(&record.intake)?;
    let emergency         = record.emergency;
    let status_str        = encode_status(record.status).to_owned();
    let prescription_json = record
      .prescription
      .as_ref()
      .map(serde_json::to_string)
      .transpose()?;
    let created_at_str    = encode_dt(record.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO subjects (
             subject_id, kind, intake_json, emergency,
             status, prescription_json, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            subject_id_str,
            kind_str,
            intake_json_str,
            emergency,
            status_str,
            prescription_json,
            created_at_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn subject_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSubject> {
  Ok(RawSubject {
    subject_id:        row.get(0)?,
    intake_json:       row.get(1)?,
    emergency:         row.get(2)?,
    status:            row.get(3)?,
    prescription_json: row.get(4)?,
    created_at:        row.get(5)?,
  })
}

fn doctor_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawDoctor> {
  Ok(RawDoctor {
    doctor_id:      row.get(0)?,
    username:       row.get(1)?,
    password_hash:  row.get(2)?,
    display_name:   row.get(3)?,
    specialization: row.get(4)?,
    role:           row.get(5)?,
    registered_at:  row.get(6)?,
  })
}

fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawMessage> {
  Ok(RawMessage {
    message_id: row.get(0)?,
    subject_id: row.get(1)?,
    doctor_id:  row.get(2)?,
    sender:     row.get(3)?,
    body:       row.get(4)?,
    image_json: row.get(5)?,
    sent_at:    row.get(6)?,
  })
}

const SUBJECT_COLUMNS: &str =
  "subject_id, intake_json, emergency, status, prescription_json, created_at";
const DOCTOR_COLUMNS: &str =
  "doctor_id, username, password_hash, display_name, specialization, role, registered_at";
const MESSAGE_COLUMNS: &str =
  "message_id, subject_id, doctor_id, sender, body, image_json, sent_at";

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn create_subject(&self, intake: IntakeDetails) -> Result<SubjectRecord> {
    let record = SubjectRecord {
      subject_id:   SubjectId::generate(intake.kind()),
      emergency:    !intake.emergency_conditions().is_empty(),
      status:       SubjectStatus::Waiting,
      prescription: None,
      created_at:   Utc::now(),
      intake,
    };

    self.upsert_subject(&record).await?;
    Ok(record)
  }

  async fn put_subject(&self, record: SubjectRecord) -> Result<()> {
    self.upsert_subject(&record).await
  }

  async fn get_subject(&self, id: &SubjectId) -> Result<Option<SubjectRecord>> {
    let id_str = id.as_str().to_owned();

    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE subject_id = ?1"),
            rusqlite::params![id_str],
            subject_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSubject::into_record).transpose()
  }

  async fn delete_subject(&self, id: &SubjectId) -> Result<bool> {
    let id_str = id.as_str().to_owned();

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM subjects WHERE subject_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  async fn list_subjects(
    &self,
    kind: Option<SubjectKind>,
  ) -> Result<Vec<SubjectRecord>> {
    let kind_str = kind.map(encode_subject_kind).map(str::to_owned);

    let raws: Vec<RawSubject> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(k) = kind_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {SUBJECT_COLUMNS} FROM subjects
             WHERE kind = ?1 ORDER BY created_at DESC"
          ))?;
          stmt
            .query_map(rusqlite::params![k], subject_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {SUBJECT_COLUMNS} FROM subjects ORDER BY created_at DESC"
          ))?;
          stmt
            .query_map([], subject_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_record).collect()
  }

  async fn write_prescription(
    &self,
    id: &SubjectId,
    text: String,
    doctor: &Doctor,
  ) -> Result<(SubjectStatus, SubjectRecord)> {
    let prescription = Prescription {
      text,
      doctor_id:   doctor.doctor_id.clone(),
      doctor_name: doctor.display_name.clone(),
      written_at:  Utc::now(),
    };
    let prescription_json = serde_json::to_string(&prescription)?;
    let id_str = id.as_str().to_owned();

    // Read the prior row and update in one connection call so the
    // reported previous status matches what this write replaced.
    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        let existing = conn
          .query_row(
            &format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE subject_id = ?1"),
            rusqlite::params![id_str],
            subject_from_row,
          )
          .optional()?;

        let Some(existing) = existing else {
          return Ok(None);
        };

        conn.execute(
          "UPDATE subjects SET status = 'prescribed', prescription_json = ?2
           WHERE subject_id = ?1",
          rusqlite::params![id_str, prescription_json],
        )?;

        Ok(Some(existing))
      })
      .await?;

    let raw = raw.ok_or_else(|| Error::SubjectNotFound(id.clone()))?;
    let previous = decode_status(&raw.status)?;

    let mut record = raw.into_record()?;
    record.status = SubjectStatus::Prescribed;
    record.prescription = Some(prescription);

    Ok((previous, record))
  }

  // ── Doctors ───────────────────────────────────────────────────────────────

  async fn add_doctor(&self, input: NewDoctor) -> Result<Doctor> {
    let doctor = Doctor {
      doctor_id:      DoctorId::generate(),
      username:       input.username,
      password_hash:  input.password_hash,
      display_name:   input.display_name,
      specialization: input.specialization,
      role:           input.role,
      registered_at:  Utc::now(),
    };

    let doctor_id_str     = doctor.doctor_id.as_str().to_owned();
    let username          = doctor.username.clone();
    let password_hash     = doctor.password_hash.clone();
    let display_name      = doctor.display_name.clone();
    let specialization    = doctor.specialization.clone();
    let role_str          = encode_role(doctor.role).to_owned();
    let registered_at_str = encode_dt(doctor.registered_at);

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let taken: bool = conn
          .query_row(
            "SELECT 1 FROM doctors WHERE username = ?1",
            rusqlite::params![username],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if taken {
          return Ok(false);
        }

        conn.execute(
          "INSERT INTO doctors (
             doctor_id, username, password_hash, display_name,
             specialization, role, registered_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            doctor_id_str,
            username,
            password_hash,
            display_name,
            specialization,
            role_str,
            registered_at_str,
          ],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::UsernameTaken(doctor.username));
    }
    Ok(doctor)
  }

  async fn get_doctor(&self, id: &DoctorId) -> Result<Option<Doctor>> {
    let id_str = id.as_str().to_owned();

    let raw: Option<RawDoctor> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE doctor_id = ?1"),
            rusqlite::params![id_str],
            doctor_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawDoctor::into_doctor).transpose()
  }

  async fn find_doctor(&self, username: &str) -> Result<Option<Doctor>> {
    let username = username.to_owned();

    let raw: Option<RawDoctor> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE username = ?1"),
            rusqlite::params![username],
            doctor_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawDoctor::into_doctor).transpose()
  }

  async fn list_doctors(&self, role: Option<DoctorRole>) -> Result<Vec<Doctor>> {
    let role_str = role.map(encode_role).map(str::to_owned);

    let raws: Vec<RawDoctor> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(r) = role_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {DOCTOR_COLUMNS} FROM doctors WHERE role = ?1 ORDER BY registered_at"
          ))?;
          stmt
            .query_map(rusqlite::params![r], doctor_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {DOCTOR_COLUMNS} FROM doctors ORDER BY registered_at"
          ))?;
          stmt
            .query_map([], doctor_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDoctor::into_doctor).collect()
  }
}

// ─── MessageLog impl ─────────────────────────────────────────────────────────

impl MessageLog for SqliteStore {
  type Error = Error;

  async fn append(&self, input: NewMessage) -> Result<Message> {
    if !input.has_content() {
      return Err(ward_core::Error::EmptyMessage.into());
    }

    let sent_at = Utc::now();

    let subject_id_str = input.subject_id.as_str().to_owned();
    let doctor_id_str  = input.doctor_id.as_str().to_owned();
    let sender_str     = encode_sender(input.sender).to_owned();
    let body           = input.body.clone();
    let image_json     = input
      .image
      .as_ref()
      .map(serde_json::to_string)
      .transpose()?;
    let sent_at_str    = encode_dt(sent_at);

    let message_id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO messages (
             subject_id, doctor_id, sender, body, image_json, sent_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            subject_id_str,
            doctor_id_str,
            sender_str,
            body,
            image_json,
            sent_at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Message {
      message_id,
      subject_id: input.subject_id,
      doctor_id:  input.doctor_id,
      sender:     input.sender,
      body:       input.body,
      image:      input.image,
      sent_at,
    })
  }

  async fn list(
    &self,
    subject_id: &SubjectId,
    doctor_id: &DoctorId,
  ) -> Result<Vec<Message>> {
    let subject_id_str = subject_id.as_str().to_owned();
    let doctor_id_str  = doctor_id.as_str().to_owned();

    let raws: Vec<RawMessage> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MESSAGE_COLUMNS} FROM messages
           WHERE subject_id = ?1 AND doctor_id = ?2
           ORDER BY sent_at ASC, message_id ASC"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![subject_id_str, doctor_id_str],
            message_from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMessage::into_message).collect()
  }

  async fn conversation_partners(
    &self,
    doctor_id: &DoctorId,
  ) -> Result<Vec<SubjectId>> {
    let doctor_id_str = doctor_id.as_str().to_owned();

    let ids: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT subject_id, MAX(sent_at) AS last_at FROM messages
           WHERE doctor_id = ?1
           GROUP BY subject_id
           ORDER BY last_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![doctor_id_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(ids.into_iter().map(SubjectId::from).collect())
  }
}

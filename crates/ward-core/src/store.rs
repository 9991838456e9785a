//! The `RecordStore` and `MessageLog` traits.
//!
//! Both are implemented by storage backends (e.g. `ward-store-sqlite`).
//! Higher layers (`ward-dispatch`, `ward-api`, `ward-server`) depend on
//! these abstractions, not on any concrete backend.
//!
//! Record writes are not transactional across records: concurrent writers to
//! the same subject race last-write-wins. That is an accepted, documented
//! weakness of the service, not an invariant. The message log, by contrast,
//! is strictly append-only: each append is atomic and immediately visible to
//! subsequent `list` calls.

use std::future::Future;

use crate::{
  doctor::{Doctor, DoctorId, DoctorRole, NewDoctor},
  message::{Message, NewMessage},
  subject::{IntakeDetails, SubjectId, SubjectKind, SubjectRecord, SubjectStatus},
};

// ─── Record store ────────────────────────────────────────────────────────────

/// Persistence for subject and doctor records.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Subjects ──────────────────────────────────────────────────────────

  /// Create and persist a subject from an intake form. The store assigns
  /// the id and creation timestamp and derives the emergency flag from the
  /// form's vitals.
  fn create_subject(
    &self,
    intake: IntakeDetails,
  ) -> impl Future<Output = Result<SubjectRecord, Self::Error>> + Send + '_;

  /// Overwrite a subject record wholesale (last-write-wins).
  fn put_subject(
    &self,
    record: SubjectRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Retrieve a subject by id. Returns `None` if not found.
  fn get_subject<'a>(
    &'a self,
    id: &'a SubjectId,
  ) -> impl Future<Output = Result<Option<SubjectRecord>, Self::Error>> + Send + 'a;

  /// Administrative clear of one record. Returns `false` if the id was
  /// unknown.
  fn delete_subject<'a>(
    &'a self,
    id: &'a SubjectId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// List subjects newest-first, optionally filtered by kind.
  fn list_subjects(
    &self,
    kind: Option<SubjectKind>,
  ) -> impl Future<Output = Result<Vec<SubjectRecord>, Self::Error>> + Send + '_;

  /// Attach a prescription and set the status to `prescribed`.
  ///
  /// Returns the status the record held *before* this write together with
  /// the updated record, so callers can detect the waiting → prescribed
  /// transition. Errors if the subject does not exist.
  fn write_prescription<'a>(
    &'a self,
    id: &'a SubjectId,
    text: String,
    doctor: &'a Doctor,
  ) -> impl Future<Output = Result<(SubjectStatus, SubjectRecord), Self::Error>>
  + Send
  + 'a;

  // ── Doctors ───────────────────────────────────────────────────────────

  /// Register a doctor. Errors if the username is already taken.
  fn add_doctor(
    &self,
    input: NewDoctor,
  ) -> impl Future<Output = Result<Doctor, Self::Error>> + Send + '_;

  /// Retrieve a doctor by id. Returns `None` if not found.
  fn get_doctor<'a>(
    &'a self,
    id: &'a DoctorId,
  ) -> impl Future<Output = Result<Option<Doctor>, Self::Error>> + Send + 'a;

  /// Look a doctor up by login username. Returns `None` if not found.
  fn find_doctor<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<Doctor>, Self::Error>> + Send + 'a;

  /// List doctors, optionally filtered by role.
  fn list_doctors(
    &self,
    role: Option<DoctorRole>,
  ) -> impl Future<Output = Result<Vec<Doctor>, Self::Error>> + Send + '_;
}

// ─── Message log ─────────────────────────────────────────────────────────────

/// The append-only chat log, keyed by (subject, doctor) pair.
pub trait MessageLog: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Append a message and return it as persisted. The store assigns the
  /// monotonic id and the timestamp. Fails if the message carries neither
  /// text nor image.
  fn append(
    &self,
    input: NewMessage,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + '_;

  /// The conversation for a pair, ordered by (sent_at, id) ascending.
  /// An unknown pair yields an empty sequence, not an error.
  fn list<'a>(
    &'a self,
    subject_id: &'a SubjectId,
    doctor_id: &'a DoctorId,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + 'a;

  /// Distinct subjects that have exchanged messages with a doctor, most
  /// recent conversation first. Backs the doctor's chat sidebar.
  fn conversation_partners<'a>(
    &'a self,
    doctor_id: &'a DoctorId,
  ) -> impl Future<Output = Result<Vec<SubjectId>, Self::Error>> + Send + 'a;
}

//! [`Dispatcher`] — persist a state change, then notify affected parties.
//!
//! Every state-changing action in the service flows through here so the
//! persist-then-broadcast ordering holds everywhere: a storage failure aborts
//! the whole dispatch and no event escapes, while a broadcast that reaches
//! nobody is silent and non-fatal (the message log remains the durable
//! source of truth and clients re-fetch on reconnect).

use std::sync::Arc;

use sha2::{Digest, Sha256};
use ward_core::{
  channel::Channel,
  doctor::{Doctor, DoctorId},
  event::Event,
  message::{Message, NewMessage, SenderRole},
  store::{MessageLog, RecordStore},
  subject::{IntakeDetails, SubjectId, SubjectRecord, SubjectStatus},
};

use crate::rooms::Rooms;

/// Convenience bound for backends implementing both store traits with a
/// single error type.
pub trait Store:
  RecordStore + MessageLog<Error = <Self as RecordStore>::Error>
{
}

impl<T> Store for T where
  T: RecordStore + MessageLog<Error = <T as RecordStore>::Error>
{
}

// ─── Dispatcher ──────────────────────────────────────────────────────────────

pub struct Dispatcher<S> {
  store: Arc<S>,
  rooms: Arc<Rooms>,
}

// Manual impl: `S` itself need not be `Clone`.
impl<S> Clone for Dispatcher<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      rooms: Arc::clone(&self.rooms),
    }
  }
}

impl<S: Store> Dispatcher<S> {
  pub fn new(store: Arc<S>, rooms: Arc<Rooms>) -> Self {
    Self { store, rooms }
  }

  pub fn rooms(&self) -> &Arc<Rooms> { &self.rooms }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Record an intake form, then alert the matching doctor-role group.
  pub async fn intake(
    &self,
    intake: IntakeDetails,
  ) -> Result<SubjectRecord, <S as RecordStore>::Error> {
    let record = self.store.create_subject(intake).await?;

    tracing::info!(
      subject_id = %record.subject_id,
      kind = ?record.kind(),
      emergency = record.emergency,
      "intake recorded"
    );

    self.rooms.broadcast(
      &Channel::intake_alerts(record.kind()),
      &Event::NewPatient {
        subject: record.clone(),
      },
    );
    Ok(record)
  }

  /// Append a chat message, then notify the conversation channel and both
  /// participants' personal channels (so a participant not currently viewing
  /// the conversation still sees a badge).
  pub async fn send_message(
    &self,
    mut input: NewMessage,
  ) -> Result<Message, <S as RecordStore>::Error> {
    // The digest is recomputed on ingest; the client-supplied value is
    // never trusted.
    if let Some(image) = input.image.as_mut() {
      image.content_hash = content_digest(&image.data);
    }

    let message = self.store.append(input).await?;

    let event = Event::NewMessage {
      message: message.clone(),
    };
    self.rooms.broadcast(
      &Channel::Conversation(message.subject_id.clone(), message.doctor_id.clone()),
      &event,
    );
    self
      .rooms
      .broadcast(&Channel::Subject(message.subject_id.clone()), &event);
    self
      .rooms
      .broadcast(&Channel::Doctor(message.doctor_id.clone()), &event);

    Ok(message)
  }

  /// Attach a prescription, then notify the subject's personal channel —
  /// but only when this write performed the waiting → prescribed
  /// transition. Re-writing an existing prescription updates silently.
  pub async fn write_prescription(
    &self,
    subject_id: &SubjectId,
    text: String,
    doctor: &Doctor,
  ) -> Result<SubjectRecord, <S as RecordStore>::Error> {
    let (previous, record) = self
      .store
      .write_prescription(subject_id, text, doctor)
      .await?;

    if previous == SubjectStatus::Waiting
      && let Some(prescription) = record.prescription.clone()
    {
      self.rooms.broadcast(
        &Channel::Subject(subject_id.clone()),
        &Event::PrescriptionReady {
          subject_id: subject_id.clone(),
          prescription,
        },
      );
    }

    Ok(record)
  }

  /// Relay a typing indicator to the conversation channel. Nothing is
  /// persisted; absent listeners never learn it happened.
  pub fn typing(
    &self,
    subject_id: &SubjectId,
    doctor_id: &DoctorId,
    sender: SenderRole,
    active: bool,
  ) {
    self.rooms.broadcast(
      &Channel::Conversation(subject_id.clone(), doctor_id.clone()),
      &Event::Typing {
        subject_id: subject_id.clone(),
        doctor_id:  doctor_id.clone(),
        sender,
        active,
      },
    );
  }
}

/// SHA-256 hex digest of an image blob's base64 form.
fn content_digest(data: &str) -> String {
  hex::encode(Sha256::digest(data.as_bytes()))
}

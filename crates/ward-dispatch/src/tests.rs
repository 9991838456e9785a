//! Dispatcher integration tests against the in-memory SQLite backend.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use ward_core::{
  channel::Channel,
  doctor::{Doctor, DoctorId, DoctorRole, NewDoctor},
  event::Event,
  message::{ImagePayload, NewMessage, SenderRole},
  store::{MessageLog, RecordStore},
  subject::{IntakeDetails, SubjectId, SubjectStatus, Vitals},
};
use ward_store_sqlite::SqliteStore;

use crate::{Dispatcher, Rooms};

/// A store handle alongside a dispatcher built over it.
async fn fixture() -> (SqliteStore, Dispatcher<SqliteStore>) {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  let dispatcher =
    Dispatcher::new(Arc::new(store.clone()), Arc::new(Rooms::new()));
  (store, dispatcher)
}

/// Join a fresh connection to `channel` and return its event stream.
fn listen(
  dispatcher: &Dispatcher<SqliteStore>,
  channel: Channel,
) -> UnboundedReceiver<Event> {
  let rooms = dispatcher.rooms();
  let conn = rooms.next_connection();
  let (tx, rx) = mpsc::unbounded_channel();
  rooms.join(conn, channel, tx);
  rx
}

fn human_intake() -> IntakeDetails {
  IntakeDetails::Human {
    village:  Some("Kelur".into()),
    age:      Some(40),
    gender:   Some("male".into()),
    vitals:   Vitals::default(),
    symptoms: "fever and cough".into(),
  }
}

fn animal_intake() -> IntakeDetails {
  IntakeDetails::Animal {
    owner_name:  "Ravi".into(),
    owner_phone: None,
    species:     "buffalo".into(),
    breed:       None,
    age:         None,
    gender:      None,
    symptoms:    "swollen leg".into(),
  }
}

async fn register_doctor(store: &SqliteStore, role: DoctorRole) -> Doctor {
  store
    .add_doctor(NewDoctor {
      username:       format!("doc-{role:?}").to_lowercase(),
      password_hash:  "$argon2id$v=19$m=19456,t=2,p=1$abc$def".into(),
      display_name:   "Dr. Smith".into(),
      specialization: None,
      role,
    })
    .await
    .unwrap()
}

// ─── Intake alerts ───────────────────────────────────────────────────────────

#[tokio::test]
async fn human_intake_alerts_doctors_not_vets() {
  let (_store, d) = fixture().await;
  let mut doctors = listen(&d, Channel::AllDoctors);
  let mut vets = listen(&d, Channel::AllVeterinarians);

  let record = d.intake(human_intake()).await.unwrap();

  match doctors.try_recv().unwrap() {
    Event::NewPatient { subject } => {
      assert_eq!(subject.subject_id, record.subject_id)
    }
    other => panic!("expected new_patient, got {other:?}"),
  }
  assert!(vets.try_recv().is_err());
}

#[tokio::test]
async fn animal_intake_alerts_veterinarians() {
  let (_store, d) = fixture().await;
  let mut doctors = listen(&d, Channel::AllDoctors);
  let mut vets = listen(&d, Channel::AllVeterinarians);

  d.intake(animal_intake()).await.unwrap();

  assert!(matches!(
    vets.try_recv().unwrap(),
    Event::NewPatient { .. }
  ));
  assert!(doctors.try_recv().is_err());
}

// ─── Message fan-out ─────────────────────────────────────────────────────────

#[tokio::test]
async fn message_reaches_conversation_and_both_personal_channels() {
  let (_store, d) = fixture().await;
  let sid = SubjectId::from("pat_1");
  let did = DoctorId::from("doc_1");

  let mut conversation =
    listen(&d, Channel::Conversation(sid.clone(), did.clone()));
  let mut patient = listen(&d, Channel::Subject(sid.clone()));
  let mut doctor = listen(&d, Channel::Doctor(did.clone()));
  let mut bystander = listen(&d, Channel::Subject("someone_else".into()));

  let sent = d
    .send_message(NewMessage::text(
      sid.clone(),
      did.clone(),
      SenderRole::Subject,
      "hello",
    ))
    .await
    .unwrap();

  for rx in [&mut conversation, &mut patient, &mut doctor] {
    match rx.try_recv().unwrap() {
      Event::NewMessage { message } => {
        assert_eq!(message.message_id, sent.message_id);
        assert_eq!(message.body.as_deref(), Some("hello"));
      }
      other => panic!("expected new_message, got {other:?}"),
    }
  }
  assert!(bystander.try_recv().is_err());
}

#[tokio::test]
async fn image_digest_is_recomputed_on_ingest() {
  let (_store, d) = fixture().await;

  let sent = d
    .send_message(NewMessage {
      subject_id: "pat_1".into(),
      doctor_id:  "doc_1".into(),
      sender:     SenderRole::Subject,
      body:       None,
      image:      Some(ImagePayload {
        media_type:   "image/jpeg".into(),
        data:         "aGVsbG8=".into(),
        content_hash: "bogus-client-value".into(),
      }),
    })
    .await
    .unwrap();

  let image = sent.image.unwrap();
  // sha256 of the base64 text "aGVsbG8="
  assert_eq!(
    image.content_hash,
    "333d6b3a3c1f5db6c9bdda5939b136986d170f4649172a68368d54ecb44c2ff2"
  );
}

#[tokio::test]
async fn rejected_message_broadcasts_nothing() {
  let (store, d) = fixture().await;
  let sid = SubjectId::from("pat_1");
  let did = DoctorId::from("doc_1");
  let mut conversation =
    listen(&d, Channel::Conversation(sid.clone(), did.clone()));

  let err = d
    .send_message(NewMessage {
      subject_id: sid.clone(),
      doctor_id:  did.clone(),
      sender:     SenderRole::Subject,
      body:       None,
      image:      None,
    })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    ward_store_sqlite::Error::Core(ward_core::Error::EmptyMessage)
  ));

  // Persistence failed, so nothing was broadcast and nothing was logged.
  assert!(conversation.try_recv().is_err());
  assert!(store.list(&sid, &did).await.unwrap().is_empty());
}

// ─── Prescriptions ───────────────────────────────────────────────────────────

#[tokio::test]
async fn prescription_ready_fires_exactly_once_per_transition() {
  let (store, d) = fixture().await;
  let doctor = register_doctor(&store, DoctorRole::Human).await;
  let record = d.intake(human_intake()).await.unwrap();

  let mut patient = listen(&d, Channel::Subject(record.subject_id.clone()));

  let updated = d
    .write_prescription(&record.subject_id, "rest and fluids".into(), &doctor)
    .await
    .unwrap();
  assert_eq!(updated.status, SubjectStatus::Prescribed);

  match patient.try_recv().unwrap() {
    Event::PrescriptionReady {
      subject_id,
      prescription,
    } => {
      assert_eq!(subject_id, record.subject_id);
      assert_eq!(prescription.text, "rest and fluids");
    }
    other => panic!("expected prescription_ready, got {other:?}"),
  }

  // Re-writing updates the record but emits no second event.
  d.write_prescription(&record.subject_id, "amended".into(), &doctor)
    .await
    .unwrap();
  assert!(patient.try_recv().is_err());
}

#[tokio::test]
async fn failed_prescription_write_broadcasts_nothing() {
  let (store, d) = fixture().await;
  let doctor = register_doctor(&store, DoctorRole::Human).await;
  let mut patient = listen(&d, Channel::Subject("ghost".into()));

  let result = d
    .write_prescription(&"ghost".into(), "rest".into(), &doctor)
    .await;
  assert!(result.is_err());
  assert!(patient.try_recv().is_err());
}

// ─── Typing ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn typing_is_relayed_but_never_persisted() {
  let (store, d) = fixture().await;
  let sid = SubjectId::from("pat_1");
  let did = DoctorId::from("doc_1");
  let mut conversation =
    listen(&d, Channel::Conversation(sid.clone(), did.clone()));

  d.typing(&sid, &did, SenderRole::Doctor, true);

  assert!(matches!(
    conversation.try_recv().unwrap(),
    Event::Typing { active: true, .. }
  ));

  assert!(store.list(&sid, &did).await.unwrap().is_empty());
}

// ─── End-to-end scenario ─────────────────────────────────────────────────────

#[tokio::test]
async fn intake_chat_and_prescription_flow() {
  let (store, d) = fixture().await;
  let doctor = register_doctor(&store, DoctorRole::Human).await;
  let sid = SubjectId::from("alice_20240101120000");
  let did = DoctorId::from("doc_1");

  // The subject record exists before the chat starts, under her legacy id.
  let mut record = store.create_subject(human_intake()).await.unwrap();
  store.delete_subject(&record.subject_id).await.unwrap();
  record.subject_id = sid.clone();
  store.put_subject(record).await.unwrap();

  // Her personal channel has the documented name.
  assert_eq!(
    Channel::Subject(sid.clone()).to_string(),
    "patient_alice_20240101120000"
  );
  let mut personal = listen(&d, Channel::Subject(sid.clone()));

  d.send_message(NewMessage::text(
    sid.clone(),
    did.clone(),
    SenderRole::Subject,
    "hello",
  ))
  .await
  .unwrap();

  let listed = store.list(&sid, &did).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].sender, SenderRole::Subject);
  assert_eq!(listed[0].body.as_deref(), Some("hello"));

  d.send_message(NewMessage::text(
    sid.clone(),
    did.clone(),
    SenderRole::Doctor,
    "hi",
  ))
  .await
  .unwrap();

  let listed = store.list(&sid, &did).await.unwrap();
  assert_eq!(listed.len(), 2);
  assert_eq!(listed[1].body.as_deref(), Some("hi"));

  // Drain the two new_message notifications her personal channel saw.
  assert!(matches!(personal.try_recv().unwrap(), Event::NewMessage { .. }));
  assert!(matches!(personal.try_recv().unwrap(), Event::NewMessage { .. }));

  d.write_prescription(&sid, "rest".into(), &doctor)
    .await
    .unwrap();

  let updated = store.get_subject(&sid).await.unwrap().unwrap();
  assert_eq!(updated.status, SubjectStatus::Prescribed);

  // Exactly one prescription_ready, on her channel only.
  assert!(matches!(
    personal.try_recv().unwrap(),
    Event::PrescriptionReady { .. }
  ));
  assert!(personal.try_recv().is_err());
}

//! Integration tests for `SqliteStore` against an in-memory database.

use ward_core::{
  doctor::{DoctorRole, NewDoctor},
  message::{ImagePayload, NewMessage, SenderRole},
  store::{MessageLog, RecordStore},
  subject::{IntakeDetails, SubjectKind, SubjectStatus, Vitals},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn human_intake(symptoms: &str) -> IntakeDetails {
  IntakeDetails::Human {
    village:  Some("Kelur".into()),
    age:      Some(34),
    gender:   Some("female".into()),
    vitals:   Vitals {
      bp_systolic:  Some(120),
      bp_diastolic: Some(80),
      temperature:  Some(36.9),
      pulse:        Some(70),
      sugar:        Some(95),
      oxygen:       Some(98),
    },
    symptoms: symptoms.into(),
  }
}

fn animal_intake() -> IntakeDetails {
  IntakeDetails::Animal {
    owner_name:  "Ravi".into(),
    owner_phone: Some("+91-9876543210".into()),
    species:     "goat".into(),
    breed:       None,
    age:         Some("2 years".into()),
    gender:      Some("male".into()),
    symptoms:    "not eating".into(),
  }
}

fn doctor_input(username: &str, role: DoctorRole) -> NewDoctor {
  NewDoctor {
    username:       username.into(),
    password_hash:  "$argon2id$v=19$m=19456,t=2,p=1$abc$def".into(),
    display_name:   format!("Dr. {username}"),
    specialization: Some("General Medicine".into()),
    role,
  }
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_subject() {
  let s = store().await;

  let record = s.create_subject(human_intake("cough")).await.unwrap();
  assert_eq!(record.kind(), SubjectKind::Human);
  assert_eq!(record.status, SubjectStatus::Waiting);
  assert!(record.subject_id.as_str().starts_with("PAT-"));
  assert!(!record.emergency);

  let fetched = s.get_subject(&record.subject_id).await.unwrap().unwrap();
  assert_eq!(fetched.subject_id, record.subject_id);
  assert_eq!(fetched.status, SubjectStatus::Waiting);
  assert!(fetched.prescription.is_none());
}

#[tokio::test]
async fn get_subject_missing_returns_none() {
  let s = store().await;
  let result = s.get_subject(&"nope".into()).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn crisis_vitals_set_emergency_flag() {
  let s = store().await;

  let intake = IntakeDetails::Human {
    village:  None,
    age:      Some(60),
    gender:   None,
    vitals:   Vitals {
      bp_systolic: Some(200),
      ..Vitals::default()
    },
    symptoms: "severe headache".into(),
  };
  let record = s.create_subject(intake).await.unwrap();
  assert!(record.emergency);
}

#[tokio::test]
async fn animal_intake_gets_ani_prefix_and_no_emergency() {
  let s = store().await;
  let record = s.create_subject(animal_intake()).await.unwrap();
  assert_eq!(record.kind(), SubjectKind::Animal);
  assert!(record.subject_id.as_str().starts_with("ANI-"));
  assert!(!record.emergency);
}

#[tokio::test]
async fn list_subjects_filtered_by_kind() {
  let s = store().await;
  s.create_subject(human_intake("fever")).await.unwrap();
  s.create_subject(animal_intake()).await.unwrap();
  s.create_subject(human_intake("cough")).await.unwrap();

  let all = s.list_subjects(None).await.unwrap();
  assert_eq!(all.len(), 3);

  let humans = s.list_subjects(Some(SubjectKind::Human)).await.unwrap();
  assert_eq!(humans.len(), 2);
  assert!(humans.iter().all(|r| r.kind() == SubjectKind::Human));

  let animals = s.list_subjects(Some(SubjectKind::Animal)).await.unwrap();
  assert_eq!(animals.len(), 1);
}

#[tokio::test]
async fn delete_subject() {
  let s = store().await;
  let record = s.create_subject(human_intake("fever")).await.unwrap();

  assert!(s.delete_subject(&record.subject_id).await.unwrap());
  assert!(s.get_subject(&record.subject_id).await.unwrap().is_none());

  // A second delete reports the id as unknown.
  assert!(!s.delete_subject(&record.subject_id).await.unwrap());
}

#[tokio::test]
async fn put_subject_overwrites() {
  let s = store().await;
  let mut record = s.create_subject(human_intake("fever")).await.unwrap();

  record.emergency = true;
  s.put_subject(record.clone()).await.unwrap();

  let fetched = s.get_subject(&record.subject_id).await.unwrap().unwrap();
  assert!(fetched.emergency);
}

// ─── Prescriptions ───────────────────────────────────────────────────────────

#[tokio::test]
async fn write_prescription_transitions_waiting_to_prescribed() {
  let s = store().await;
  let record = s.create_subject(human_intake("fever")).await.unwrap();
  let doctor = s
    .add_doctor(doctor_input("asha", DoctorRole::Human))
    .await
    .unwrap();

  let (previous, updated) = s
    .write_prescription(&record.subject_id, "paracetamol 500mg".into(), &doctor)
    .await
    .unwrap();

  assert_eq!(previous, SubjectStatus::Waiting);
  assert_eq!(updated.status, SubjectStatus::Prescribed);
  let prescription = updated.prescription.unwrap();
  assert_eq!(prescription.text, "paracetamol 500mg");
  assert_eq!(prescription.doctor_id, doctor.doctor_id);

  // Persisted, not just in the returned value.
  let fetched = s.get_subject(&record.subject_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, SubjectStatus::Prescribed);
  assert!(fetched.prescription.is_some());
}

#[tokio::test]
async fn rewrite_prescription_reports_prescribed_as_previous() {
  let s = store().await;
  let record = s.create_subject(human_intake("fever")).await.unwrap();
  let doctor = s
    .add_doctor(doctor_input("asha", DoctorRole::Human))
    .await
    .unwrap();

  s.write_prescription(&record.subject_id, "first".into(), &doctor)
    .await
    .unwrap();
  let (previous, updated) = s
    .write_prescription(&record.subject_id, "second".into(), &doctor)
    .await
    .unwrap();

  assert_eq!(previous, SubjectStatus::Prescribed);
  assert_eq!(updated.prescription.unwrap().text, "second");
}

#[tokio::test]
async fn prescription_for_unknown_subject_errors() {
  let s = store().await;
  let doctor = s
    .add_doctor(doctor_input("asha", DoctorRole::Human))
    .await
    .unwrap();

  let err = s
    .write_prescription(&"ghost".into(), "rest".into(), &doctor)
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::SubjectNotFound(_)));
}

// ─── Doctors ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_look_up_doctor() {
  let s = store().await;
  let doctor = s
    .add_doctor(doctor_input("asha", DoctorRole::Human))
    .await
    .unwrap();
  assert!(doctor.doctor_id.as_str().starts_with("DOC-"));

  let by_id = s.get_doctor(&doctor.doctor_id).await.unwrap().unwrap();
  assert_eq!(by_id.username, "asha");

  let by_name = s.find_doctor("asha").await.unwrap().unwrap();
  assert_eq!(by_name.doctor_id, doctor.doctor_id);
  assert_eq!(by_name.password_hash, doctor.password_hash);

  assert!(s.find_doctor("unknown").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_rejected() {
  let s = store().await;
  s.add_doctor(doctor_input("asha", DoctorRole::Human))
    .await
    .unwrap();

  let err = s
    .add_doctor(doctor_input("asha", DoctorRole::Veterinarian))
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::UsernameTaken(name) if name == "asha"));
}

#[tokio::test]
async fn list_doctors_filtered_by_role() {
  let s = store().await;
  s.add_doctor(doctor_input("asha", DoctorRole::Human))
    .await
    .unwrap();
  s.add_doctor(doctor_input("vikram", DoctorRole::Veterinarian))
    .await
    .unwrap();

  let vets = s
    .list_doctors(Some(DoctorRole::Veterinarian))
    .await
    .unwrap();
  assert_eq!(vets.len(), 1);
  assert_eq!(vets[0].username, "vikram");

  assert_eq!(s.list_doctors(None).await.unwrap().len(), 2);
}

// ─── Message log ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn append_and_list_in_send_order() {
  let s = store().await;
  let sid = "alice_20240101120000".into();
  let did = "doc_1".into();

  let first = s
    .append(NewMessage::text(
      "alice_20240101120000".into(),
      "doc_1".into(),
      SenderRole::Subject,
      "hello",
    ))
    .await
    .unwrap();

  let listed = s.list(&sid, &did).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].sender, SenderRole::Subject);
  assert_eq!(listed[0].body.as_deref(), Some("hello"));

  let second = s
    .append(NewMessage::text(
      "alice_20240101120000".into(),
      "doc_1".into(),
      SenderRole::Doctor,
      "hi",
    ))
    .await
    .unwrap();
  assert!(second.message_id > first.message_id);

  let listed = s.list(&sid, &did).await.unwrap();
  assert_eq!(listed.len(), 2);
  assert_eq!(listed[0].body.as_deref(), Some("hello"));
  assert_eq!(listed[1].body.as_deref(), Some("hi"));
}

#[tokio::test]
async fn list_is_ordered_and_append_only() {
  let s = store().await;
  let sid = "pat".into();
  let did = "doc".into();

  for i in 0..10 {
    s.append(NewMessage::text(
      "pat".into(),
      "doc".into(),
      SenderRole::Subject,
      format!("m{i}"),
    ))
    .await
    .unwrap();
  }

  let listed = s.list(&sid, &did).await.unwrap();
  assert_eq!(listed.len(), 10);

  // Non-decreasing timestamps, ids strictly in append order.
  for pair in listed.windows(2) {
    assert!(pair[0].sent_at <= pair[1].sent_at);
    assert!(pair[0].message_id < pair[1].message_id);
  }

  // Appending more never rewrites what was already there.
  let before: Vec<i64> = listed.iter().map(|m| m.message_id).collect();
  s.append(NewMessage::text("pat".into(), "doc".into(), SenderRole::Doctor, "new"))
    .await
    .unwrap();
  let after = s.list(&sid, &did).await.unwrap();
  let after_ids: Vec<i64> = after.iter().take(10).map(|m| m.message_id).collect();
  assert_eq!(before, after_ids);
}

#[tokio::test]
async fn unknown_pair_lists_empty() {
  let s = store().await;
  let listed = s.list(&"nobody".into(), &"nowhere".into()).await.unwrap();
  assert!(listed.is_empty());
}

#[tokio::test]
async fn messages_are_scoped_to_their_pair() {
  let s = store().await;
  s.append(NewMessage::text("a".into(), "d1".into(), SenderRole::Subject, "to d1"))
    .await
    .unwrap();
  s.append(NewMessage::text("a".into(), "d2".into(), SenderRole::Subject, "to d2"))
    .await
    .unwrap();

  let d1 = s.list(&"a".into(), &"d1".into()).await.unwrap();
  assert_eq!(d1.len(), 1);
  assert_eq!(d1[0].body.as_deref(), Some("to d1"));
}

#[tokio::test]
async fn empty_message_rejected() {
  let s = store().await;
  let err = s
    .append(NewMessage {
      subject_id: "a".into(),
      doctor_id:  "d".into(),
      sender:     SenderRole::Subject,
      body:       None,
      image:      None,
    })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(ward_core::Error::EmptyMessage)
  ));
}

#[tokio::test]
async fn image_payload_round_trips() {
  let s = store().await;
  let image = ImagePayload {
    media_type:   "image/jpeg".into(),
    data:         "aGVsbG8=".into(),
    content_hash: "2cf24dba5fb0a30e".into(),
  };

  s.append(NewMessage {
    subject_id: "a".into(),
    doctor_id:  "d".into(),
    sender:     SenderRole::Subject,
    body:       None,
    image:      Some(image.clone()),
  })
  .await
  .unwrap();

  let listed = s.list(&"a".into(), &"d".into()).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert!(listed[0].body.is_none());
  assert_eq!(listed[0].image, Some(image));
}

#[tokio::test]
async fn conversation_partners_most_recent_first() {
  let s = store().await;
  s.append(NewMessage::text("early".into(), "doc".into(), SenderRole::Subject, "1"))
    .await
    .unwrap();
  s.append(NewMessage::text("late".into(), "doc".into(), SenderRole::Subject, "2"))
    .await
    .unwrap();
  // "early" speaks again, moving it back to the front.
  s.append(NewMessage::text("early".into(), "doc".into(), SenderRole::Subject, "3"))
    .await
    .unwrap();

  let partners = s.conversation_partners(&"doc".into()).await.unwrap();
  assert_eq!(partners.len(), 2);
  assert_eq!(partners[0].as_str(), "early");
  assert_eq!(partners[1].as_str(), "late");

  assert!(
    s.conversation_partners(&"lonely".into())
      .await
      .unwrap()
      .is_empty()
  );
}

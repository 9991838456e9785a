//! SQL schema for the Ward SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS subjects (
    subject_id        TEXT PRIMARY KEY,
    kind              TEXT NOT NULL,   -- 'human' | 'animal'; denormalised from intake_json
    intake_json       TEXT NOT NULL,   -- tagged IntakeDetails payload
    emergency         INTEGER NOT NULL DEFAULT 0,
    status            TEXT NOT NULL DEFAULT 'waiting',
    prescription_json TEXT,            -- JSON Prescription or NULL
    created_at        TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

CREATE TABLE IF NOT EXISTS doctors (
    doctor_id      TEXT PRIMARY KEY,
    username       TEXT NOT NULL UNIQUE,
    password_hash  TEXT NOT NULL,      -- argon2 PHC string
    display_name   TEXT NOT NULL,
    specialization TEXT,
    role           TEXT NOT NULL,      -- 'human' | 'veterinarian'
    registered_at  TEXT NOT NULL
);

-- Messages are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS messages (
    message_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id  TEXT NOT NULL,
    doctor_id   TEXT NOT NULL,
    sender      TEXT NOT NULL,         -- 'subject' | 'doctor'
    body        TEXT,
    image_json  TEXT,                  -- JSON ImagePayload or NULL
    sent_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS subjects_kind_idx   ON subjects(kind);
CREATE INDEX IF NOT EXISTS messages_pair_idx   ON messages(subject_id, doctor_id, sent_at);
CREATE INDEX IF NOT EXISTS messages_doctor_idx ON messages(doctor_id);

PRAGMA user_version = 1;
";

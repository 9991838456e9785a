//! WebSocket endpoints and the per-connection event loop.
//!
//! Each connection carries an explicit [`ClientIdentity`] established at
//! upgrade time — a subject id from the path, or a doctor resolved through
//! Basic auth. The identity is passed into every frame handler; the sender
//! role on outgoing messages always derives from it, never from the payload.
//!
//! On connect a client joins its personal channel (doctors also join their
//! role's broadcast group); `join_conversation` frames add pair channels on
//! top. Disconnecting tears down every membership. Events that fire while a
//! client is not joined are simply unobserved — the client re-fetches the
//! conversation over REST after reconnecting.

use std::fmt;

use axum::{
  extract::{
    Path, State, WebSocketUpgrade,
    ws::{Message as WsMessage, WebSocket},
  },
  response::Response,
};
use serde::Deserialize;
use tokio::sync::mpsc::{self, UnboundedSender};
use ward_core::{
  channel::Channel,
  doctor::{Doctor, DoctorId},
  event::Event,
  message::{ImagePayload, NewMessage, SenderRole},
  subject::SubjectId,
};
use ward_dispatch::{ConnectionId, Store};

use crate::{AppState, auth};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Who is on the other end of a socket, established once at upgrade time.
#[derive(Debug, Clone)]
pub enum ClientIdentity {
  Subject(SubjectId),
  Doctor(Doctor),
}

impl ClientIdentity {
  fn sender_role(&self) -> SenderRole {
    match self {
      Self::Subject(_) => SenderRole::Subject,
      Self::Doctor(_) => SenderRole::Doctor,
    }
  }

  /// Resolve the (subject, doctor) pair a frame addresses: the connection's
  /// own side comes from the identity, the counterparty from the frame.
  fn pair(
    &self,
    subject_id: Option<SubjectId>,
    doctor_id: Option<DoctorId>,
  ) -> Result<(SubjectId, DoctorId), &'static str> {
    match self {
      Self::Subject(sid) => {
        let did = doctor_id.ok_or("frame is missing doctor_id")?;
        Ok((sid.clone(), did))
      }
      Self::Doctor(doctor) => {
        let sid = subject_id.ok_or("frame is missing subject_id")?;
        Ok((sid, doctor.doctor_id.clone()))
      }
    }
  }
}

impl fmt::Display for ClientIdentity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Subject(id) => write!(f, "subject {id}"),
      Self::Doctor(d) => write!(f, "doctor {}", d.doctor_id),
    }
  }
}

// ─── Client frames ───────────────────────────────────────────────────────────

/// Frames accepted from clients. A subject names the doctor it is talking
/// to, a doctor names the subject; the missing side is filled in from the
/// connection identity.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
  JoinConversation {
    #[serde(default)]
    subject_id: Option<SubjectId>,
    #[serde(default)]
    doctor_id:  Option<DoctorId>,
  },
  LeaveConversation {
    #[serde(default)]
    subject_id: Option<SubjectId>,
    #[serde(default)]
    doctor_id:  Option<DoctorId>,
  },
  SendMessage {
    #[serde(default)]
    subject_id: Option<SubjectId>,
    #[serde(default)]
    doctor_id:  Option<DoctorId>,
    #[serde(default)]
    text:       Option<String>,
    #[serde(default)]
    image:      Option<ImagePayload>,
  },
  Typing {
    #[serde(default)]
    subject_id: Option<SubjectId>,
    #[serde(default)]
    doctor_id:  Option<DoctorId>,
    active:     bool,
  },
}

// ─── Upgrade handlers ────────────────────────────────────────────────────────

/// `GET /ws/subject/:id` — kiosk clients connect with the id printed on
/// their intake slip; the kiosk model trusts it.
pub async fn subject_socket<S: Store + 'static>(
  State(state): State<AppState<S>>,
  Path(id): Path<SubjectId>,
  ws: WebSocketUpgrade,
) -> Response {
  ws.on_upgrade(move |socket| {
    run_connection(state, ClientIdentity::Subject(id), socket)
  })
}

/// `GET /ws/doctor` — Basic auth resolves the doctor identity before the
/// upgrade is even considered.
pub async fn doctor_socket<S: Store + 'static>(
  State(state): State<AppState<S>>,
  auth::AuthenticatedDoctor(doctor): auth::AuthenticatedDoctor,
  ws: WebSocketUpgrade,
) -> Response {
  ws.on_upgrade(move |socket| {
    run_connection(state, ClientIdentity::Doctor(doctor), socket)
  })
}

// ─── Connection loop ─────────────────────────────────────────────────────────

async fn run_connection<S: Store>(
  state: AppState<S>,
  identity: ClientIdentity,
  mut socket: WebSocket,
) {
  let rooms = state.dispatcher.rooms().clone();
  let conn = rooms.next_connection();
  let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

  // Personal channel first; doctors also join their role broadcast group
  // so intake alerts reach them.
  match &identity {
    ClientIdentity::Subject(id) => {
      rooms.join(conn, Channel::Subject(id.clone()), tx.clone());
    }
    ClientIdentity::Doctor(doctor) => {
      rooms.join(conn, Channel::Doctor(doctor.doctor_id.clone()), tx.clone());
      rooms.join(conn, Channel::role_group(doctor.role), tx.clone());
    }
  }
  tracing::info!(identity = %identity, "client connected");

  loop {
    tokio::select! {
      incoming = socket.recv() => {
        let Some(Ok(frame)) = incoming else { break };
        match frame {
          WsMessage::Text(text) => {
            if let Err(reject) =
              handle_frame(&state, &identity, conn, &tx, text.as_str()).await
            {
              // Reported to the offending connection only, generically.
              let payload = serde_json::json!({ "error": reject }).to_string();
              if socket.send(WsMessage::Text(payload.into())).await.is_err() {
                break;
              }
            }
          }
          WsMessage::Close(_) => break,
          // Pings are answered by axum; binary frames are not part of the
          // protocol.
          _ => {}
        }
      }
      outgoing = rx.recv() => {
        let Some(event) = outgoing else { break };
        let Ok(payload) = serde_json::to_string(&event) else { continue };
        if socket.send(WsMessage::Text(payload.into())).await.is_err() {
          break;
        }
      }
    }
  }

  rooms.leave_all(conn);
  tracing::info!(identity = %identity, "client disconnected");
}

async fn handle_frame<S: Store>(
  state: &AppState<S>,
  identity: &ClientIdentity,
  conn: ConnectionId,
  tx: &UnboundedSender<Event>,
  raw: &str,
) -> Result<(), &'static str> {
  let frame: ClientMessage =
    serde_json::from_str(raw).map_err(|_| "unrecognized frame")?;
  let rooms = state.dispatcher.rooms();

  match frame {
    ClientMessage::JoinConversation {
      subject_id,
      doctor_id,
    } => {
      let (sid, did) = identity.pair(subject_id, doctor_id)?;
      rooms.join(conn, Channel::Conversation(sid, did), tx.clone());
    }

    ClientMessage::LeaveConversation {
      subject_id,
      doctor_id,
    } => {
      let (sid, did) = identity.pair(subject_id, doctor_id)?;
      rooms.leave(conn, &Channel::Conversation(sid, did));
    }

    ClientMessage::SendMessage {
      subject_id,
      doctor_id,
      text,
      image,
    } => {
      let (sid, did) = identity.pair(subject_id, doctor_id)?;
      let input = NewMessage {
        subject_id: sid,
        doctor_id:  did,
        sender:     identity.sender_role(),
        body:       text,
        image,
      };
      if !input.has_content() {
        return Err("message needs text or an image");
      }
      state.dispatcher.send_message(input).await.map_err(|e| {
        tracing::error!(error = %e, "message dispatch failed");
        "message could not be delivered"
      })?;
    }

    ClientMessage::Typing {
      subject_id,
      doctor_id,
      active,
    } => {
      let (sid, did) = identity.pair(subject_id, doctor_id)?;
      state
        .dispatcher
        .typing(&sid, &did, identity.sender_role(), active);
    }
  }

  Ok(())
}

//! [`Rooms`] — the connection registry behind channel-addressed broadcast.
//!
//! Each connected client registers an unbounded sender once and joins any
//! number of channels with it. Delivery is best-effort: events sent to a
//! channel reach exactly the connections joined at that instant, closed
//! receivers are pruned on the way, and nothing is queued for absentees.

use std::{
  collections::HashMap,
  sync::{
    Mutex,
    atomic::{AtomicU64, Ordering},
  },
};

use tokio::sync::mpsc::UnboundedSender;
use ward_core::{channel::Channel, event::Event};

// ─── ConnectionId ────────────────────────────────────────────────────────────

/// Process-unique id for one live client connection, from a monotonic
/// counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

// ─── Rooms ───────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct Rooms {
  channels: Mutex<HashMap<Channel, HashMap<ConnectionId, UnboundedSender<Event>>>>,
  next_id:  AtomicU64,
}

impl Rooms {
  pub fn new() -> Self { Self::default() }

  /// Allocate an id for a newly accepted connection.
  pub fn next_connection(&self) -> ConnectionId {
    ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed))
  }

  /// Add `conn` to `channel`. Idempotent: joining twice is observably the
  /// same as joining once.
  pub fn join(
    &self,
    conn: ConnectionId,
    channel: Channel,
    sender: UnboundedSender<Event>,
  ) {
    let mut channels = self.channels.lock().expect("rooms lock");
    channels.entry(channel).or_default().insert(conn, sender);
  }

  /// Remove `conn` from one channel.
  pub fn leave(&self, conn: ConnectionId, channel: &Channel) {
    let mut channels = self.channels.lock().expect("rooms lock");
    if let Some(members) = channels.get_mut(channel) {
      members.remove(&conn);
      if members.is_empty() {
        channels.remove(channel);
      }
    }
  }

  /// Remove `conn` from every channel — called on disconnect.
  pub fn leave_all(&self, conn: ConnectionId) {
    let mut channels = self.channels.lock().expect("rooms lock");
    channels.retain(|_, members| {
      members.remove(&conn);
      !members.is_empty()
    });
  }

  /// Deliver `event` to every connection currently joined to `channel`.
  ///
  /// Returns the number of connections reached. A channel with no members
  /// is not an error; the event is simply unobserved.
  pub fn broadcast(&self, channel: &Channel, event: &Event) -> usize {
    let mut channels = self.channels.lock().expect("rooms lock");
    let Some(members) = channels.get_mut(channel) else {
      return 0;
    };

    // Sending on a closed receiver means the client is gone; prune it.
    members.retain(|_, sender| sender.send(event.clone()).is_ok());
    let delivered = members.len();
    if members.is_empty() {
      channels.remove(channel);
    }

    tracing::debug!(
      channel = %channel,
      kind = event.kind(),
      delivered,
      "broadcast"
    );
    delivered
  }

  /// Current membership size of a channel.
  pub fn member_count(&self, channel: &Channel) -> usize {
    self
      .channels
      .lock()
      .expect("rooms lock")
      .get(channel)
      .map_or(0, HashMap::len)
  }
}

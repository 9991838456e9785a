//! Real-time fan-out for Ward: the room router and the notification
//! dispatcher.
//!
//! [`Rooms`] maps named channels to connected clients and delivers events
//! at-most-once, with no queueing or redelivery. [`Dispatcher`] is the single
//! ingest point for state-changing actions: it persists first and broadcasts
//! the corresponding event second, so a persistence failure never produces a
//! partial broadcast.

mod dispatcher;
mod rooms;

pub use dispatcher::{Dispatcher, Store};
pub use rooms::{ConnectionId, Rooms};

#[cfg(test)]
mod tests;

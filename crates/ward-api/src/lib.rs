//! JSON REST API for Ward.
//!
//! Exposes an axum [`Router`] backed by any store implementing the
//! `ward-core` traits. State-changing handlers go through the
//! [`ward_dispatch::Dispatcher`] so persistence and notification fan-out
//! stay ordered. Auth, TLS, and transport concerns are the caller's
//! responsibility; handlers trust the identities handed to them.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", ward_api::api_router(state.clone()))
//! ```

pub mod doctors;
pub mod error;
pub mod messages;
pub mod subjects;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use ward_dispatch::{Dispatcher, Store};

pub use error::ApiError;

// ─── State ───────────────────────────────────────────────────────────────────

/// Shared state threaded through all API handlers.
pub struct ApiState<S> {
  pub store:      Arc<S>,
  pub dispatcher: Arc<Dispatcher<S>>,
}

// Manual impl: `S` itself need not be `Clone`.
impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      dispatcher: Arc::clone(&self.dispatcher),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: Store + 'static,
{
  Router::new()
    // Subjects
    .route(
      "/subjects",
      get(subjects::list::<S>).post(subjects::create::<S>),
    )
    .route(
      "/subjects/{id}",
      get(subjects::get_one::<S>).delete(subjects::delete_one::<S>),
    )
    .route("/subjects/{id}/queue", get(subjects::queue_position::<S>))
    .route("/subjects/{id}/prescription", post(subjects::prescribe::<S>))
    // Messages
    .route(
      "/messages",
      get(messages::list::<S>).post(messages::send::<S>),
    )
    // Doctors
    .route("/doctors", get(doctors::list::<S>))
    .route(
      "/doctors/{id}/conversations",
      get(doctors::conversations::<S>),
    )
    .with_state(state)
}

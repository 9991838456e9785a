//! Ward server library: configuration, shared state, and router assembly.
//!
//! Composes the REST surface from `ward-api`, the WebSocket surface from
//! [`ws`], and the auth boundary from [`auth`] into one axum [`Router`]
//! backed by any store implementing the `ward-core` traits.

pub mod auth;
pub mod error;
pub mod ws;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use ward_api::ApiState;
use ward_core::{
  doctor::{DoctorRole, NewDoctor},
  store::RecordStore,
};
use ward_dispatch::{Dispatcher, Store};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Doctors inserted at startup when their username is absent. Replaces
  /// the old hard-coded sample accounts; credentials are PHC hashes, never
  /// plaintext.
  #[serde(default)]
  pub seed_doctors: Vec<SeedDoctor>,
}

#[derive(Deserialize, Clone)]
pub struct SeedDoctor {
  pub username:      String,
  /// PHC string; generate one with `server --hash-password`.
  pub password_hash: String,
  pub display_name:  String,
  #[serde(default)]
  pub specialization: Option<String>,
  pub role:          DoctorRole,
}

/// Insert the configured seed doctors that are not already present.
/// Returns how many were inserted.
pub async fn seed_doctors<S: Store>(
  store: &S,
  seeds: &[SeedDoctor],
) -> Result<usize, <S as RecordStore>::Error> {
  let mut inserted = 0;
  for seed in seeds {
    if store.find_doctor(&seed.username).await?.is_some() {
      continue;
    }
    store
      .add_doctor(NewDoctor {
        username:       seed.username.clone(),
        password_hash:  seed.password_hash.clone(),
        display_name:   seed.display_name.clone(),
        specialization: seed.specialization.clone(),
        role:           seed.role,
      })
      .await?;
    inserted += 1;
  }
  Ok(inserted)
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:      Arc<S>,
  pub dispatcher: Arc<Dispatcher<S>>,
  pub config:     Arc<ServerConfig>,
}

// Manual impl: `S` itself need not be `Clone`.
impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      dispatcher: Arc::clone(&self.dispatcher),
      config:     Arc::clone(&self.config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete axum [`Router`]: REST under `/api`, auth under
/// `/auth`, WebSocket upgrades under `/ws`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: Store + 'static,
{
  let api_state = ApiState {
    store:      Arc::clone(&state.store),
    dispatcher: Arc::clone(&state.dispatcher),
  };

  Router::new()
    .route("/auth/login", post(auth::login::<S>))
    .route("/auth/register", post(auth::register::<S>))
    .route("/ws/subject/{id}", get(ws::subject_socket::<S>))
    .route("/ws/doctor", get(ws::doctor_socket::<S>))
    .with_state(state)
    .nest("/api", ward_api::api_router(api_state))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────

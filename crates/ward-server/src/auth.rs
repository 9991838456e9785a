//! HTTP Basic-auth against stored doctor credentials, plus the login and
//! registration endpoints.
//!
//! `authenticate` is the whole auth boundary: it resolves credentials to a
//! [`Doctor`] identity once, and everything downstream trusts the identity
//! it is handed without re-validating.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  Json,
  extract::{FromRequestParts, State},
  http::{HeaderMap, StatusCode, request::Parts},
  response::IntoResponse,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rand_core::OsRng;
use serde::Deserialize;
use ward_core::{
  doctor::{Doctor, DoctorProfile, DoctorRole, NewDoctor},
  store::RecordStore,
};
use ward_dispatch::Store;

use crate::{AppState, error::Error};

// ─── Verification ────────────────────────────────────────────────────────────

/// Resolve HTTP Basic credentials to a stored doctor identity.
pub async fn authenticate<S: Store>(
  headers: &HeaderMap,
  store: &S,
) -> Result<Doctor, Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  let doctor = store
    .find_doctor(username)
    .await
    .map_err(Error::store)?
    .ok_or(Error::Unauthorized)?;

  verify_password(password, &doctor.password_hash)?;
  Ok(doctor)
}

/// Extractor: present in a handler means the request carried valid doctor
/// credentials. Listed before [`axum::extract::WebSocketUpgrade`] in the
/// doctor socket handler so auth is decided before the upgrade is.
pub struct AuthenticatedDoctor(pub Doctor);

impl<S> FromRequestParts<AppState<S>> for AuthenticatedDoctor
where
  S: Store + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let doctor = authenticate(&parts.headers, state.store.as_ref()).await?;
    Ok(Self(doctor))
  }
}

fn verify_password(password: &str, phc: &str) -> Result<(), Error> {
  let parsed_hash = PasswordHash::new(phc).map_err(|_| Error::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)
}

/// Hash a plaintext password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| Error::BadRequest(format!("cannot hash password: {e}")))
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub username: String,
  pub password: String,
}

/// `POST /auth/login` — body credentials; returns the doctor's profile.
pub async fn login<S: Store>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<DoctorProfile>, Error> {
  let doctor = state
    .store
    .find_doctor(&body.username)
    .await
    .map_err(Error::store)?
    .ok_or(Error::Unauthorized)?;

  verify_password(&body.password, &doctor.password_hash)?;
  Ok(Json(doctor.profile()))
}

// ─── Registration ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub username:       String,
  pub password:       String,
  pub display_name:   String,
  #[serde(default)]
  pub specialization: Option<String>,
  pub role:           DoctorRole,
}

/// `POST /auth/register` — 201 + profile, or 409 when the username exists.
pub async fn register<S: Store>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, Error> {
  if body.username.is_empty() || body.password.is_empty() {
    return Err(Error::BadRequest(
      "username and password are required".to_string(),
    ));
  }

  if state
    .store
    .find_doctor(&body.username)
    .await
    .map_err(Error::store)?
    .is_some()
  {
    return Err(Error::Conflict("username already exists".to_string()));
  }

  let doctor = state
    .store
    .add_doctor(NewDoctor {
      username:       body.username,
      password_hash:  hash_password(&body.password)?,
      display_name:   body.display_name,
      specialization: body.specialization,
      role:           body.role,
    })
    .await
    .map_err(Error::store)?;

  tracing::info!(doctor_id = %doctor.doctor_id, "doctor registered");
  Ok((StatusCode::CREATED, Json(doctor.profile())))
}

//! # Identity Gate
//!
//! Sign-in itself belongs to the identity provider. The provider hands the browser a `session`
//! cookie and this module only checks it.
//!
//! ## Cookie
//! - `session=<subject>.<expiry unix seconds>.<hex HMAC-SHA256 of "<subject>.<expiry>">`
//! - Signed with a secret shared with the provider
//! - Expired, malformed or badly signed cookies count as signed out
//!
//! ## Gating
//! - Checked on every request to a gated route, never cached
//! - Signed-out requests are sent to `/sign-in`, which forwards to the provider
//! - Anyone may browse and donate, only creating needs a session
use std::sync::Arc;

use axum::{
    extract::{self, Request},
    http::{HeaderMap, header::COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac, digest::InvalidLength};
use sha2::Sha256;
use tracing::debug;

use crate::state::State;

pub const SESSION_COOKIE: &str = "session";
pub const SIGN_IN_PATH: &str = "/sign-in";
pub const SIGN_UP_PATH: &str = "/sign-up";

type HmacSha256 = Hmac<Sha256>;

pub trait IdentityGate: Send + Sync {
    fn is_authenticated(&self, headers: &HeaderMap) -> bool;
}

/// Value of cookie `name`, if the request carries it.
pub fn cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find_map(|(key, value)| (key == name).then_some(value))
}

#[derive(Clone)]
pub struct SessionGate {
    mac: HmacSha256,
}

impl SessionGate {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, InvalidLength> {
        Ok(Self {
            mac: HmacSha256::new_from_slice(secret.as_ref())?,
        })
    }

    fn signature(&self, payload: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac
    }

    /// Mints a session cookie value for `subject`.
    pub fn issue(&self, subject: &str, expires_at: DateTime<Utc>) -> String {
        let payload = format!("{subject}.{}", expires_at.timestamp());
        let signature = hex::encode(self.signature(&payload).finalize().into_bytes());

        format!("{payload}.{signature}")
    }

    /// Subject of a valid, unexpired token.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Option<String> {
        let (payload, signature) = token.rsplit_once('.')?;
        let (subject, expiry) = payload.rsplit_once('.')?;

        let signature = hex::decode(signature).ok()?;
        self.signature(payload).verify_slice(&signature).ok()?;

        let expiry: i64 = expiry.parse().ok()?;
        if expiry <= now.timestamp() || subject.is_empty() {
            return None;
        }

        Some(subject.to_string())
    }
}

impl IdentityGate for SessionGate {
    fn is_authenticated(&self, headers: &HeaderMap) -> bool {
        cookie(headers, SESSION_COOKIE)
            .and_then(|token| self.verify(token, Utc::now()))
            .is_some()
    }
}

pub async fn require_session(
    extract::State(state): extract::State<Arc<State>>,
    request: Request,
    next: Next,
) -> Response {
    if state.gate.is_authenticated(request.headers()) {
        return next.run(request).await;
    }

    debug!("No session for {}, redirecting to sign in", request.uri());
    Redirect::to(SIGN_IN_PATH).into_response()
}

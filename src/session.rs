//! Session cookies and CSRF tokens
//!
//! A session is nothing more than a random id carried in a signed cookie.
//! The cookie value is an HS256 JWT `{ sid, typ: "session", iat, exp }`
//! signed with the session secret. CSRF tokens are separate HS256 JWTs
//! `{ sid, typ: "csrf", iat, exp }` signed with the CSRF secret; a token is
//! only accepted when its `sid` equals the current session id.

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use axum::http::{header, HeaderMap};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the hidden form field carrying the CSRF token
pub const CSRF_FIELD: &str = "_csrf";

/// Header accepted as an alternative to the form field
pub const CSRF_HEADER: &str = "x-csrf-token";

const SESSION_TYP: &str = "session";
const CSRF_TYP: &str = "csrf";

/// The session attached to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Session id
    pub sid: String,
    /// True when the session was created for this request
    pub is_new: bool,
}

impl Session {
    /// Start a new session with a fresh id
    pub fn fresh() -> Self {
        Self {
            sid: new_session_id(),
            is_new: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sid: String,
    typ: String,
    iat: i64,
    exp: i64,
}

/// Signing keys and cookie settings
#[derive(Clone)]
pub struct SessionKeys {
    cookie_name: String,
    max_age_secs: u64,
    secure: bool,
    session_encoding: EncodingKey,
    session_decoding: DecodingKey,
    csrf_encoding: EncodingKey,
    csrf_decoding: DecodingKey,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("cookie_name", &self.cookie_name)
            .field("max_age_secs", &self.max_age_secs)
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

impl SessionKeys {
    /// Build keys from configuration
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            cookie_name: config.cookie_name.clone(),
            max_age_secs: config.max_age_secs,
            secure: config.secure_cookie,
            session_encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            session_decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            csrf_encoding: EncodingKey::from_secret(config.csrf_secret.as_bytes()),
            csrf_decoding: DecodingKey::from_secret(config.csrf_secret.as_bytes()),
        }
    }

    /// Cookie name
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Session from the request cookie, or a fresh one if it is missing or invalid
    pub fn load_or_create(&self, headers: &HeaderMap) -> Session {
        let Some(value) = cookie_value(headers, &self.cookie_name) else {
            return Session::fresh();
        };

        match self.verify(&value, &self.session_decoding, SESSION_TYP) {
            Ok(sid) => Session { sid, is_new: false },
            Err(e) => {
                tracing::debug!(error = %e, "Discarding invalid session cookie");
                Session::fresh()
            }
        }
    }

    /// `Set-Cookie` header value for `session`
    pub fn set_cookie_header(&self, session: &Session) -> Result<String> {
        let token = self.sign(&session.sid, &self.session_encoding, SESSION_TYP)?;
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            self.cookie_name, token, self.max_age_secs
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        Ok(cookie)
    }

    /// CSRF token bound to `session`
    pub fn csrf_token(&self, session: &Session) -> Result<String> {
        self.sign(&session.sid, &self.csrf_encoding, CSRF_TYP)
    }

    /// Accept `token` only if it was issued for `session`
    pub fn verify_csrf(&self, session: &Session, token: &str) -> Result<()> {
        match self.verify(token, &self.csrf_decoding, CSRF_TYP) {
            Ok(sid) if sid == session.sid => Ok(()),
            Ok(_) => Err(Error::CsrfMismatch),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected CSRF token");
                Err(Error::CsrfMismatch)
            }
        }
    }

    fn sign(&self, sid: &str, key: &EncodingKey, typ: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        #[allow(clippy::cast_possible_wrap)]
        let claims = Claims {
            sid: sid.to_string(),
            typ: typ.to_string(),
            iat: now,
            exp: now + self.max_age_secs as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, key)
            .map_err(|e| Error::session(format!("Failed to sign {typ} token: {e}")))
    }

    fn verify(&self, token: &str, key: &DecodingKey, typ: &str) -> Result<String> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, key, &validation)
            .map_err(|e| Error::session(format!("Invalid {typ} token: {e}")))?;

        if data.claims.typ != typ {
            return Err(Error::session(format!(
                "Expected {typ} token, got {}",
                data.claims.typ
            )));
        }
        Ok(data.claims.sid)
    }
}

/// Value of cookie `name` from the request headers
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Generate a random session id
fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

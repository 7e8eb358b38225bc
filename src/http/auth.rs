//! Bearer tokens backed by revocable session rows.
//!
//! A token is only honoured while the session named by its `jti` exists and
//! has not expired, so logging out (or deleting the member) cuts it off even
//! though the signature would still verify.

use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::error::AppError;
use super::types::AppState;

pub const NOT_LOGGED_IN: &str = "Utilisateur non connecté";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Member id.
    pub sub: String,
    pub email: String,
    pub role: String,
    /// Session id.
    pub jti: String,
    pub iat: usize,
    pub exp: usize,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, session: &Session, email: &str, role: &str) -> Result<String, AppError> {
        let claims = Claims {
            sub: session.member_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            jti: session.id.clone(),
            iat: session.created_at.timestamp().max(0) as usize,
            exp: session.expires_at.timestamp().max(0) as usize,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("rejected token: {e}");
                AppError::Unauthorized(NOT_LOGGED_IN.to_string())
            })
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub member_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub fn open_session(conn: &Connection, member_id: i64, ttl: Duration) -> Result<Session, AppError> {
    let created_at = Utc::now();
    let ttl = chrono::Duration::from_std(ttl)
        .map_err(|e| AppError::Internal(format!("invalid session lifetime: {e}")))?;
    let session = Session {
        id: Uuid::new_v4().to_string(),
        member_id,
        created_at,
        expires_at: created_at + ttl,
    };
    conn.execute(
        "INSERT INTO sessions(id, member_id, created_at, expires_at) VALUES(?, ?, ?, ?)",
        params![
            session.id,
            session.member_id,
            session.created_at.to_rfc3339(),
            session.expires_at.to_rfc3339()
        ],
    )?;
    Ok(session)
}

/// True while the session row exists, belongs to `member_id` and is unexpired.
pub fn session_is_live(conn: &Connection, id: &str, member_id: i64) -> Result<bool, AppError> {
    let expires_at: Option<String> = conn
        .query_row(
            "SELECT expires_at FROM sessions WHERE id = ? AND member_id = ?",
            params![id, member_id],
            |r| r.get(0),
        )
        .optional()?;

    Ok(match expires_at {
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc) > Utc::now())
            .unwrap_or(false),
        None => false,
    })
}

pub fn close_session(conn: &Connection, id: &str) -> Result<usize, AppError> {
    Ok(conn.execute("DELETE FROM sessions WHERE id = ?", [id])?)
}

pub fn hash_password(plain: &str) -> Result<String, AppError> {
    Ok(bcrypt::hash(plain, bcrypt::DEFAULT_COST)?)
}

/// Malformed stored hashes count as a mismatch.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    bcrypt::verify(plain, hash).unwrap_or(false)
}

/// The member behind a verified token with a live session.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub member_id: i64,
    pub email: String,
    pub role: String,
    pub session_id: String,
}

fn bearer(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<AuthContext>() {
            return Ok(ctx.clone());
        }

        let token = bearer(parts).ok_or_else(|| AppError::Unauthorized(NOT_LOGGED_IN.to_string()))?;
        let claims = state.tokens.verify(token)?;
        let member_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::Unauthorized(NOT_LOGGED_IN.to_string()))?;

        let session_id = claims.jti.clone();
        let live = state
            .with_conn(move |conn| session_is_live(conn, &session_id, member_id))
            .await?;
        if !live {
            debug!(member_id, "session revoked or expired");
            return Err(AppError::Unauthorized(NOT_LOGGED_IN.to_string()));
        }

        Ok(AuthContext {
            member_id,
            email: claims.email,
            role: claims.role,
            session_id: claims.jti,
        })
    }
}

/// Rejects requests without a live session before they reach the handler.
pub async fn require_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = request.into_parts();
    let ctx = AuthContext::from_request_parts(&mut parts, &state).await?;
    parts.extensions.insert(ctx);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

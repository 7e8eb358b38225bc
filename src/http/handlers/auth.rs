use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Router,
};
use rusqlite::OptionalExtension;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::http::auth::{
    close_session, hash_password, open_session, verify_password, AuthContext,
};
use crate::http::catalog::ROLES;
use crate::http::error::{AppError, Reply};
use crate::http::resource::query_row;
use crate::http::types::{parse_body, AppState, Body};

/// Non-empty string, or a number read as its decimal text.
fn text_field(body: &Body, name: &str) -> Option<String> {
    match body.get(name)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

struct MemberCredentials {
    id: i64,
    email: String,
    role: String,
    hash: String,
}

async fn login(State(state): State<AppState>, raw: Bytes) -> Result<Reply, AppError> {
    let body = parse_body(&raw);
    let (Some(email), Some(password)) = (text_field(&body, "email"), text_field(&body, "password"))
    else {
        return Err(AppError::BadRequest("Email et mot de passe requis".to_string()));
    };

    let ttl = state.tokens.ttl();
    let lookup_email = email.clone();
    let outcome = state
        .with_conn(move |conn| {
            let member = conn
                .query_row(
                    "SELECT id, email, role, mot_de_passe FROM membre_administratif WHERE email = ?",
                    [&lookup_email],
                    |r| {
                        Ok(MemberCredentials {
                            id: r.get(0)?,
                            email: r.get(1)?,
                            role: r.get(2)?,
                            hash: r.get(3)?,
                        })
                    },
                )
                .optional()?;

            match member {
                Some(m) if verify_password(&password, &m.hash) => {
                    let session = open_session(conn, m.id, ttl)?;
                    Ok(Some((m, session)))
                }
                _ => Ok(None),
            }
        })
        .await?;

    let Some((member, session)) = outcome else {
        warn!(email = %email, "failed login");
        return Ok(Reply::new(
            StatusCode::UNAUTHORIZED,
            json!({ "message": "Identifiants incorrects", "success": false }),
        ));
    };

    let token = state.tokens.issue(&session, &member.email, &member.role)?;
    info!(member_id = member.id, "member logged in");

    Ok(Reply::ok(json!({
        "message": "Connexion réussie",
        "success": true,
        "user": {
            "id": member.id,
            "email": member.email,
            "role": member.role,
        },
        "token": token,
    })))
}

async fn register(State(state): State<AppState>, raw: Bytes) -> Result<Reply, AppError> {
    let body = parse_body(&raw);
    let fields = ["nom", "prenom", "email", "password", "role"].map(|f| text_field(&body, f));
    let [Some(nom), Some(prenom), Some(email), Some(password), Some(role)] = fields else {
        return Err(AppError::BadRequest("Tous les champs sont requis".to_string()));
    };
    if !ROLES.contains(&role.as_str()) {
        return Err(AppError::BadRequest("Invalid role".to_string()));
    }

    let id = state
        .with_conn(move |conn| {
            let taken = conn
                .query_row(
                    "SELECT 1 FROM membre_administratif WHERE email = ?",
                    [&email],
                    |r| r.get::<_, i64>(0),
                )
                .optional()?
                .is_some();
            if taken {
                return Err(AppError::Conflict(
                    "Un compte avec cet email existe déjà".to_string(),
                ));
            }

            let hash = hash_password(&password)?;
            conn.execute(
                "INSERT INTO membre_administratif(nom, prenom, email, mot_de_passe, role)
                 VALUES(?, ?, ?, ?, ?)",
                [&nom, &prenom, &email, &hash, &role],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await?;

    info!(member_id = id, "account registered");
    Ok(Reply::created(json!({
        "message": "Compte créé avec succès",
        "id": id,
    })))
}

async fn logout(
    State(state): State<AppState>,
    ctx: Option<AuthContext>,
) -> Result<Reply, AppError> {
    if let Some(ctx) = ctx {
        let session_id = ctx.session_id.clone();
        state
            .with_conn(move |conn| close_session(conn, &session_id))
            .await?;
        info!(
            member_id = ctx.member_id,
            email = %ctx.email,
            role = %ctx.role,
            "member logged out"
        );
    }
    Ok(Reply::ok(json!({ "message": "Déconnexion réussie" })))
}

async fn profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Reply, AppError> {
    let member_id = ctx.member_id;
    let user = state
        .with_conn(move |conn| {
            Ok(query_row(
                conn,
                "SELECT id, nom, prenom, email, role FROM membre_administratif WHERE id = ?",
                [member_id],
            )?)
        })
        .await?;

    Ok(match user {
        Some(user) => Reply::ok(json!({ "user": user })),
        None => Reply::new(
            StatusCode::NOT_FOUND,
            json!({ "error": "Utilisateur non trouvé" }),
        ),
    })
}

async fn student_login(State(state): State<AppState>, raw: Bytes) -> Result<Reply, AppError> {
    let body = parse_body(&raw);
    let (Some(matricule), Some(code)) = (text_field(&body, "matricule"), text_field(&body, "code"))
    else {
        return Err(AppError::BadRequest("Champs obligatoires manquants".to_string()));
    };

    // Access codes are stored and compared as issued.
    let etudiant = state
        .with_conn(move |conn| {
            Ok(query_row(
                conn,
                "SELECT matricule, nom, prenom, email, date_naissance, sexe, telephone, code, niveau
                 FROM etudiant WHERE matricule = ? AND code = ?",
                [&matricule, &code],
            )?)
        })
        .await?;

    match etudiant {
        Some(etudiant) => Ok(Reply::ok(json!({
            "message": "Connexion réussie",
            "etudiant": etudiant,
        }))),
        None => Err(AppError::Unauthorized(
            "Matricule ou code incorrect".to_string(),
        )),
    }
}

/// Routes open to anyone.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/register", post(register))
        .route("/api/logout", post(logout))
        .route("/api/etudiants/login", post(student_login))
}

/// Routes that expect [`crate::http::auth::require_session`] in front of them.
pub fn session_routes() -> Router<AppState> {
    Router::new().route("/api/user/profil", get(profile))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_field_reads_strings_and_numbers() {
        let body = parse_body(br#"{"a":"ETU1","b":20240001,"c":"","d":null,"e":true}"#);
        assert_eq!(text_field(&body, "a").as_deref(), Some("ETU1"));
        assert_eq!(text_field(&body, "b").as_deref(), Some("20240001"));
        assert_eq!(text_field(&body, "c"), None);
        assert_eq!(text_field(&body, "d"), None);
        assert_eq!(text_field(&body, "e"), None);
        assert_eq!(text_field(&body, "missing"), None);
    }
}

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::http::catalog::FILIERES;
use crate::http::error::AppError;
use crate::http::resource::{query_row, query_rows};
use crate::http::types::AppState;

async fn latest_academic_year(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let row = state
        .with_conn(|conn| {
            Ok(query_row(
                conn,
                "SELECT id, annee FROM annee_academique ORDER BY annee DESC LIMIT 1",
                [],
            )?)
        })
        .await?;
    row.map(Json)
        .ok_or_else(|| AppError::NotFound("No academic years found".to_string()))
}

async fn study_years_by_filiere(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Vec<Value>>, AppError> {
    let filiere_id = FILIERES.parse_key(&raw_id)?;
    let rows = state
        .with_conn(move |conn| {
            if !FILIERES.exists(conn, &filiere_id)? {
                return Err(FILIERES.not_found());
            }
            Ok(query_rows(
                conn,
                "SELECT id, code, niveau, filiere_id, grade_id
                 FROM annee_etude WHERE filiere_id = ? ORDER BY id",
                [&filiere_id],
            )?)
        })
        .await?;
    Ok(Json(rows))
}

/// Zero, absent and non-numeric values all count as missing.
fn nonzero(params: &HashMap<String, String>, name: &str) -> Option<i64> {
    params
        .get(name)
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v != 0)
}

/// One line per enrolled student for an ECUE; unscored students read as 0.
async fn grading_sheet(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Value>>, AppError> {
    let wanted = ["ecue_id", "annee_etude_id", "annee_academique_id", "semestre"]
        .map(|name| nonzero(&params, name));
    let [Some(ecue_id), Some(annee_etude_id), Some(annee_academique_id), Some(semestre)] = wanted
    else {
        return Err(AppError::BadRequest(
            "Missing required parameters".to_string(),
        ));
    };

    let rows = state
        .with_conn(move |conn| {
            Ok(query_rows(
                conn,
                "SELECT e.matricule, e.nom, e.prenom, COALESCE(n.note, 0) AS note
                 FROM etudiant e
                 JOIN parcours_etudiant pe ON e.matricule = pe.etudiant_matricule
                 LEFT JOIN note n ON n.parcours_etudiant_id = pe.id AND n.ecue_id = ?
                 WHERE pe.annee_etude_id = ?
                   AND pe.annee_academique_id = ?
                   AND pe.semestre = ?
                 ORDER BY e.nom, e.prenom, e.matricule",
                [ecue_id, annee_etude_id, annee_academique_id, semestre],
            )?)
        })
        .await?;
    Ok(Json(rows))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/annees-academiques/latest", get(latest_academic_year))
        .route(
            "/api/annees-etude/filiere/:filiere_id",
            get(study_years_by_filiere),
        )
        .route("/api/notes", get(grading_sheet))
}

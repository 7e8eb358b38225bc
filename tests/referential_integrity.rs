mod test_support;

use axum::http::StatusCode;
use serde_json::json;
use test_support::{count, create, delete, enrolment, get, post, put, spawn_app};

#[tokio::test]
async fn filiere_and_grade_with_study_years_cannot_be_deleted() {
    let app = spawn_app("notefinder-ri-parents");
    let e = enrolment(&app).await;

    let (status, resp) = delete(&app, &format!("/api/filieres/{}", e.filiere_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp["message"],
        "Cannot delete filiere with related annee_etude records"
    );
    let (status, _) = get(&app, &format!("/api/filieres/{}", e.filiere_id)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, resp) = delete(&app, &format!("/api/grades/{}", e.grade_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp["message"],
        "Cannot delete grade with related annee_etude records"
    );
    assert_eq!(count(&app, "/api/grades").await, 1);
}

#[tokio::test]
async fn deletes_succeed_once_dependents_are_gone() {
    let app = spawn_app("notefinder-ri-unwind");
    let e = enrolment(&app).await;

    let (status, _) = delete(&app, &format!("/api/annees-etude/{}", e.annee_etude_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = delete(&app, &format!("/api/parcours_etudiant/{}", e.parcours_id)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, resp) = delete(&app, &format!("/api/annees-etude/{}", e.annee_etude_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["message"], "Study year deleted successfully");

    let (status, resp) = delete(&app, &format!("/api/filieres/{}", e.filiere_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["affected_rows"], 1);
}

#[tokio::test]
async fn unknown_references_are_404_and_write_nothing() {
    let app = spawn_app("notefinder-ri-references");

    let (status, resp) = post(
        &app,
        "/api/annees-etude",
        json!({ "code": "M1", "niveau": 4, "filiere_id": 404 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(resp["message"], "Referenced filiere not found");
    assert_eq!(count(&app, "/api/annees-etude").await, 0);

    let study_year = create(&app, "/api/annees-etude", json!({ "code": "M1", "niveau": 4 })).await;
    let (status, resp) = put(
        &app,
        &format!("/api/annees-etude/{study_year}"),
        json!({ "grade_id": 77 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(resp["message"], "Referenced grade not found");

    let (status, resp) = post(
        &app,
        "/api/parcours_etudiant",
        json!({
            "etudiant_matricule": "GHOST",
            "annee_etude_id": study_year,
            "annee_academique_id": 1,
            "semestre": 1,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(resp["message"], "Étudiant référencé non trouvé");
}

#[tokio::test]
async fn scored_enrolments_and_students_are_protected() {
    let app = spawn_app("notefinder-ri-scores");
    let e = enrolment(&app).await;
    let ue = create(
        &app,
        "/api/ue",
        json!({ "code": "UE1", "nom": "Maths", "credit": 5, "semestre": 1, "annee_etude_id": e.annee_etude_id }),
    )
    .await;
    let ecue = create(&app, "/api/ecues", json!({ "code": "EC1", "nom": "Analyse", "ue_id": ue })).await;
    create(
        &app,
        "/api/note",
        json!({ "ecue_id": ecue, "parcours_etudiant_id": e.parcours_id, "note": 14.5 }),
    )
    .await;

    let (status, _) = delete(&app, &format!("/api/parcours_etudiant/{}", e.parcours_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = delete(&app, &format!("/api/ecues/{ecue}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, resp) = delete(&app, &format!("/api/etudiants/{}", e.matricule)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp["message"],
        "Impossible de supprimer - étudiant référencé dans parcours_etudiant"
    );
    let (status, _) = delete(&app, &format!("/api/ue/{ue}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = delete(
        &app,
        &format!("/api/annees-academiques/{}", e.annee_academique_id),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(count(&app, "/api/note").await, 1);
    assert_eq!(count(&app, "/api/parcours_etudiant").await, 1);
}

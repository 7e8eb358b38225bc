#![allow(dead_code)]

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use notefinderd::http::{build_router, AppState};
use notefinderd::{db, Config};
use serde_json::{json, Value};
use tower::ServiceExt;

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

/// Router over a fresh database file.
pub fn spawn_app(prefix: &str) -> Router {
    let dir = temp_dir(prefix);
    let config = Config::for_database(dir.join("notefinder.sqlite3"));
    let pool = db::open_pool(&config).expect("open pool");
    build_router(AppState::new(pool, config))
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let response = app.clone().oneshot(request).await.expect("router response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None, None).await
}

pub async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body), None).await
}

pub async fn put(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::PUT, uri, Some(body), None).await
}

pub async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::DELETE, uri, None, None).await
}

/// POSTs and returns the new row's id, failing the test on anything but 201.
pub async fn create(app: &Router, uri: &str, body: Value) -> Value {
    let (status, resp) = post(app, uri, body).await;
    assert_eq!(status, StatusCode::CREATED, "create {uri}: {resp}");
    resp.get("id").cloned().expect("id in create response")
}

pub async fn count(app: &Router, uri: &str) -> usize {
    let (status, rows) = get(app, uri).await;
    assert_eq!(status, StatusCode::OK, "list {uri}: {rows}");
    rows.as_array().expect("list is an array").len()
}

/// Registers an admin account and returns a bearer token for it.
pub async fn admin_token(app: &Router, email: &str) -> String {
    let (status, resp) = post(
        app,
        "/api/register",
        json!({
            "nom": "Traore",
            "prenom": "Fatou",
            "email": email,
            "password": "motdepasse",
            "role": "Admin",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register: {resp}");

    let (status, resp) = post(
        app,
        "/api/login",
        json!({ "email": email, "password": "motdepasse" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login: {resp}");
    resp.get("token")
        .and_then(|v| v.as_str())
        .expect("token")
        .to_string()
}

/// A filiere, grade, study year, academic year and student, enrolled once.
pub struct Enrolment {
    pub filiere_id: Value,
    pub grade_id: Value,
    pub annee_etude_id: Value,
    pub annee_academique_id: Value,
    pub matricule: String,
    pub parcours_id: Value,
}

pub async fn student(app: &Router, matricule: &str, nom: &str, prenom: &str) {
    create(
        app,
        "/api/etudiants",
        json!({
            "matricule": matricule,
            "nom": nom,
            "prenom": prenom,
            "email": format!("{}@etu.example.org", matricule.to_lowercase()),
            "date_naissance": "2002-05-14",
            "sexe": "F",
            "telephone": "0700000000",
            "code": format!("CODE-{matricule}"),
        }),
    )
    .await;
}

pub async fn enrolment(app: &Router) -> Enrolment {
    let filiere_id = create(
        app,
        "/api/filieres",
        json!({ "code": "INFO", "nom": "Informatique", "domaine": "Sciences" }),
    )
    .await;
    let grade_id = create(app, "/api/grades", json!({ "nom": "Licence" })).await;
    let annee_etude_id = create(
        app,
        "/api/annees-etude",
        json!({ "code": "L1-INFO", "niveau": 1, "filiere_id": filiere_id, "grade_id": grade_id }),
    )
    .await;
    let annee_academique_id =
        create(app, "/api/annees-academiques", json!({ "annee": "2023-2024" })).await;

    student(app, "ETU001", "Kone", "Awa").await;
    let parcours_id = create(
        app,
        "/api/parcours_etudiant",
        json!({
            "etudiant_matricule": "ETU001",
            "annee_etude_id": annee_etude_id,
            "annee_academique_id": annee_academique_id,
            "semestre": 1,
        }),
    )
    .await;

    Enrolment {
        filiere_id,
        grade_id,
        annee_etude_id,
        annee_academique_id,
        matricule: "ETU001".to_string(),
        parcours_id,
    }
}

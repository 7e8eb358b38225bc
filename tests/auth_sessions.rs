mod test_support;

use axum::http::{Method, StatusCode};
use serde_json::json;
use test_support::{admin_token, get, post, send, spawn_app};

#[tokio::test]
async fn login_with_wrong_password_is_401() {
    let app = spawn_app("notefinder-auth-wrong-password");
    admin_token(&app, "admin@example.org").await;

    let (status, resp) = post(
        &app,
        "/api/login",
        json!({ "email": "admin@example.org", "password": "nope" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        resp,
        json!({ "message": "Identifiants incorrects", "success": false })
    );

    let (status, resp) = post(
        &app,
        "/api/login",
        json!({ "email": "nobody@example.org", "password": "nope" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp["success"], false);
}

#[tokio::test]
async fn login_requires_both_credentials() {
    let app = spawn_app("notefinder-auth-missing");
    let (status, resp) = post(&app, "/api/login", json!({ "email": "a@b.c" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["message"], "Email et mot de passe requis");
}

#[tokio::test]
async fn successful_login_returns_user_and_token() {
    let app = spawn_app("notefinder-auth-login");
    admin_token(&app, "chef@example.org").await;

    let (status, resp) = post(
        &app,
        "/api/login",
        json!({ "email": "chef@example.org", "password": "motdepasse" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["message"], "Connexion réussie");
    assert_eq!(resp["success"], true);
    assert_eq!(resp["user"]["email"], "chef@example.org");
    assert_eq!(resp["user"]["role"], "Admin");
    assert!(resp["user"]["id"].is_i64());
    assert!(resp["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn register_validates_and_rejects_duplicates() {
    let app = spawn_app("notefinder-auth-register");

    let (status, resp) = post(&app, "/api/register", json!({ "nom": "A" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["message"], "Tous les champs sont requis");

    let body = json!({
        "nom": "Kouassi",
        "prenom": "Marc",
        "email": "marc@example.org",
        "password": "pw",
        "role": "Directeur",
    });
    let (status, resp) = post(&app, "/api/register", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["message"], "Invalid role");

    let body = json!({
        "nom": "Kouassi",
        "prenom": "Marc",
        "email": "marc@example.org",
        "password": "pw",
        "role": "Secrétaire",
    });
    let (status, resp) = post(&app, "/api/register", body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(resp["message"], "Compte créé avec succès");

    let (status, resp) = post(&app, "/api/register", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["message"], "Un compte avec cet email existe déjà");
}

#[tokio::test]
async fn profile_follows_the_session() {
    let app = spawn_app("notefinder-auth-profile");

    let (status, resp) = get(&app, "/api/user/profil").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp, json!({ "error": "Utilisateur non connecté" }));

    let token = admin_token(&app, "profil@example.org").await;
    let (status, resp) = send(&app, Method::GET, "/api/user/profil", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["user"]["email"], "profil@example.org");
    assert_eq!(resp["user"]["nom"], "Traore");
    assert!(resp["user"].get("mot_de_passe").is_none());

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/user/profil",
        None,
        Some("not.a.token"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let app = spawn_app("notefinder-auth-logout");
    let token = admin_token(&app, "bye@example.org").await;

    let (status, resp) = send(&app, Method::POST, "/api/logout", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["message"], "Déconnexion réussie");

    let (status, _) = send(&app, Method::GET, "/api/user/profil", None, Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Anonymous logout is still a success.
    let (status, _) = send(&app, Method::POST, "/api/logout", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn member_routes_require_a_session() {
    let app = spawn_app("notefinder-auth-members");

    let (status, resp) = get(&app, "/api/membres_administratifs").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp["error"], "Utilisateur non connecté");

    let token = admin_token(&app, "admin@example.org").await;
    let (status, rows) = send(
        &app,
        Method::GET,
        "/api/membres_administratifs",
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = rows.as_array().expect("array");
    assert_eq!(rows.len(), 1);
    assert!(rows[0].get("mot_de_passe").is_none());
}

#[tokio::test]
async fn members_crud_hashes_passwords_and_checks_roles() {
    let app = spawn_app("notefinder-auth-members-crud");
    let token = admin_token(&app, "admin@example.org").await;

    let (status, resp) = send(
        &app,
        Method::POST,
        "/api/membres_administratifs",
        Some(json!({ "nom": "Sy", "prenom": "Ami", "email": "ami@example.org", "role": "Admin" })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["message"], "Missing required field: mot_de_passe");

    let (status, resp) = send(
        &app,
        Method::POST,
        "/api/membres_administratifs",
        Some(json!({
            "nom": "Sy",
            "prenom": "Ami",
            "email": "ami@example.org",
            "mot_de_passe": "secret",
            "role": "Stagiaire",
        })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["message"], "Invalid role");

    let (status, resp) = send(
        &app,
        Method::POST,
        "/api/membres_administratifs",
        Some(json!({
            "nom": "Sy",
            "prenom": "Ami",
            "email": "ami@example.org",
            "mot_de_passe": "secret",
            "role": "Enseignant",
        })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(resp["message"], "Membre administratif created successfully");
    let id = resp["id"].as_i64().expect("id");

    // The stored hash accepts the plaintext.
    let (status, _) = post(
        &app,
        "/api/login",
        json!({ "email": "ami@example.org", "password": "secret" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, resp) = send(
        &app,
        Method::PUT,
        &format!("/api/membres_administratifs/{id}"),
        Some(json!({ "email": "admin@example.org" })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["message"], "Another member with this email already exists");

    let (status, resp) = send(
        &app,
        Method::DELETE,
        &format!("/api/membres_administratifs/{id}"),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["message"], "Membre administratif deleted successfully");
}

#[tokio::test]
async fn deleting_a_member_ends_their_sessions() {
    let app = spawn_app("notefinder-auth-member-delete");
    let admin = admin_token(&app, "admin@example.org").await;
    let other = admin_token(&app, "other@example.org").await;

    let (_, me) = send(&app, Method::GET, "/api/user/profil", None, Some(&other)).await;
    let other_id = me["user"]["id"].as_i64().expect("id");

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/membres_administratifs/{other_id}"),
        None,
        Some(&admin),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/api/user/profil", None, Some(&other)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

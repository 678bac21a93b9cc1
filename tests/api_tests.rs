// tests/api_tests.rs

mod common;

use common::{PASSWORD, in_one_day, mcq_paper, spawn_app, unique_name};
use papers_backend::models::user::Role;
use serde_json::{Value, json};

#[tokio::test]
async fn health_check_404() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_and_login_works() {
    let app = spawn_app().await;
    let username = unique_name("u");

    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({ "username": username, "password": PASSWORD }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let user: Value = response.json().await.unwrap();
    assert_eq!(user["role"], "student");
    assert!(user.get("password").is_none());

    let login: Value = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "username": username, "password": PASSWORD }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(login["type"], "Bearer");
    assert_eq!(login["role"], "student");
    assert!(login["token"].as_str().is_some());
}

#[tokio::test]
async fn register_fails_validation() {
    let app = spawn_app().await;

    // Username too short
    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({ "username": "yo", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Long enough but weak password
    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({ "username": unique_name("u"), "password": "password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "validation_error");
}

#[tokio::test]
async fn duplicate_username_conflicts_and_availability_reflects_it() {
    let app = spawn_app().await;
    let username = unique_name("dup");

    let check = |name: String| {
        let app = &app;
        async move {
            app.client
                .get(app.url("/api/auth/check-username"))
                .query(&[("username", name)])
                .send()
                .await
                .unwrap()
                .json::<Value>()
                .await
                .unwrap()
        }
    };

    assert_eq!(check(username.clone()).await["available"], true);

    for expected in [201, 409] {
        let response = app
            .client
            .post(app.url("/api/auth/register"))
            .json(&json!({ "username": username, "password": PASSWORD }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), expected);
    }

    assert_eq!(check(username).await["available"], false);
    assert_eq!(check("9bad name".to_string()).await["valid"], false);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = spawn_app().await;
    let username = unique_name("u");
    app.client
        .post(app.url("/api/auth/register"))
        .json(&json!({ "username": username, "password": PASSWORD }))
        .send()
        .await
        .unwrap();

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "username": username, "password": "Wrong-pass-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn papers_require_token() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/api/papers")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = app.get("not-a-jwt", "/api/papers").await;
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn only_admin_creates_teachers() {
    let app = spawn_app().await;
    let (_, admin) = app.user_with_role(Role::Admin).await;
    let (_, teacher) = app.user_with_role(Role::Teacher).await;
    let body = json!({ "username": unique_name("t"), "password": PASSWORD, "role": "teacher" });

    let response = app
        .client
        .post(app.url("/api/admin/users"))
        .bearer_auth(&teacher)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = app
        .client
        .post(app.url("/api/admin/users"))
        .bearer_auth(&admin)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let user: Value = response.json().await.unwrap();
    assert_eq!(user["role"], "teacher");
}

#[tokio::test]
async fn student_cannot_create_paper() {
    let app = spawn_app().await;
    let (_, student) = app.user_with_role(Role::Student).await;

    let response = app
        .create_paper(&student, &mcq_paper("Algebra", &[1, 2], in_one_day()))
        .await;
    assert_eq!(response.status().as_u16(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "authorization_error");
}

#[tokio::test]
async fn paper_projection_hides_answers_from_students() {
    let app = spawn_app().await;
    let (_, teacher) = app.user_with_role(Role::Teacher).await;
    let (_, student) = app.user_with_role(Role::Student).await;

    let created = app
        .create_paper(&teacher, &mcq_paper("Algebra", &[1, 3, 2], in_one_day()))
        .await;
    assert_eq!(created.status().as_u16(), 201);
    let created: Value = created.json().await.unwrap();
    let paper_id = created["id"].as_i64().unwrap();
    assert_eq!(created["questions"][1]["options"][2]["is_correct"], true);

    let student_view: Value = app
        .get(&student, &format!("/api/papers/{}", paper_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(student_view["review_mode"], false);
    assert_eq!(student_view["paper_type"], "MCQ");
    let options = student_view["questions"][0]["options"].as_array().unwrap();
    assert_eq!(options.len(), 4);
    assert!(options.iter().all(|o| o.get("is_correct").is_none()));
    assert!(student_view["questions"][0].get("explanation").is_none());

    let teacher_view: Value = app
        .get(&teacher, &format!("/api/papers/{}", paper_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(teacher_view["review_mode"], true);
    assert_eq!(teacher_view["questions"][0]["explanation"], "Worked solution");
}

#[tokio::test]
async fn invalid_answer_key_is_rejected() {
    let app = spawn_app().await;
    let (_, teacher) = app.user_with_role(Role::Teacher).await;

    let mut body = mcq_paper("Broken", &[1], in_one_day());
    body["questions"][0]["options"][1]["is_correct"] = json!(true);

    let response = app.create_paper(&teacher, &body).await;
    assert_eq!(response.status().as_u16(), 400);

    let mut body = mcq_paper("Too few options", &[1], in_one_day());
    body["questions"][0]["options"] = json!([{ "option_text": "Only", "is_correct": true }]);

    let response = app.create_paper(&teacher, &body).await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn archived_paper_disappears_for_students() {
    let app = spawn_app().await;
    let (_, teacher) = app.user_with_role(Role::Teacher).await;
    let (_, student) = app.user_with_role(Role::Student).await;

    let created: Value = app
        .create_paper(&teacher, &mcq_paper("Old paper", &[1], in_one_day()))
        .await
        .json()
        .await
        .unwrap();
    let paper_id = created["id"].as_i64().unwrap();

    let listed: Vec<Value> = app.get(&student, "/api/papers").await.json().await.unwrap();
    assert_eq!(listed.len(), 1);

    let response = app
        .client
        .delete(app.url(&format!("/api/papers/{}", paper_id)))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let listed: Vec<Value> = app.get(&student, "/api/papers").await.json().await.unwrap();
    assert!(listed.is_empty());

    let response = app.get(&student, &format!("/api/papers/{}", paper_id)).await;
    assert_eq!(response.status().as_u16(), 404);

    // Staff still see it, flagged as archived
    let teacher_view: Value = app
        .get(&teacher, &format!("/api/papers/{}", paper_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(teacher_view["archived"], true);
}

#[tokio::test]
async fn questions_locked_after_first_submission() {
    let app = spawn_app().await;
    let (_, teacher) = app.user_with_role(Role::Teacher).await;
    let (_, student) = app.user_with_role(Role::Student).await;

    let created: Value = app
        .create_paper(&teacher, &mcq_paper("Locked", &[1, 2], in_one_day()))
        .await
        .json()
        .await
        .unwrap();
    let paper_id = created["id"].as_i64().unwrap();

    let response = app
        .submit(&student, paper_id, &json!([{ "question_id": 1, "selected_option_id": 1 }]))
        .await;
    assert_eq!(response.status().as_u16(), 201);

    let replacement = mcq_paper("Locked", &[3], in_one_day());
    let response = app
        .client
        .put(app.url(&format!("/api/papers/{}", paper_id)))
        .bearer_auth(&teacher)
        .json(&json!({ "questions": replacement["questions"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let response = app
        .client
        .put(app.url(&format!("/api/papers/{}", paper_id)))
        .bearer_auth(&teacher)
        .json(&json!({ "title": "Renamed", "time_limit": 45 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["title"], "Renamed");
    assert_eq!(updated["time_limit"], 45);
    assert_eq!(updated["question_count"], 2);
}

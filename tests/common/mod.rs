// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use papers_backend::{
    config::{Config, StorageBackend},
    models::user::{NewUser, Role},
    routes,
    state::AppState,
    store::{MemoryStore, Store},
    utils::hash::hash_password,
};
use serde_json::{Value, json};

pub const PASSWORD: &str = "Passw0rd-123";

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
    pub upload_dir: std::path::PathBuf,
    pub client: reqwest::Client,
}

/// Spawns the app on a random port backed by a fresh in-memory store.
pub async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let upload_dir = std::env::temp_dir().join(format!("papers-test-{}", uuid::Uuid::new_v4()));

    let config = Config {
        database_url: String::new(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
        bind_addr: "127.0.0.1:0".to_string(),
        cors_origins: vec!["http://localhost:5173".to_string()],
        upload_dir: upload_dir.to_string_lossy().to_string(),
        max_upload_bytes: 1024 * 1024,
        storage: StorageBackend::Memory,
    };

    let state = AppState { store: store.clone(), config };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
        upload_dir,
        client: reqwest::Client::new(),
    }
}

pub fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().simple().to_string()[..8])
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Inserts a user directly and returns (user id, bearer token).
    pub async fn user_with_role(&self, role: Role) -> (i64, String) {
        let username = unique_name(role.as_str());
        let user = self
            .store
            .create_user(NewUser {
                username: username.clone(),
                password: hash_password(PASSWORD).unwrap(),
                role,
            })
            .await
            .unwrap();
        let token = self.login(&username, PASSWORD).await;
        (user.id, token)
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let resp: Value = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Login failed")
            .json()
            .await
            .expect("Failed to parse login json");
        resp["token"].as_str().expect("Token not found").to_string()
    }

    pub async fn create_paper(&self, token: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/papers"))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Create paper failed")
    }

    pub async fn submit(&self, token: &str, paper_id: i64, answers: &Value) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/papers/{}/submit", paper_id)))
            .bearer_auth(token)
            .json(&json!({ "answers": answers, "time_spent": 12 }))
            .send()
            .await
            .expect("Submit failed")
    }

    pub async fn upload(
        &self,
        token: &str,
        method: reqwest::Method,
        path: &str,
        file_name: &str,
        time_spent: Option<&str>,
    ) -> reqwest::Response {
        let mut form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(b"%PDF-1.4 upload".to_vec()).file_name(file_name.to_string()),
        );
        if let Some(minutes) = time_spent {
            form = form.text("time_spent", minutes.to_string());
        }
        self.client
            .request(method, self.url(path))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .expect("Upload failed")
    }

    /// Number of files currently in the upload directory.
    pub async fn stored_files(&self) -> usize {
        let mut count = 0;
        if let Ok(mut entries) = tokio::fs::read_dir(&self.upload_dir).await {
            while let Ok(Some(_)) = entries.next_entry().await {
                count += 1;
            }
        }
        count
    }

    pub async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Request failed")
    }
}

/// MCQ paper body where question `i` (1-based) has its correct answer at
/// option `correct[i - 1]` out of 4 options.
pub fn mcq_paper(title: &str, correct: &[i64], deadline: DateTime<Utc>) -> Value {
    let questions: Vec<Value> = correct
        .iter()
        .enumerate()
        .map(|(i, c)| {
            json!({
                "question_text": format!("Question {}", i + 1),
                "explanation": "Worked solution",
                "options": (1..=4)
                    .map(|o| json!({ "option_text": format!("Option {}", o), "is_correct": o == *c }))
                    .collect::<Vec<_>>(),
            })
        })
        .collect();

    json!({
        "title": title,
        "description": "Practice paper",
        "questions": questions,
        "deadline": deadline,
        "time_limit": 30,
        "paper_type": "MCQ",
    })
}

pub fn in_one_day() -> DateTime<Utc> {
    Utc::now() + Duration::days(1)
}

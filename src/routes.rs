// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, papers, results, submissions},
    services::uploads::UPLOAD_URL_PREFIX,
    state::AppState,
    utils::jwt::{auth_middleware, staff_middleware},
};

/// Room for multipart boundaries and the small text fields around a file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
}

/// Assembles the main application router.
///
/// * `/api/auth` is public.
/// * `/api/papers` requires a bearer token; staff-only paths are additionally
///   guarded by `staff_middleware`, and handlers check the `Session` role.
/// * `/api/admin` requires an admin token.
/// * Uploaded files are served from `/uploads`.
pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/check-username", get(auth::check_username));

    let admin_routes = Router::new()
        .route("/users", post(admin::create_user))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let staff_routes = Router::new()
        .route("/{id}/results", get(results::paper_results))
        .route(
            "/attempts/{attempt_id}/review",
            put(submissions::attach_review),
        )
        .layer(middleware::from_fn(staff_middleware));

    let paper_routes = Router::new()
        .route("/", get(papers::list_papers).post(papers::create_paper))
        .route("/results/my-results", get(results::my_results))
        .route("/attempts/{attempt_id}", get(results::get_attempt))
        .route(
            "/{id}",
            get(papers::get_paper)
                .put(papers::update_paper)
                .delete(papers::archive_paper),
        )
        .route("/{id}/submit", post(submissions::submit_paper))
        .route("/{id}/submit-file", post(submissions::submit_paper_file))
        .merge(staff_routes)
        // Auth runs before the staff check (layers wrap from the outside in)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/papers", paper_routes)
        .nest("/api/admin", admin_routes)
        .nest_service(UPLOAD_URL_PREFIX, ServeDir::new(&state.config.upload_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use tower::ServiceExt;

    use super::create_router;
    use crate::{
        config::{Config, StorageBackend},
        models::user::Role,
        state::AppState,
        store::MemoryStore,
        utils::jwt::sign_jwt,
    };

    const SECRET: &str = "router-test-secret";

    fn app() -> Router {
        let config = Config {
            database_url: String::new(),
            jwt_secret: SECRET.to_string(),
            jwt_expiration: 60,
            rust_log: "error".to_string(),
            admin_username: None,
            admin_password: None,
            bind_addr: "127.0.0.1:0".to_string(),
            cors_origins: vec!["http://localhost:5173".to_string()],
            upload_dir: std::env::temp_dir().to_string_lossy().to_string(),
            max_upload_bytes: 1024,
            storage: StorageBackend::Memory,
        };
        create_router(AppState { store: Arc::new(MemoryStore::new()), config })
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn error_kind(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        json["kind"].clone()
    }

    #[tokio::test]
    async fn papers_without_token_is_unauthorized() {
        let response = app().oneshot(get("/api/papers", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_kind(response).await, "authentication_error");

        let response = app().oneshot(get("/api/papers", Some("garbage"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_kind(response).await, "authentication_error");
    }

    #[tokio::test]
    async fn staff_routes_reject_students() {
        let token = sign_jwt(7, Role::Student, SECRET, 60).unwrap();
        let response = app()
            .oneshot(get("/api/papers/1/results", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(error_kind(response).await, "authorization_error");
    }

    #[tokio::test]
    async fn missing_paper_is_not_found_json() {
        let token = sign_jwt(1, Role::Teacher, SECRET, 60).unwrap();
        let response = app().oneshot(get("/api/papers/99", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(error_kind(response).await, "not_found");
    }
}

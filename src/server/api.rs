use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::{info, warn};

use super::auth::{self, CurrentUser};
use super::db::DbHandle;
use super::models::PostList;
use super::rate_limit::{Decision, RateLimiter};
use crate::errors::{PipelineError, TranscriptError};
use crate::pipeline::BlogGenerator;
use crate::validate;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub db: DbHandle,
    pub generator: Arc<dyn BlogGenerator>,
    pub limiter: RateLimiter,
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub youtube_url: String,
    pub language: Option<String>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(serde::Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: super::models::User,
}

#[derive(serde::Serialize)]
pub struct GenerateResponse {
    pub post: super::models::BlogPost,
    pub run_id: i64,
    pub generation_ms: u64,
}

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Conflict(String),
    RateLimited(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl ApiError {
    /// Map a pipeline failure to the client-facing status. Transcript
    /// problems are the caller's video, writer problems are ours.
    fn from_pipeline(err: &PipelineError) -> Self {
        match err {
            PipelineError::Transcript(TranscriptError::NotFound { .. }) => ApiError::BadRequest(
                "No transcript is available for this video. Check that captions are enabled."
                    .to_string(),
            ),
            PipelineError::ContentTooShort { .. } => ApiError::Internal(
                "Failed to generate blog content. Please try a different video.".to_string(),
            ),
            other => ApiError::Internal(format!("Blog generation failed: {}", other)),
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/generate", post(generate_blog))
        .route("/api/posts", get(list_posts))
        .route("/api/posts/{id}", get(get_post).delete(delete_post))
        .route("/api/posts/{id}/pdf", get(download_post_pdf))
        .route("/api/runs", get(list_runs))
        .route("/health", get(health_check))
}

// ── Helpers ───────────────────────────────────────────────────────────

fn check_rate_limit(state: &SharedState, key: String) -> Result<(), ApiError> {
    match state.limiter.check(&key) {
        Decision::Allowed => Ok(()),
        Decision::Denied { window } => {
            let (minute_left, hour_left) = state.limiter.remaining(&key);
            warn!(key = %key, window, minute_left, hour_left, "rate limit exceeded");
            Err(ApiError::RateLimited(format!(
                "Rate limit exceeded (per {}). Try again later.",
                window
            )))
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .call(|db| db.ping())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok("ok")
}

async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_lowercase();

    check_rate_limit(&state, format!("auth:{}", email))?;

    if username.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest("All fields are required".to_string()));
    }
    if !validate::is_valid_email(&email) {
        return Err(ApiError::BadRequest("Invalid email format".to_string()));
    }
    if !validate::is_valid_password(&req.password) {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters long".to_string(),
        ));
    }
    if !validate::is_valid_username(&username) {
        return Err(ApiError::BadRequest(
            "Username must be at least 3 characters long".to_string(),
        ));
    }
    if let Some(confirm) = &req.confirm_password
        && confirm != &req.password
    {
        return Err(ApiError::BadRequest("Passwords do not match".to_string()));
    }

    let password_hash =
        auth::hash_password(&req.password).map_err(|e| ApiError::Internal(e.to_string()))?;

    let created = state
        .db
        .call(move |db| db.create_user(&username, &email, &password_hash))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    match created {
        Some(user) => {
            info!(user_id = user.id, username = %user.username, status = "created", "user registered");
            Ok((StatusCode::CREATED, Json(user)))
        }
        None => {
            info!(status = "failed_exists", "user registration rejected");
            Err(ApiError::Conflict(
                "User with this email or username already exists".to_string(),
            ))
        }
    }
}

async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();
    check_rate_limit(&state, format!("auth:{}", email))?;

    let lookup_email = email.clone();
    let record = state
        .db
        .call(move |db| db.get_user_by_email(&lookup_email))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let Some(record) = record else {
        warn!(status = "failed", "login attempt for unknown email");
        return Err(ApiError::Unauthorized("Invalid email or password".to_string()));
    };

    let password_ok = auth::verify_password(&req.password, &record.password_hash)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if !password_ok || !record.user.is_active {
        warn!(user_id = record.user.id, status = "failed", "login rejected");
        return Err(ApiError::Unauthorized("Invalid email or password".to_string()));
    }

    let token = auth::issue_token(record.user.id, &state.jwt_secret, state.token_ttl_secs)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!(user_id = record.user.id, status = "success", "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: record.user,
    }))
}

async fn me(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    Json(user)
}

async fn generate_blog(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<GenerateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let started = std::time::Instant::now();
    let youtube_url = req.youtube_url.trim().to_string();
    let language = req.language.unwrap_or_else(|| "en".to_string());

    check_rate_limit(&state, format!("generate:{}", user.id))?;

    if youtube_url.is_empty() {
        return Err(ApiError::BadRequest("YouTube URL is required".to_string()));
    }
    if !validate::validate_youtube_url(&youtube_url) {
        return Err(ApiError::BadRequest(
            "Please enter a valid YouTube URL".to_string(),
        ));
    }
    let video_id = validate::extract_video_id(&youtube_url)
        .ok_or_else(|| ApiError::BadRequest("Invalid YouTube URL".to_string()))?;

    info!(user_id = user.id, video_id = %video_id, "blog generation started");

    let run_id = {
        let video_id = video_id.clone();
        let language = language.clone();
        let user_id = user.id;
        state
            .db
            .call(move |db| db.create_run(user_id, &video_id, &language))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?
    };

    let article = match state
        .generator
        .generate(&youtube_url, &video_id, &language)
        .await
    {
        Ok(article) => article,
        Err(e) => {
            let message = e.to_string();
            let db_message = message.clone();
            if let Err(db_err) = state
                .db
                .call(move |db| db.fail_run(run_id, &db_message))
                .await
            {
                warn!(run_id, error = %db_err, "failed to record run failure");
            }
            warn!(user_id = user.id, run_id, error = %message, "blog generation failed");
            return Err(ApiError::from_pipeline(&e));
        }
    };

    let post = {
        let article = article.clone();
        let youtube_url = youtube_url.clone();
        let user_id = user.id;
        state
            .db
            .call(move |db| {
                let post = db.create_post(
                    user_id,
                    &youtube_url,
                    &article.video_id,
                    &article.title,
                    &article.content,
                    article.word_count as i64,
                )?;
                db.complete_run(
                    run_id,
                    post.id,
                    article.transcript_chars as i64,
                    article.content.chars().count() as i64,
                )?;
                Ok(post)
            })
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?
    };

    let generation_ms = started.elapsed().as_millis() as u64;
    info!(
        user_id = user.id,
        run_id,
        post_id = post.id,
        words = post.word_count,
        generation_ms,
        "blog generation completed"
    );

    Ok(Json(GenerateResponse {
        post,
        run_id,
        generation_ms,
    }))
}

async fn list_posts(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 100);
    let offset = query.offset.unwrap_or(0).max(0);
    let user_id = user.id;

    let list = state
        .db
        .call(move |db| {
            let posts = db.list_posts(user_id, limit, offset)?;
            let total = db.count_posts(user_id)?;
            Ok(PostList { posts, total })
        })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(list))
}

async fn get_post(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user.id;
    let post = state
        .db
        .call(move |db| db.get_post(id, user_id))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;
    Ok(Json(post))
}

async fn delete_post(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user.id;
    let deleted = state
        .db
        .call(move |db| db.delete_post(id, user_id))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    if deleted {
        info!(user_id, post_id = id, "post deleted");
        Ok(Json(serde_json::json!({"deleted": true})))
    } else {
        Err(ApiError::NotFound("Post not found".to_string()))
    }
}

async fn download_post_pdf(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let user_id = user.id;
    let post = state
        .db
        .call(move |db| db.get_post(id, user_id))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    let filename = format!("{}_blog.pdf", validate::sanitize_filename(&post.title));
    let content = post.content;

    // PDF layout is CPU work; keep it off the async workers.
    let bytes = tokio::task::spawn_blocking(move || crate::pdf::render(&content))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| ApiError::Internal(format!("PDF generation failed: {}", e)))?;

    info!(user_id, post_id = id, bytes = bytes.len(), "pdf exported");

    Ok(Response::builder()
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(axum::body::Body::from(bytes))
        .map_err(|e| ApiError::Internal(e.to_string()))?)
}

async fn list_runs(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 100);
    let user_id = user.id;
    let runs = state
        .db
        .call(move |db| db.list_runs(user_id, limit))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(runs))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::RateLimitConfig;
    use crate::errors::PipelineError;
    use crate::pipeline::GeneratedArticle;
    use crate::server::db::BlogDb;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    /// Test double standing in for the real two-stage pipeline.
    pub(crate) struct StubGenerator {
        pub fail: bool,
    }

    #[async_trait::async_trait]
    impl BlogGenerator for StubGenerator {
        async fn generate(
            &self,
            _youtube_url: &str,
            video_id: &str,
            _language: &str,
        ) -> Result<GeneratedArticle, PipelineError> {
            if self.fail {
                return Err(PipelineError::Transcript(TranscriptError::NotFound {
                    video_id: video_id.to_string(),
                }));
            }
            let content = format!(
                "# Stub Article\n\n{}",
                "A reasonably long paragraph of generated text. ".repeat(10)
            );
            Ok(GeneratedArticle {
                title: "Stub Article".to_string(),
                word_count: crate::pipeline::markdown::word_count(&content),
                transcript_chars: 2000,
                video_id: video_id.to_string(),
                content,
                transcript_ms: 5,
                writer_ms: 7,
            })
        }
    }

    pub(crate) fn test_state(fail: bool) -> SharedState {
        Arc::new(AppState {
            db: DbHandle::new(BlogDb::new_in_memory().unwrap()),
            generator: Arc::new(StubGenerator { fail }),
            limiter: RateLimiter::new(RateLimitConfig::default()),
            jwt_secret: "test-secret".to_string(),
            token_ttl_secs: 3600,
        })
    }

    fn router(state: SharedState) -> Router {
        api_router().with_state(state)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn register_and_login(app: &Router) -> String {
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                serde_json::json!({
                    "username": "sam",
                    "email": "sam@example.com",
                    "password": "hunter2hunter2"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                serde_json::json!({"email": "sam@example.com", "password": "hunter2hunter2"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        body_json(resp).await["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = router(test_state(false));
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn register_validates_input() {
        let app = router(test_state(false));

        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                serde_json::json!({"username": "sam", "email": "bad", "password": "hunter2hunter2"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                serde_json::json!({"username": "sam", "email": "sam@example.com", "password": "short"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                serde_json::json!({
                    "username": "sam",
                    "email": "sam@example.com",
                    "password": "hunter2hunter2",
                    "confirm_password": "different-password"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let app = router(test_state(false));
        let body = serde_json::json!({
            "username": "sam",
            "email": "sam@example.com",
            "password": "hunter2hunter2"
        });
        let resp = app
            .clone()
            .oneshot(json_request("POST", "/api/auth/register", body.clone()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = app
            .oneshot(json_request("POST", "/api/auth/register", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let app = router(test_state(false));
        register_and_login(&app).await;

        let resp = app
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                serde_json::json!({"email": "sam@example.com", "password": "wrong-password"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_requires_bearer_token() {
        let app = router(test_state(false));
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/auth/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let token = register_and_login(&app).await;
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/auth/me")
                    .header("authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["username"], "sam");
    }

    #[tokio::test]
    async fn generate_persists_post_and_run() {
        let app = router(test_state(false));
        let token = register_and_login(&app).await;

        let mut req = json_request(
            "POST",
            "/api/generate",
            serde_json::json!({"youtube_url": "https://www.youtube.com/watch?v=FdeioVndUhs"}),
        );
        req.headers_mut().insert(
            "authorization",
            format!("Bearer {}", token).parse().unwrap(),
        );
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["post"]["title"], "Stub Article");
        assert_eq!(body["post"]["video_id"], "FdeioVndUhs");

        // The run history shows a completed run linked to the post.
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/runs")
                    .header("authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let runs = body_json(resp).await;
        assert_eq!(runs[0]["status"], "completed");
        assert_eq!(runs[0]["post_id"], body["post"]["id"]);
    }

    #[tokio::test]
    async fn generate_rejects_invalid_urls() {
        let app = router(test_state(false));
        let token = register_and_login(&app).await;

        for url in ["", "https://vimeo.com/123", "https://www.youtube.com/watch?v=nope"] {
            let mut req = json_request(
                "POST",
                "/api/generate",
                serde_json::json!({"youtube_url": url}),
            );
            req.headers_mut().insert(
                "authorization",
                format!("Bearer {}", token).parse().unwrap(),
            );
            let resp = app.clone().oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "url: {url}");
        }
    }

    #[tokio::test]
    async fn generate_failure_marks_run_failed() {
        let app = router(test_state(true));
        let token = register_and_login(&app).await;

        let mut req = json_request(
            "POST",
            "/api/generate",
            serde_json::json!({"youtube_url": "https://youtu.be/FdeioVndUhs"}),
        );
        req.headers_mut().insert(
            "authorization",
            format!("Bearer {}", token).parse().unwrap(),
        );
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/runs")
                    .header("authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let runs = body_json(resp).await;
        assert_eq!(runs[0]["status"], "failed");
        assert!(runs[0]["error"].as_str().unwrap().contains("FdeioVndUhs"));
    }

    #[tokio::test]
    async fn posts_are_invisible_across_users() {
        let app = router(test_state(false));
        let token = register_and_login(&app).await;

        let mut req = json_request(
            "POST",
            "/api/generate",
            serde_json::json!({"youtube_url": "https://youtu.be/FdeioVndUhs"}),
        );
        req.headers_mut().insert(
            "authorization",
            format!("Bearer {}", token).parse().unwrap(),
        );
        let resp = app.clone().oneshot(req).await.unwrap();
        let post_id = body_json(resp).await["post"]["id"].as_i64().unwrap();

        // Second user cannot read or delete the first user's post.
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                serde_json::json!({
                    "username": "eve",
                    "email": "eve@example.com",
                    "password": "hunter2hunter2"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                serde_json::json!({"email": "eve@example.com", "password": "hunter2hunter2"}),
            ))
            .await
            .unwrap();
        let eve_token = body_json(resp).await["token"].as_str().unwrap().to_string();

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/posts/{}", post_id))
                    .header("authorization", format!("Bearer {}", eve_token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/posts/{}", post_id))
                    .header("authorization", format!("Bearer {}", eve_token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn pdf_download_sets_attachment_headers() {
        let app = router(test_state(false));
        let token = register_and_login(&app).await;

        let mut req = json_request(
            "POST",
            "/api/generate",
            serde_json::json!({"youtube_url": "https://youtu.be/FdeioVndUhs"}),
        );
        req.headers_mut().insert(
            "authorization",
            format!("Bearer {}", token).parse().unwrap(),
        );
        let resp = app.clone().oneshot(req).await.unwrap();
        let post_id = body_json(resp).await["post"]["id"].as_i64().unwrap();

        let resp = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/posts/{}/pdf", post_id))
                    .header("authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "application/pdf"
        );
        let disposition = resp
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("Stub-Article_blog.pdf"));

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn rate_limit_returns_429() {
        let state = Arc::new(AppState {
            db: DbHandle::new(BlogDb::new_in_memory().unwrap()),
            generator: Arc::new(StubGenerator { fail: false }),
            limiter: RateLimiter::new(RateLimitConfig {
                requests_per_minute: 2,
                requests_per_hour: 100,
            }),
            jwt_secret: "test-secret".to_string(),
            token_ttl_secs: 3600,
        });
        let app = router(state);

        // Register + login consume the two auth hits for this email.
        let _token = register_and_login(&app).await;

        let resp = app
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                serde_json::json!({"email": "sam@example.com", "password": "hunter2hunter2"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}

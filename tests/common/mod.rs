use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use course_modes_api::auth::{generate_jwt, Claims};
use course_modes_api::database::memory::MemoryCourseModeStore;
use course_modes_api::database::models::CourseMode;
use course_modes_api::{app, AppState};

pub const COURSE_ID: &str = "course-v1:edX+DemoX+Demo_Course";

static ENV: OnceLock<()> = OnceLock::new();

/// The config singleton reads JWT_SECRET on first access; pin it before
/// anything touches the config.
fn init_env() {
    ENV.get_or_init(|| {
        std::env::set_var("JWT_SECRET", "course-modes-test-secret");
    });
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryCourseModeStore>,
}

/// Router over a fresh in-memory store, one per test
pub fn test_app() -> TestApp {
    init_env();
    let store = Arc::new(MemoryCourseModeStore::new());
    let router = app(AppState::new(store.clone()));
    TestApp { router, store }
}

pub fn staff_token() -> String {
    init_env();
    generate_jwt(Claims::new("global-staff".to_string(), true)).expect("staff token")
}

pub fn student_token() -> String {
    init_env();
    generate_jwt(Claims::new("other-student".to_string(), false)).expect("student token")
}

pub fn mode(slug: &str, display_name: &str, min_price: i32, currency: &str) -> CourseMode {
    CourseMode {
        course_id: COURSE_ID.to_string(),
        mode_slug: slug.to_string(),
        mode_display_name: display_name.to_string(),
        min_price,
        currency: currency.to_string(),
        expiration_datetime: None,
        expiration_datetime_is_explicit: false,
        description: None,
        sku: None,
        bulk_sku: None,
    }
}

pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    // PATCH carries merge-patch semantics; axum's Json extractor accepts
    // any +json media type
    let content_type = if method == "PATCH" {
        "application/merge-patch+json"
    } else {
        "application/json"
    };

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    router.clone().oneshot(request).await.expect("response")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(
        response.status(),
        expected,
        "expected {}, got {}",
        expected,
        response.status()
    );
}

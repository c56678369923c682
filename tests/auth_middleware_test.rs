use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware::from_fn,
    routing::get,
    Extension, Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use teacher_portal_backend::middleware::auth::{self, Claims};
use tower::ServiceExt;
use uuid::Uuid;

const TEST_SECRET: &str = "test-secret";

fn init_test_config() {
    std::env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    std::env::set_var("DATABASE_URL", "postgres://localhost/unused");
    std::env::set_var("JWT_SECRET", TEST_SECRET);
    // Another test may have won the race; the values are identical.
    let _ = teacher_portal_backend::config::init_config();
}

fn mint_token(role: &str) -> String {
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        role: Some(role.to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

async fn echo_subject(Extension(claims): Extension<Claims>) -> String {
    claims.sub
}

fn admin_router() -> Router {
    Router::new()
        .route("/admin-only", get(echo_subject))
        .layer(from_fn(auth::require_admin))
}

fn request(path: &str, token: Option<&str>) -> Request<Body> {
    let builder = Request::builder().uri(path);
    let builder = match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    };
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    init_test_config();
    let response = admin_router()
        .oneshot(request("/admin-only", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    init_test_config();
    let response = admin_router()
        .oneshot(request("/admin-only", Some("not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_role_is_forbidden() {
    init_test_config();
    let token = mint_token("employer");
    let response = admin_router()
        .oneshot(request("/admin-only", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn matching_role_reaches_the_handler() {
    init_test_config();
    let token = mint_token("admin");
    let response = admin_router()
        .oneshot(request("/admin-only", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    init_test_config();
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        exp: (chrono::Utc::now().timestamp() - 3600) as usize,
        role: Some("admin".to_string()),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();
    let response = admin_router()
        .oneshot(request("/admin-only", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn any_role_passes_the_shared_gate() {
    init_test_config();
    let router = Router::new()
        .route("/mine", get(echo_subject))
        .layer(from_fn(auth::require_auth));
    let token = mint_token("college");
    let response = router
        .oneshot(request("/mine", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// Identity resolved from the bearer token: `sub` is the user id, `role`
/// one of employer/college/admin. Token issuance is external.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

impl Claims {
    pub fn user_id(&self) -> crate::error::Result<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| crate::error::Error::Unauthorized("Invalid subject claim".into()))
    }
}

fn unauthorized(code: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": code }))).into_response()
}

fn decode_bearer(req: &Request) -> Result<Claims, Response> {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return Err(unauthorized("missing_authorization"));
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(unauthorized("bad_authorization"));
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(unauthorized("unsupported_scheme"));
    };

    let config = crate::config::get_config();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| unauthorized("invalid_token"))
}

async fn gate(mut req: Request, next: Next, allowed: &[&str]) -> Response {
    let claims = match decode_bearer(&req) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };
    let role = claims.role.clone().unwrap_or_default();
    if !allowed.is_empty() && !allowed.iter().any(|r| r.eq_ignore_ascii_case(&role)) {
        return (StatusCode::FORBIDDEN, Json(json!({"error":"forbidden"}))).into_response();
    }
    req.extensions_mut().insert(claims);
    next.run(req).await
}

pub async fn require_employer(req: Request, next: Next) -> Response {
    gate(req, next, &["employer"]).await
}

pub async fn require_college(req: Request, next: Next) -> Response {
    gate(req, next, &["college"]).await
}

pub async fn require_admin(req: Request, next: Next) -> Response {
    gate(req, next, &["admin"]).await
}

/// Any authenticated role; used by the notifications routes.
pub async fn require_auth(req: Request, next: Next) -> Response {
    gate(req, next, &[]).await
}

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// Identity carried by an already-issued access token. Issuance and
/// signature verification happen at the auth gateway; this middleware
/// only reads the claims it forwarded.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl AuthenticatedUser {
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.id).ok()
    }

    pub fn is_admin(&self) -> bool {
        self.role.as_deref().map_or(false, |r| r.trim() == "admin")
    }
}

#[derive(Deserialize)]
struct JwtClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

/// Token from the `access_token` cookie, or a bearer Authorization
/// header as the API clients send it.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get(header::COOKIE)
        .and_then(|hv| hv.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split("; ")
                .find_map(|c| c.strip_prefix("access_token="))
                .map(str::to_string)
        });
    if from_cookie.is_some() {
        return from_cookie;
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|hv| hv.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn decode_claims(token: &str) -> Option<AuthenticatedUser> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    let payload_bytes = general_purpose::URL_SAFE_NO_PAD.decode(parts[1]).ok()?;
    let claims: JwtClaims = serde_json::from_slice(&payload_bytes).ok()?;
    Some(AuthenticatedUser {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
    })
}

/// Identity for routes where authentication is optional.
pub fn identity_from_headers(headers: &HeaderMap) -> Option<AuthenticatedUser> {
    extract_token(headers).and_then(|t| decode_claims(&t))
}

pub async fn require_auth(mut request: Request, next: Next) -> Response {
    match identity_from_headers(request.headers()) {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "not authenticated" })),
        )
            .into_response(),
    }
}

/// Guard for admin handlers that share a path with public methods and
/// therefore sit outside the authenticated router.
pub fn require_admin_identity(headers: &HeaderMap) -> Result<AuthenticatedUser, Response> {
    match identity_from_headers(headers) {
        Some(user) if user.is_admin() => Ok(user),
        Some(_) => Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "message": "not authorized" })),
        )
            .into_response()),
        None => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "not authenticated" })),
        )
            .into_response()),
    }
}

/// Must run inside `require_auth`; rejects non-admin identities.
pub async fn require_admin(request: Request, next: Next) -> Response {
    let is_admin = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(AuthenticatedUser::is_admin);
    match is_admin {
        Some(true) => next.run(request).await,
        Some(false) => (
            StatusCode::FORBIDDEN,
            Json(json!({ "message": "not authorized" })),
        )
            .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "not authenticated" })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn token_for(payload: &str) -> String {
        let body = general_purpose::URL_SAFE_NO_PAD.encode(payload);
        format!("header.{body}.signature")
    }

    #[test]
    fn decodes_claims_from_token_payload() {
        let token = token_for(r#"{"sub":"u1","email":"ana@example.com","role":"admin"}"#);
        let user = decode_claims(&token).unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.email.as_deref(), Some("ana@example.com"));
        assert!(user.is_admin());
    }

    #[test]
    fn missing_optional_claims_are_tolerated() {
        let token = token_for(r#"{"sub":"u2"}"#);
        let user = decode_claims(&token).unwrap();
        assert_eq!(user.email, None);
        assert!(!user.is_admin());
    }

    #[test]
    fn malformed_tokens_yield_no_identity() {
        assert!(decode_claims("not-a-jwt").is_none());
        assert!(decode_claims("a.b").is_none());
        assert!(decode_claims("a.!!!.c").is_none());
    }

    #[test]
    fn token_read_from_cookie_or_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; access_token=tok123"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("tok123"));

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer tok456"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("tok456"));

        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}

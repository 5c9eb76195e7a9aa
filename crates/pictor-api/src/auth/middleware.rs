use crate::auth::models::{JwtClaims, UserContext, UNAUTHENTICATED};
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use pictor_core::AppError;
use std::sync::Arc;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "_token_";

#[derive(Clone)]
pub struct AuthState {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthState {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<UserContext, jsonwebtoken::errors::Error> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(UserContext {
            user_id: data.claims.sub,
        })
    }
}

/// Session token from the `_token_` cookie, falling back to a bearer header.
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
    })
}

fn unauthenticated() -> Response {
    HttpAppError(AppError::Unauthorized(UNAUTHENTICATED.to_string())).into_response()
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_token(request.headers()) else {
        tracing::debug!("Request without session token");
        return unauthenticated();
    };

    match auth_state.verify(token) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "Session token rejected");
            unauthenticated()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    const SECRET: &str = "unit-test-secret-that-is-long-enough!!";

    fn token(secret: &str, user_id: Uuid, exp: i64) -> String {
        let claims = JwtClaims {
            sub: user_id,
            exp,
            iat: None,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_one_hour() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; _token_=abc.def.ghi"),
        );
        assert_eq!(extract_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_cookie_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("_token_=cookie"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer header"));
        assert_eq!(extract_token(&headers), Some("cookie"));
    }

    #[test]
    fn test_token_from_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(extract_token(&headers), Some("xyz"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(extract_token(&headers), None);
    }

    #[test]
    fn test_verify_valid_token() {
        let user_id = Uuid::new_v4();
        let state = AuthState::new(SECRET);
        let user = state.verify(&token(SECRET, user_id, in_one_hour())).unwrap();
        assert_eq!(user.user_id, user_id);
    }

    #[test]
    fn test_verify_rejects_wrong_secret_and_expired() {
        let state = AuthState::new(SECRET);
        let user_id = Uuid::new_v4();
        assert!(state
            .verify(&token("another-secret-another-secret-!!", user_id, in_one_hour()))
            .is_err());
        assert!(state
            .verify(&token(SECRET, user_id, chrono::Utc::now().timestamp() - 3600))
            .is_err());
    }
}

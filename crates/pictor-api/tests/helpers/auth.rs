use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use pictor_api::auth::JwtClaims;
use uuid::Uuid;

/// Secret shared by the test config and the tokens minted here.
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters-long";

pub struct TestUser {
    pub user_id: Uuid,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    pub fn cookie(&self) -> String {
        format!("_token_={}", self.token)
    }
}

pub fn mint_token(secret: &str, user_id: Uuid, ttl_secs: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = JwtClaims {
        sub: user_id,
        exp: now + ttl_secs,
        iat: Some(now),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to sign test token")
}

/// A fresh user with a valid one-hour session.
pub fn test_user() -> TestUser {
    let user_id = Uuid::new_v4();
    TestUser {
        user_id,
        token: mint_token(TEST_JWT_SECRET, user_id, 3600),
    }
}

use axum_extra::headers::authorization::Credentials;
use jsonwebtoken::{DecodingKey, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

use super::auth::UserId;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub exp: i64,
    pub user_id: UserId,
}

/// `Authorization: Token <jwt>` credential.
#[derive(Debug)]
pub struct AuthToken(pub String);

impl Credentials for AuthToken {
    const SCHEME: &'static str = "Token";

    fn decode(value: &axum::http::HeaderValue) -> Option<Self> {
        let mut it = value.to_str().ok()?.split_whitespace();
        let scheme = it.next()?;
        let token = it.next()?;

        if scheme != Self::SCHEME || it.next().is_some() {
            None?
        }

        Some(Self(token.to_string()))
    }

    fn encode(&self) -> axum::http::HeaderValue {
        unreachable!()
    }
}

pub fn generate_jwt(user_id: UserId, key: &EncodingKey) -> AppResult<String> {
    let exp = (chrono::Utc::now() + chrono::Duration::days(30)).timestamp();
    let claims = Claims { exp, user_id };
    let token = jsonwebtoken::encode(&Header::default(), &claims, key)?;
    Ok(token)
}

pub fn verify_token(token: &str, key: &DecodingKey) -> AppResult<UserId> {
    let claims = verify_jwt(token, key)?;
    Ok(claims.user_id)
}

pub fn verify_jwt(token: &str, key: &DecodingKey) -> AppResult<Claims> {
    let claims =
        jsonwebtoken::decode::<Claims>(token, key, &jsonwebtoken::Validation::default())?.claims;
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn decodes_token_scheme() {
        let value = HeaderValue::from_static("Token abc.def.ghi");
        let token = AuthToken::decode(&value).unwrap();
        assert_eq!(token.0, "abc.def.ghi");
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        for raw in ["Bearer abc", "Token", "Token a b", "abc"] {
            let value = HeaderValue::from_static(raw);
            assert!(AuthToken::decode(&value).is_none(), "accepted {raw:?}");
        }
    }

    #[test]
    fn jwt_round_trip() {
        let encoding = EncodingKey::from_secret(b"test-secret");
        let decoding = DecodingKey::from_secret(b"test-secret");

        let token = generate_jwt(42, &encoding).unwrap();
        assert_eq!(verify_token(&token, &decoding).unwrap(), 42);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let encoding = EncodingKey::from_secret(b"one");
        let decoding = DecodingKey::from_secret(b"two");

        let token = generate_jwt(42, &encoding).unwrap();
        assert!(verify_token(&token, &decoding).is_err());
    }
}

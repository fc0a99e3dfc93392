use jsonwebtoken::EncodingKey;
use serde::Serialize;
use sqlx::FromRow;

use crate::{
    error::{AppError, AppResult},
    utils::jwt,
};

pub type UserId = i32;

pub const ROLE_ADMIN: &str = "admin";

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserAuth {
    pub id: UserId,
    #[serde(skip)]
    pub hash: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub role: String,
    #[sqlx(default)]
    pub token: Option<String>,
}

impl UserAuth {
    pub fn generate_jwt(&self, key: &EncodingKey) -> AppResult<String> {
        jwt::generate_jwt(self.id, key)
    }

    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Mutations on a question or answer are allowed to its author and to admins.
pub fn ensure_owner(user: &UserAuth, owner_id: UserId) -> AppResult<()> {
    if user.id != owner_id && !user.is_admin() {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

pub fn ensure_admin(user: &UserAuth) -> AppResult<()> {
    if !user.is_admin() {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: UserId, role: &str) -> UserAuth {
        UserAuth {
            id,
            hash: String::new(),
            name: "sam".into(),
            email: "sam@example.com".into(),
            image: None,
            role: role.into(),
            token: None,
        }
    }

    #[test]
    fn author_passes_ownership_check() {
        assert!(ensure_owner(&user(1, "user"), 1).is_ok());
    }

    #[test]
    fn stranger_fails_ownership_check() {
        assert!(matches!(
            ensure_owner(&user(2, "user"), 1),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn admin_overrides_ownership() {
        assert!(ensure_owner(&user(2, ROLE_ADMIN), 1).is_ok());
        assert!(ensure_admin(&user(2, ROLE_ADMIN)).is_ok());
        assert!(ensure_admin(&user(2, "user")).is_err());
    }
}

use std::str::FromStr;

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Caller role as resolved by the upstream auth gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Owner,
    Admin,
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// Resolved caller identity, consumed as given.
///
/// Token verification happens upstream; the gateway forwards the result as
/// `x-actor-id` and `x-actor-role` headers. The core only performs the final
/// role check per operation.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub actor_id: Uuid,
    pub role: Role,
}

impl Identity {
    /// Admin role is required for every lifecycle and visibility mutation.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Listings are submitted by owner-role actors; admins may act as owners.
    pub fn require_owner(&self) -> Result<(), AppError> {
        match self.role {
            Role::Owner | Role::Admin => Ok(()),
            Role::User => Err(AppError::Forbidden),
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor_id = parts
            .headers
            .get("x-actor-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
            .ok_or(AppError::Unauthorized)?;

        let role = parts
            .headers
            .get("x-actor-role")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Role::from_str(v).ok())
            .ok_or(AppError::Unauthorized)?;

        Ok(Identity { actor_id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            actor_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::from_str("user"), Ok(Role::User));
        assert_eq!(Role::from_str("owner"), Ok(Role::Owner));
        assert_eq!(Role::from_str("admin"), Ok(Role::Admin));
        assert!(Role::from_str("superuser").is_err());
        assert!(Role::from_str("Admin").is_err());
    }

    #[test]
    fn test_require_admin() {
        assert!(identity(Role::Admin).require_admin().is_ok());
        assert!(matches!(
            identity(Role::Owner).require_admin(),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            identity(Role::User).require_admin(),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn test_require_owner_allows_admin() {
        assert!(identity(Role::Owner).require_owner().is_ok());
        assert!(identity(Role::Admin).require_owner().is_ok());
        assert!(matches!(
            identity(Role::User).require_owner(),
            Err(AppError::Forbidden)
        ));
    }
}

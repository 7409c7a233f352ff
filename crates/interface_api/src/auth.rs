//! Authentication and authorization

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::{OrganizationId, UserId};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Organization the user acts for
    pub org: String,
    /// User's roles
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid {0} claim")]
    InvalidClaim(&'static str),
    #[error("Missing permission: {0}")]
    MissingPermission(String),
}

/// Authenticated caller resolved from a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub roles: Vec<String>,
}

impl CallerContext {
    /// Resolves typed identities from the raw claims
    pub fn from_claims(claims: &Claims) -> Result<Self, AuthError> {
        let user_id = claims.sub.parse().map_err(|_| AuthError::InvalidClaim("sub"))?;
        let organization_id = claims.org.parse().map_err(|_| AuthError::InvalidClaim("org"))?;

        Ok(Self {
            user_id,
            organization_id,
            roles: claims.roles.clone(),
        })
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.roles
            .iter()
            .any(|r| r == permission || r == permissions::ADMIN)
    }

    /// Fails with `MissingPermission` unless the caller holds `permission`
    pub fn require(&self, permission: &str) -> Result<(), AuthError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AuthError::MissingPermission(permission.to_string()))
        }
    }
}

/// Creates a new JWT token
///
/// # Arguments
///
/// * `user_id` - User identifier
/// * `organization_id` - Organization the token is scoped to
/// * `roles` - User's roles
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(
    user_id: UserId,
    organization_id: OrganizationId,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let validity = i64::try_from(expiration_secs).map_err(|_| AuthError::InvalidToken)?;
    let exp = now + Duration::seconds(validity);

    let claims = Claims {
        sub: user_id.as_uuid().to_string(),
        org: organization_id.as_uuid().to_string(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
///
/// # Arguments
///
/// * `token` - The JWT token to validate
/// * `secret` - JWT secret key
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Permission definitions
pub mod permissions {
    pub const PROGRAM_READ: &str = "program:read";
    pub const PROGRAM_WRITE: &str = "program:write";
    /// Implies every other permission
    pub const ADMIN: &str = "admin";
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn caller(roles: &[&str]) -> CallerContext {
        CallerContext {
            user_id: UserId::new(),
            organization_id: OrganizationId::new(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_token_round_trip_resolves_caller() {
        let user_id = UserId::new();
        let organization_id = OrganizationId::new();
        let token = create_token(
            user_id,
            organization_id,
            vec![permissions::PROGRAM_READ.to_string()],
            SECRET,
            60,
        )
        .unwrap();

        let claims = validate_token(&token, SECRET).unwrap();
        let context = CallerContext::from_claims(&claims).unwrap();

        assert_eq!(context.user_id, user_id);
        assert_eq!(context.organization_id, organization_id);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = create_token(UserId::new(), OrganizationId::new(), vec![], SECRET, 60).unwrap();
        assert!(matches!(validate_token(&token, "other"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: UserId::new().as_uuid().to_string(),
            org: OrganizationId::new().as_uuid().to_string(),
            roles: vec![],
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();

        assert!(matches!(validate_token(&token, SECRET), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_malformed_org_claim_is_rejected() {
        let claims = Claims {
            sub: UserId::new().as_uuid().to_string(),
            org: "acme".to_string(),
            roles: vec![],
            exp: 0,
            iat: 0,
        };
        assert!(matches!(CallerContext::from_claims(&claims), Err(AuthError::InvalidClaim("org"))));
    }

    #[test]
    fn test_permissions() {
        let reader = caller(&[permissions::PROGRAM_READ]);
        assert!(reader.require(permissions::PROGRAM_READ).is_ok());
        assert!(reader.require(permissions::PROGRAM_WRITE).is_err());

        let admin = caller(&[permissions::ADMIN]);
        assert!(admin.has_permission(permissions::PROGRAM_WRITE));
    }
}

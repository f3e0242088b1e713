//! User accounts: registration, login and token resolution

use crate::auth::{hash_password, verify_password, JwtManager};
use crate::db::models::{User, UserRole};
use crate::db::Repository;
use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use validator::{Validate, ValidationError};

/// New account request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[validate(length(min = 3, max = 30), custom(function = "validate_username"))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 6))]
    pub password: String,

    /// Only honored when admin self-signup is enabled
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// A user together with a freshly issued token
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

fn validate_username(username: &str) -> std::result::Result<(), ValidationError> {
    if username.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(ValidationError::new("alphanumeric"))
    }
}

/// Account operations over the user store
#[derive(Clone)]
pub struct AccountService {
    repo: Repository,
    jwt: Arc<JwtManager>,
    allow_admin_signup: bool,
}

impl AccountService {
    pub fn new(repo: Repository, jwt: Arc<JwtManager>, allow_admin_signup: bool) -> Self {
        Self {
            repo,
            jwt,
            allow_admin_signup,
        }
    }

    /// Create an account and sign it in
    pub async fn register(&self, registration: Registration) -> Result<AuthSession> {
        registration.validate()?;

        if self
            .repo
            .find_user_by_username(&registration.username)
            .await?
            .is_some()
        {
            return Err(AppError::Duplicate {
                message: "Username already exists".to_string(),
                field: None,
            });
        }

        if self.repo.find_user_by_email(&registration.email).await?.is_some() {
            return Err(AppError::Duplicate {
                message: "Email already exists".to_string(),
                field: None,
            });
        }

        let role = if registration.is_admin && self.allow_admin_signup {
            UserRole::Admin
        } else {
            UserRole::User
        };

        let password_hash = hash_password(&registration.password)?;
        let user = self
            .repo
            .create_user(registration.username, registration.email, password_hash, role)
            .await?;

        info!(user_id = %user.id, role = %role, "User registered");

        let token = self.jwt.issue(&user)?;
        Ok(AuthSession { user, token })
    }

    /// Check credentials and issue a token
    pub async fn login(&self, credentials: Credentials) -> Result<AuthSession> {
        let user = self
            .repo
            .find_user_by_email(&credentials.email)
            .await?
            .filter(|user| verify_password(&credentials.password, &user.password_hash))
            .ok_or(AppError::InvalidCredentials)?;

        let token = self.jwt.issue(&user)?;
        Ok(AuthSession { user, token })
    }

    /// Resolve a token to the user it was issued for.
    ///
    /// Fails with a token error if the token does not verify, or with
    /// `UserNotFound` if the account has since been deleted.
    pub async fn resolve_token(&self, token: &str) -> Result<User> {
        let claims = self.jwt.validate_token(token)?;
        let user_id = claims.user_id()?;

        self.repo
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound {
                id: user_id.to_string(),
            })
    }
}

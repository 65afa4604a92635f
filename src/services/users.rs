//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{CreateUser, Permission, User, UserClaims, UserShort},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate user by username and return a JWT token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users_get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !user.is_active {
            return Err(AppError::Authentication("Account is inactive".to_string()));
        }

        if !verify_password(&user, password)? {
            tracing::warn!("Failed login for {}", user.username);
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        let token = self.create_token_for_user(&user)?;
        Ok((token, user))
    }

    /// Create JWT token for a user
    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            is_superuser: user.is_superuser,
            permissions: user.granted_permissions(),
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users_get_by_id(id).await
    }

    pub async fn list_users(&self) -> AppResult<Vec<UserShort>> {
        self.repository.users_list().await
    }

    /// Create a new user
    pub async fn create_user(&self, user: CreateUser) -> AppResult<User> {
        user.validate()?;

        if self.repository.users_username_exists(&user.username).await? {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }

        let password = hash_password(&user.password)?;
        let created = self.repository.users_create(&user, password).await?;
        tracing::info!("User {} created", created.username);
        Ok(created)
    }

    /// Replace a user's permissions
    pub async fn set_permissions(&self, id: i32, permissions: &[Permission]) -> AppResult<User> {
        let user = self.repository.users_set_permissions(id, permissions).await?;
        tracing::info!("Permissions of {} set to {:?}", user.username, user.permissions);
        Ok(user)
    }

    pub async fn delete_user(&self, id: i32) -> AppResult<()> {
        self.repository.users_delete(id).await
    }

    /// Create the `admin` superuser when a password is configured and no superuser exists
    pub async fn ensure_admin(&self) -> AppResult<()> {
        let Some(password) = self.config.admin_password.clone() else {
            return Ok(());
        };
        if self.repository.users_superuser_exists().await? {
            return Ok(());
        }

        self.create_user(CreateUser {
            username: "admin".to_string(),
            password,
            first_name: None,
            last_name: None,
            email: None,
            is_superuser: Some(true),
            permissions: Some(vec![Permission::CanMarkReturned]),
        })
        .await?;
        Ok(())
    }
}

/// Verify user password
fn verify_password(user: &User, password: &str) -> AppResult<bool> {
    if let Some(ref hash) = user.password {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        return Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok());
    }

    Ok(false)
}

/// Hash a password using Argon2
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

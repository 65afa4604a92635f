//! User model, permissions and JWT claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;

/// Named permissions that can be granted to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Set book as returned
    CanMarkReturned,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::CanMarkReturned => "can_mark_returned",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Permission::CanMarkReturned => "Set book as returned",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "can_mark_returned" => Ok(Permission::CanMarkReturned),
            _ => Err(format!("Invalid permission: {}", s)),
        }
    }
}

/// Parse stored permission names, dropping any this build no longer knows
pub fn parse_permissions(names: &[String]) -> Vec<Permission> {
    names.iter().filter_map(|n| n.parse().ok()).collect()
}

/// Full user model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub permissions: Vec<String>,
    pub crea_date: DateTime<Utc>,
}

impl User {
    pub fn granted_permissions(&self) -> Vec<Permission> {
        parse_permissions(&self.permissions)
    }
}

/// Short user representation for lists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserShort {
    pub id: i32,
    pub username: String,
    pub is_superuser: bool,
    pub permissions: Vec<String>,
}

/// Create user request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 3, max = 150, message = "Username must be 3 to 150 characters"))]
    pub username: String,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub is_superuser: Option<bool>,
    pub permissions: Option<Vec<Permission>>,
}

/// Replace the permissions granted to a user
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePermissions {
    pub permissions: Vec<Permission>,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub is_superuser: bool,
    pub permissions: Vec<Permission>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Replace the rights carried by the token with the user's current ones
    pub fn with_current_rights(mut self, user: &User) -> Result<Self, AppError> {
        if !user.is_active {
            return Err(AppError::Authentication("Account is inactive".to_string()));
        }
        self.is_superuser = user.is_superuser;
        self.permissions = user.granted_permissions();
        Ok(self)
    }

    /// Superusers hold every permission
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.is_superuser || self.permissions.contains(&permission)
    }

    pub fn require_permission(&self, permission: Permission) -> Result<(), AppError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "Permission required: {}",
                permission.label()
            )))
        }
    }

    /// Loan management and catalog edits
    pub fn require_mark_returned(&self) -> Result<(), AppError> {
        self.require_permission(Permission::CanMarkReturned)
    }

    /// Require superuser privileges
    pub fn require_superuser(&self) -> Result<(), AppError> {
        if self.is_superuser {
            Ok(())
        } else {
            Err(AppError::Authorization("Superuser privileges required".to_string()))
        }
    }
}

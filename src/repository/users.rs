//! User domain methods on Repository

use super::Repository;
use crate::{
    error::{conflict_on_unique, AppError, AppResult},
    models::user::{CreateUser, Permission, User, UserShort},
};

const SELECT_USER: &str = r#"
    SELECT id, username, password, first_name, last_name, email,
           is_active, is_superuser, permissions, crea_date
    FROM users
"#;

fn permission_names(permissions: &[Permission]) -> Vec<String> {
    let mut names: Vec<String> = permissions.iter().map(|p| p.as_str().to_string()).collect();
    names.sort();
    names.dedup();
    names
}

impl Repository {
    /// Get user by ID
    pub async fn users_get_by_id(&self, id: i32) -> AppResult<User> {
        let query = format!("{} WHERE id = $1", SELECT_USER);
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by username, ignoring case
    pub async fn users_get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let query = format!("{} WHERE LOWER(username) = LOWER($1)", SELECT_USER);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Check if a username is taken
    pub async fn users_username_exists(&self, username: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = LOWER($1))"
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn users_superuser_exists(&self) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE is_superuser)")
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// List all users ordered by username
    pub async fn users_list(&self) -> AppResult<Vec<UserShort>> {
        let rows = sqlx::query_as::<_, UserShort>(
            "SELECT id, username, is_superuser, permissions FROM users ORDER BY username"
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Create user with an already hashed password
    pub async fn users_create(&self, user: &CreateUser, password_hash: String) -> AppResult<User> {
        let permissions = permission_names(user.permissions.as_deref().unwrap_or_default());
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password, first_name, last_name, email, is_superuser, permissions)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, username, password, first_name, last_name, email,
                      is_active, is_superuser, permissions, crea_date
            "#,
        )
        .bind(&user.username)
        .bind(password_hash)
        .bind(user.first_name.as_deref().unwrap_or_default())
        .bind(user.last_name.as_deref().unwrap_or_default())
        .bind(&user.email)
        .bind(user.is_superuser.unwrap_or(false))
        .bind(permissions)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_on_unique("Username already exists"))?;
        Ok(user)
    }

    /// Replace the permissions granted to a user
    pub async fn users_set_permissions(&self, id: i32, permissions: &[Permission]) -> AppResult<User> {
        let query = r#"
            UPDATE users SET permissions = $1 WHERE id = $2
            RETURNING id, username, password, first_name, last_name, email,
                      is_active, is_superuser, permissions, crea_date
        "#;
        sqlx::query_as::<_, User>(query)
            .bind(permission_names(permissions))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Delete user; copies they borrowed lose their borrower
    pub async fn users_delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }
}

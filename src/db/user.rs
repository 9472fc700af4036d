use chrono::Utc;
use uuid::Uuid;

use super::{Backend, DBClient, DbError};
use crate::models::{NewUser, User, UserRole, UserStatus};

const USER_COLUMNS: &str =
    "id, email, password, name, phone, role, status, must_change_password, created_at, updated_at";

/// User database operations trait
pub trait UserExt {
    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, DbError>;

    /// Lookup is case-insensitive.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError>;

    /// Insert a user. Fails with `Duplicate` on a taken email or a second
    /// super-admin.
    async fn save_user(&self, new_user: NewUser) -> Result<User, DbError>;

    /// Newest first, optionally filtered.
    async fn list_users(
        &self,
        role: Option<UserRole>,
        status: Option<UserStatus>,
    ) -> Result<Vec<User>, DbError>;

    async fn update_user_status(&self, user_id: Uuid, status: UserStatus)
    -> Result<User, DbError>;

    /// Store a new hash and clear the must-change flag.
    async fn update_user_password(&self, user_id: Uuid, password: String)
    -> Result<User, DbError>;

    async fn delete_user(&self, user_id: Uuid) -> Result<(), DbError>;

    async fn super_admin_exists(&self) -> Result<bool, DbError>;
}

impl UserExt for DBClient {
    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, DbError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let user = sqlx::query_as::<_, User>(&format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
                ))
                .bind(user_id)
                .fetch_optional(pool)
                .await?;
                Ok(user)
            }
            Backend::Memory(store) => Ok(store.users.read().await.get(&user_id).cloned()),
        }
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let email = email.trim().to_lowercase();
        match &self.backend {
            Backend::Postgres(pool) => {
                let user = sqlx::query_as::<_, User>(&format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = $1"
                ))
                .bind(email)
                .fetch_optional(pool)
                .await?;
                Ok(user)
            }
            Backend::Memory(store) => Ok(store
                .users
                .read()
                .await
                .values()
                .find(|u| u.email == email)
                .cloned()),
        }
    }

    async fn save_user(&self, new_user: NewUser) -> Result<User, DbError> {
        let email = new_user.email.trim().to_lowercase();
        match &self.backend {
            Backend::Postgres(pool) => {
                let user = sqlx::query_as::<_, User>(&format!(
                    r#"
                    INSERT INTO users (email, password, name, phone, role, status, must_change_password)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    RETURNING {USER_COLUMNS}
                    "#
                ))
                .bind(email)
                .bind(new_user.password)
                .bind(new_user.name)
                .bind(new_user.phone)
                .bind(new_user.role)
                .bind(new_user.status)
                .bind(new_user.must_change_password)
                .fetch_one(pool)
                .await?;
                Ok(user)
            }
            Backend::Memory(store) => {
                let mut users = store.users.write().await;
                if users.values().any(|u| u.email == email) {
                    return Err(DbError::Duplicate("User".to_string()));
                }
                if new_user.role == UserRole::SuperAdmin
                    && users.values().any(|u| u.role == UserRole::SuperAdmin)
                {
                    return Err(DbError::Duplicate("Super admin".to_string()));
                }
                let now = Utc::now();
                let user = User {
                    id: Uuid::new_v4(),
                    email,
                    password: new_user.password,
                    name: new_user.name,
                    phone: new_user.phone,
                    role: new_user.role,
                    status: new_user.status,
                    must_change_password: new_user.must_change_password,
                    created_at: now,
                    updated_at: now,
                };
                users.insert(user.id, user.clone());
                Ok(user)
            }
        }
    }

    async fn list_users(
        &self,
        role: Option<UserRole>,
        status: Option<UserStatus>,
    ) -> Result<Vec<User>, DbError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let users = sqlx::query_as::<_, User>(&format!(
                    r#"
                    SELECT {USER_COLUMNS} FROM users
                    WHERE ($1::user_role IS NULL OR role = $1)
                      AND ($2::user_status IS NULL OR status = $2)
                    ORDER BY created_at DESC
                    "#
                ))
                .bind(role)
                .bind(status)
                .fetch_all(pool)
                .await?;
                Ok(users)
            }
            Backend::Memory(store) => {
                let mut users: Vec<User> = store
                    .users
                    .read()
                    .await
                    .values()
                    .filter(|u| role.is_none_or(|r| u.role == r))
                    .filter(|u| status.is_none_or(|s| u.status == s))
                    .cloned()
                    .collect();
                users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                Ok(users)
            }
        }
    }

    async fn update_user_status(
        &self,
        user_id: Uuid,
        status: UserStatus,
    ) -> Result<User, DbError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let user = sqlx::query_as::<_, User>(&format!(
                    r#"
                    UPDATE users SET status = $1, updated_at = NOW()
                    WHERE id = $2
                    RETURNING {USER_COLUMNS}
                    "#
                ))
                .bind(status)
                .bind(user_id)
                .fetch_one(pool)
                .await?;
                Ok(user)
            }
            Backend::Memory(store) => {
                let mut users = store.users.write().await;
                let user = users.get_mut(&user_id).ok_or(DbError::NotFound)?;
                user.status = status;
                user.updated_at = Utc::now();
                Ok(user.clone())
            }
        }
    }

    async fn update_user_password(
        &self,
        user_id: Uuid,
        password: String,
    ) -> Result<User, DbError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let user = sqlx::query_as::<_, User>(&format!(
                    r#"
                    UPDATE users
                    SET password = $1, must_change_password = FALSE, updated_at = NOW()
                    WHERE id = $2
                    RETURNING {USER_COLUMNS}
                    "#
                ))
                .bind(password)
                .bind(user_id)
                .fetch_one(pool)
                .await?;
                Ok(user)
            }
            Backend::Memory(store) => {
                let mut users = store.users.write().await;
                let user = users.get_mut(&user_id).ok_or(DbError::NotFound)?;
                user.password = password;
                user.must_change_password = false;
                user.updated_at = Utc::now();
                Ok(user.clone())
            }
        }
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), DbError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let result = sqlx::query("DELETE FROM users WHERE id = $1")
                    .bind(user_id)
                    .execute(pool)
                    .await?;

                if result.rows_affected() == 0 {
                    return Err(DbError::NotFound);
                }
                Ok(())
            }
            Backend::Memory(store) => {
                store
                    .users
                    .write()
                    .await
                    .remove(&user_id)
                    .map(|_| ())
                    .ok_or(DbError::NotFound)?;
                // Mirrors ON DELETE SET NULL on content_items.owner_id.
                for item in store.items.write().await.values_mut() {
                    if item.owner_id == Some(user_id) {
                        item.owner_id = None;
                    }
                }
                Ok(())
            }
        }
    }

    async fn super_admin_exists(&self) -> Result<bool, DbError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let exists: bool = sqlx::query_scalar(
                    "SELECT EXISTS (SELECT 1 FROM users WHERE role = 'super_admin')",
                )
                .fetch_one(pool)
                .await?;
                Ok(exists)
            }
            Backend::Memory(store) => Ok(store
                .users
                .read()
                .await
                .values()
                .any(|u| u.role == UserRole::SuperAdmin)),
        }
    }
}

use chrono::Utc;
use uuid::Uuid;

use super::{Backend, DBClient, DbError};
use crate::models::Category;

const CATEGORY_COLUMNS: &str = "id, name, slug, description, active, created_at";

/// News category operations
pub trait CategoryExt {
    async fn list_categories(&self, active_only: bool) -> Result<Vec<Category>, DbError>;

    async fn create_category(
        &self,
        name: &str,
        slug: &str,
        description: Option<String>,
    ) -> Result<Category, DbError>;

    async fn count_categories(&self) -> Result<i64, DbError>;
}

impl CategoryExt for DBClient {
    async fn list_categories(&self, active_only: bool) -> Result<Vec<Category>, DbError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let categories = sqlx::query_as::<_, Category>(&format!(
                    "SELECT {CATEGORY_COLUMNS} FROM categories \
                     WHERE active OR NOT $1 ORDER BY name"
                ))
                .bind(active_only)
                .fetch_all(pool)
                .await?;
                Ok(categories)
            }
            Backend::Memory(store) => {
                let mut categories: Vec<Category> = store
                    .categories
                    .read()
                    .await
                    .iter()
                    .filter(|c| c.active || !active_only)
                    .cloned()
                    .collect();
                categories.sort_by(|a, b| a.name.cmp(&b.name));
                Ok(categories)
            }
        }
    }

    async fn create_category(
        &self,
        name: &str,
        slug: &str,
        description: Option<String>,
    ) -> Result<Category, DbError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let category = sqlx::query_as::<_, Category>(&format!(
                    r#"
                    INSERT INTO categories (name, slug, description)
                    VALUES ($1, $2, $3)
                    RETURNING {CATEGORY_COLUMNS}
                    "#
                ))
                .bind(name)
                .bind(slug)
                .bind(description)
                .fetch_one(pool)
                .await?;
                Ok(category)
            }
            Backend::Memory(store) => {
                let mut categories = store.categories.write().await;
                if categories.iter().any(|c| c.slug == slug) {
                    return Err(DbError::Duplicate("Category".to_string()));
                }
                let category = Category {
                    id: Uuid::new_v4(),
                    name: name.to_string(),
                    slug: slug.to_string(),
                    description,
                    active: true,
                    created_at: Utc::now(),
                };
                categories.push(category.clone());
                Ok(category)
            }
        }
    }

    async fn count_categories(&self) -> Result<i64, DbError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
                    .fetch_one(pool)
                    .await?;
                Ok(count)
            }
            Backend::Memory(store) => Ok(store.categories.read().await.len() as i64),
        }
    }
}

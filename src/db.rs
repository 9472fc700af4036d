use std::sync::Arc;

use sqlx::{Pool, Postgres};

mod memory;
pub use memory::MemoryStore;

mod user;
pub use user::UserExt;

mod content;
pub use content::{ContentExt, ItemQuery};

mod ticker;
pub use ticker::TickerExt;

mod category;
pub use category::CategoryExt;

mod premium;
pub use premium::{PremiumAdChanges, PremiumAdExt};

mod inquiry;
pub use inquiry::InquiryExt;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error("{0} already exists")]
    Duplicate(String),
    #[error("record was modified by another request")]
    StaleVersion,
    #[error(transparent)]
    Sqlx(sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DbError::Duplicate(describe_constraint(db_err.constraint()))
            }
            other => DbError::Sqlx(other),
        }
    }
}

fn describe_constraint(constraint: Option<&str>) -> String {
    match constraint {
        Some("users_email_key") => "User".to_string(),
        Some("users_single_super_admin") => "Super admin".to_string(),
        Some("categories_slug_key") => "Category".to_string(),
        Some("inquiries_application_email_key") => "Application".to_string(),
        _ => "Record".to_string(),
    }
}

#[derive(Debug, Clone)]
enum Backend {
    Postgres(Pool<Postgres>),
    Memory(Arc<MemoryStore>),
}

/// Storage handle shared through `AppState`.
///
/// Cloning is cheap: both backends are reference counted.
#[derive(Debug, Clone)]
pub struct DBClient {
    backend: Backend,
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient {
            backend: Backend::Postgres(pool),
        }
    }

    /// Process-local store, used when no database is configured and in tests.
    pub fn in_memory() -> Self {
        DBClient {
            backend: Backend::Memory(Arc::new(MemoryStore::default())),
        }
    }

    pub async fn migrate(&self) -> Result<(), DbError> {
        if let Backend::Postgres(pool) = &self.backend {
            sqlx::migrate!("./migrations").run(pool).await?;
        }
        Ok(())
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Postgres(_) => "postgres",
            Backend::Memory(_) => "memory",
        }
    }
}

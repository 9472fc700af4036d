use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use super::{Backend, DBClient, DbError};
use crate::models::{Inquiry, InquiryForm, InquiryKind, InquiryStatus};

const INQUIRY_COLUMNS: &str = "id, status, admin_note, submitted_at, updated_at, form";

#[derive(sqlx::FromRow)]
struct InquiryRow {
    id: Uuid,
    status: InquiryStatus,
    admin_note: String,
    submitted_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    form: Json<InquiryForm>,
}

impl From<InquiryRow> for Inquiry {
    fn from(row: InquiryRow) -> Self {
        Inquiry {
            id: row.id,
            status: row.status,
            admin_note: row.admin_note,
            submitted_at: row.submitted_at,
            updated_at: row.updated_at,
            form: row.form.0,
        }
    }
}

/// Reporter application and business promotion queue operations
pub trait InquiryExt {
    /// Fails with `Duplicate` when the kind allows one entry per email and
    /// the email is taken.
    async fn insert_inquiry(&self, inquiry: &Inquiry) -> Result<Inquiry, DbError>;

    /// Newest first.
    async fn list_inquiries(&self, kind: InquiryKind) -> Result<Vec<Inquiry>, DbError>;

    /// `None` when no inquiry of that kind has the id.
    async fn update_inquiry_status(
        &self,
        kind: InquiryKind,
        id: Uuid,
        status: InquiryStatus,
        admin_note: &str,
    ) -> Result<Option<Inquiry>, DbError>;

    /// Whether a row was removed.
    async fn delete_inquiry(&self, kind: InquiryKind, id: Uuid) -> Result<bool, DbError>;
}

impl InquiryExt for DBClient {
    async fn insert_inquiry(&self, inquiry: &Inquiry) -> Result<Inquiry, DbError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let row = sqlx::query_as::<_, InquiryRow>(&format!(
                    r#"
                    INSERT INTO inquiries
                        (id, kind, email, status, admin_note, submitted_at, updated_at, form)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    RETURNING {INQUIRY_COLUMNS}
                    "#
                ))
                .bind(inquiry.id)
                .bind(inquiry.kind())
                .bind(inquiry.email())
                .bind(inquiry.status)
                .bind(&inquiry.admin_note)
                .bind(inquiry.submitted_at)
                .bind(inquiry.updated_at)
                .bind(Json(&inquiry.form))
                .fetch_one(pool)
                .await?;
                Ok(row.into())
            }
            Backend::Memory(store) => {
                let mut inquiries = store.inquiries.write().await;
                let kind = inquiry.kind();
                let taken = |i: &Inquiry| {
                    i.kind() == kind && i.email().eq_ignore_ascii_case(inquiry.email())
                };
                if kind.unique_email() && inquiries.iter().any(taken) {
                    return Err(DbError::Duplicate("Application".to_string()));
                }
                inquiries.push(inquiry.clone());
                Ok(inquiry.clone())
            }
        }
    }

    async fn list_inquiries(&self, kind: InquiryKind) -> Result<Vec<Inquiry>, DbError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let rows = sqlx::query_as::<_, InquiryRow>(&format!(
                    "SELECT {INQUIRY_COLUMNS} FROM inquiries \
                     WHERE kind = $1 ORDER BY submitted_at DESC"
                ))
                .bind(kind)
                .fetch_all(pool)
                .await?;
                Ok(rows.into_iter().map(Inquiry::from).collect())
            }
            Backend::Memory(store) => {
                let mut inquiries: Vec<Inquiry> = store
                    .inquiries
                    .read()
                    .await
                    .iter()
                    .filter(|i| i.kind() == kind)
                    .cloned()
                    .collect();
                inquiries.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
                Ok(inquiries)
            }
        }
    }

    async fn update_inquiry_status(
        &self,
        kind: InquiryKind,
        id: Uuid,
        status: InquiryStatus,
        admin_note: &str,
    ) -> Result<Option<Inquiry>, DbError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let row = sqlx::query_as::<_, InquiryRow>(&format!(
                    r#"
                    UPDATE inquiries
                    SET status = $3, admin_note = $4, updated_at = NOW()
                    WHERE id = $1 AND kind = $2
                    RETURNING {INQUIRY_COLUMNS}
                    "#
                ))
                .bind(id)
                .bind(kind)
                .bind(status)
                .bind(admin_note)
                .fetch_optional(pool)
                .await?;
                Ok(row.map(Inquiry::from))
            }
            Backend::Memory(store) => {
                let mut inquiries = store.inquiries.write().await;
                let Some(inquiry) = inquiries
                    .iter_mut()
                    .find(|i| i.id == id && i.kind() == kind)
                else {
                    return Ok(None);
                };
                inquiry.status = status;
                inquiry.admin_note = admin_note.to_string();
                inquiry.updated_at = Utc::now();
                Ok(Some(inquiry.clone()))
            }
        }
    }

    async fn delete_inquiry(&self, kind: InquiryKind, id: Uuid) -> Result<bool, DbError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let result = sqlx::query("DELETE FROM inquiries WHERE id = $1 AND kind = $2")
                    .bind(id)
                    .bind(kind)
                    .execute(pool)
                    .await?;
                Ok(result.rows_affected() > 0)
            }
            Backend::Memory(store) => {
                let mut inquiries = store.inquiries.write().await;
                let before = inquiries.len();
                inquiries.retain(|i| !(i.id == id && i.kind() == kind));
                Ok(inquiries.len() < before)
            }
        }
    }
}

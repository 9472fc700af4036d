use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, types::Json};
use uuid::Uuid;

use super::{Backend, DBClient, DbError};
use crate::models::{ApprovalStatus, ContentItem, ContentKind, ContentPayload};

const ITEM_COLUMNS: &str = "id, owner_id, approval_status, enabled, rejection_reason, \
     published_at, created_at, updated_at, version, payload";

const ITEM_ORDER: &str = " ORDER BY published_at DESC NULLS LAST, created_at DESC";

#[derive(sqlx::FromRow)]
struct ContentRow {
    id: Uuid,
    owner_id: Option<Uuid>,
    approval_status: ApprovalStatus,
    enabled: bool,
    rejection_reason: Option<String>,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
    payload: Json<ContentPayload>,
}

impl From<ContentRow> for ContentItem {
    fn from(row: ContentRow) -> Self {
        ContentItem {
            id: row.id,
            owner_id: row.owner_id,
            approval_status: row.approval_status,
            enabled: row.enabled,
            rejection_reason: row.rejection_reason,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
            payload: row.payload.0,
        }
    }
}

/// Filter for listing content of one kind.
#[derive(Debug, Clone)]
pub struct ItemQuery {
    pub kind: ContentKind,
    pub approval_status: Option<ApprovalStatus>,
    pub enabled: Option<bool>,
    pub owner_id: Option<Uuid>,
    pub category: Option<String>,
    pub featured: Option<bool>,
    /// `(page, limit)`, 1-based. `None` returns every match.
    pub page: Option<(u32, u32)>,
}

impl ItemQuery {
    pub fn new(kind: ContentKind) -> Self {
        ItemQuery {
            kind,
            approval_status: None,
            enabled: None,
            owner_id: None,
            category: None,
            featured: None,
            page: None,
        }
    }

    /// Only rows the public may see: approved and enabled.
    pub fn public(kind: ContentKind) -> Self {
        ItemQuery {
            approval_status: Some(ApprovalStatus::Approved),
            enabled: Some(true),
            ..ItemQuery::new(kind)
        }
    }

    pub fn matches(&self, item: &ContentItem) -> bool {
        item.kind() == self.kind
            && self.approval_status.is_none_or(|s| item.approval_status == s)
            && self.enabled.is_none_or(|e| item.enabled == e)
            && self.owner_id.is_none_or(|o| item.owner_id == Some(o))
            && self
                .category
                .as_deref()
                .is_none_or(|c| item.payload.category() == Some(c))
            && self.featured.is_none_or(|f| item.payload.featured() == f)
    }
}

/// Content database operations trait
pub trait ContentExt {
    async fn insert_item(&self, item: &ContentItem) -> Result<ContentItem, DbError>;

    async fn get_item(&self, kind: ContentKind, id: Uuid)
    -> Result<Option<ContentItem>, DbError>;

    /// Matching page plus the total count before paging.
    async fn list_items(&self, query: &ItemQuery) -> Result<(Vec<ContentItem>, i64), DbError>;

    /// Write `item` if the stored version still equals `item.version`.
    /// The returned row carries the bumped version.
    async fn update_item(&self, item: &ContentItem) -> Result<ContentItem, DbError>;

    async fn delete_item(&self, kind: ContentKind, id: Uuid) -> Result<(), DbError>;
}

fn push_filters(builder: &mut QueryBuilder<'_, sqlx::Postgres>, query: &ItemQuery) {
    builder.push(" WHERE kind = ");
    builder.push_bind(query.kind);
    if let Some(status) = query.approval_status {
        builder.push(" AND approval_status = ");
        builder.push_bind(status);
    }
    if let Some(enabled) = query.enabled {
        builder.push(" AND enabled = ");
        builder.push_bind(enabled);
    }
    if let Some(owner_id) = query.owner_id {
        builder.push(" AND owner_id = ");
        builder.push_bind(owner_id);
    }
    if let Some(category) = query.category.clone() {
        builder.push(
            " AND COALESCE(payload->>'categoryId', payload->>'category', payload->>'placement') = ",
        );
        builder.push_bind(category);
    }
    if let Some(featured) = query.featured {
        builder.push(" AND COALESCE((payload->>'featured')::boolean, FALSE) = ");
        builder.push_bind(featured);
    }
}

impl ContentExt for DBClient {
    async fn insert_item(&self, item: &ContentItem) -> Result<ContentItem, DbError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let row = sqlx::query_as::<_, ContentRow>(&format!(
                    r#"
                    INSERT INTO content_items
                        (id, kind, owner_id, approval_status, enabled, rejection_reason,
                         published_at, created_at, updated_at, version, payload)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                    RETURNING {ITEM_COLUMNS}
                    "#
                ))
                .bind(item.id)
                .bind(item.kind())
                .bind(item.owner_id)
                .bind(item.approval_status)
                .bind(item.enabled)
                .bind(&item.rejection_reason)
                .bind(item.published_at)
                .bind(item.created_at)
                .bind(item.updated_at)
                .bind(item.version)
                .bind(Json(&item.payload))
                .fetch_one(pool)
                .await?;
                Ok(row.into())
            }
            Backend::Memory(store) => {
                let mut items = store.items.write().await;
                if items.contains_key(&item.id) {
                    return Err(DbError::Duplicate("Content item".to_string()));
                }
                items.insert(item.id, item.clone());
                Ok(item.clone())
            }
        }
    }

    async fn get_item(
        &self,
        kind: ContentKind,
        id: Uuid,
    ) -> Result<Option<ContentItem>, DbError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let row = sqlx::query_as::<_, ContentRow>(&format!(
                    "SELECT {ITEM_COLUMNS} FROM content_items WHERE id = $1 AND kind = $2"
                ))
                .bind(id)
                .bind(kind)
                .fetch_optional(pool)
                .await?;
                Ok(row.map(Into::into))
            }
            Backend::Memory(store) => Ok(store
                .items
                .read()
                .await
                .get(&id)
                .filter(|item| item.kind() == kind)
                .cloned()),
        }
    }

    async fn list_items(&self, query: &ItemQuery) -> Result<(Vec<ContentItem>, i64), DbError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let mut count = QueryBuilder::new("SELECT COUNT(*) FROM content_items");
                push_filters(&mut count, query);
                let total: i64 = count.build_query_scalar::<i64>().fetch_one(pool).await?;

                let mut select =
                    QueryBuilder::new(format!("SELECT {ITEM_COLUMNS} FROM content_items"));
                push_filters(&mut select, query);
                select.push(ITEM_ORDER);
                if let Some((page, limit)) = query.page {
                    select.push(" LIMIT ");
                    select.push_bind(i64::from(limit));
                    select.push(" OFFSET ");
                    select.push_bind(i64::from(page.saturating_sub(1)) * i64::from(limit));
                }
                let rows = select.build_query_as::<ContentRow>().fetch_all(pool).await?;

                Ok((rows.into_iter().map(Into::into).collect(), total))
            }
            Backend::Memory(store) => {
                let mut matched: Vec<ContentItem> = store
                    .items
                    .read()
                    .await
                    .values()
                    .filter(|item| query.matches(item))
                    .cloned()
                    .collect();
                // NULLS LAST on published_at: None sorts below any Some.
                matched.sort_by(|a, b| {
                    b.published_at
                        .cmp(&a.published_at)
                        .then_with(|| b.created_at.cmp(&a.created_at))
                });
                let total = matched.len() as i64;
                let page = match query.page {
                    Some((page, limit)) => matched
                        .into_iter()
                        .skip(page.saturating_sub(1) as usize * limit as usize)
                        .take(limit as usize)
                        .collect(),
                    None => matched,
                };
                Ok((page, total))
            }
        }
    }

    async fn update_item(&self, item: &ContentItem) -> Result<ContentItem, DbError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let row = sqlx::query_as::<_, ContentRow>(&format!(
                    r#"
                    UPDATE content_items
                    SET owner_id = $1, approval_status = $2, enabled = $3,
                        rejection_reason = $4, published_at = $5, updated_at = $6,
                        payload = $7, version = version + 1
                    WHERE id = $8 AND kind = $9 AND version = $10
                    RETURNING {ITEM_COLUMNS}
                    "#
                ))
                .bind(item.owner_id)
                .bind(item.approval_status)
                .bind(item.enabled)
                .bind(&item.rejection_reason)
                .bind(item.published_at)
                .bind(item.updated_at)
                .bind(Json(&item.payload))
                .bind(item.id)
                .bind(item.kind())
                .bind(item.version)
                .fetch_optional(pool)
                .await?;

                match row {
                    Some(row) => Ok(row.into()),
                    None => {
                        let exists: bool = sqlx::query_scalar(
                            "SELECT EXISTS (SELECT 1 FROM content_items WHERE id = $1 AND kind = $2)",
                        )
                        .bind(item.id)
                        .bind(item.kind())
                        .fetch_one(pool)
                        .await?;
                        Err(if exists {
                            DbError::StaleVersion
                        } else {
                            DbError::NotFound
                        })
                    }
                }
            }
            Backend::Memory(store) => {
                let mut items = store.items.write().await;
                let stored = items
                    .get_mut(&item.id)
                    .filter(|stored| stored.kind() == item.kind())
                    .ok_or(DbError::NotFound)?;
                if stored.version != item.version {
                    return Err(DbError::StaleVersion);
                }
                *stored = ContentItem {
                    version: item.version + 1,
                    ..item.clone()
                };
                Ok(stored.clone())
            }
        }
    }

    async fn delete_item(&self, kind: ContentKind, id: Uuid) -> Result<(), DbError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let result = sqlx::query("DELETE FROM content_items WHERE id = $1 AND kind = $2")
                    .bind(id)
                    .bind(kind)
                    .execute(pool)
                    .await?;

                if result.rows_affected() == 0 {
                    return Err(DbError::NotFound);
                }
                Ok(())
            }
            Backend::Memory(store) => {
                let mut items = store.items.write().await;
                if !items.get(&id).is_some_and(|item| item.kind() == kind) {
                    return Err(DbError::NotFound);
                }
                items.remove(&id);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payloads::BreakingNews;

    fn entry(status: ApprovalStatus, enabled: bool, text: &str) -> ContentItem {
        let now = Utc::now();
        ContentItem {
            id: Uuid::new_v4(),
            owner_id: None,
            approval_status: status,
            enabled,
            rejection_reason: None,
            published_at: None,
            created_at: now,
            updated_at: now,
            version: 1,
            payload: ContentPayload::BreakingNews(BreakingNews {
                text: text.to_string(),
                priority: 10,
            }),
        }
    }

    #[tokio::test]
    async fn public_query_needs_approved_and_enabled() {
        let db = DBClient::in_memory();
        for (status, enabled) in [
            (ApprovalStatus::Approved, true),
            (ApprovalStatus::Approved, false),
            (ApprovalStatus::Pending, true),
            (ApprovalStatus::Rejected, true),
            (ApprovalStatus::Draft, true),
        ] {
            db.insert_item(&entry(status, enabled, "x")).await.unwrap();
        }
        let (items, total) = db
            .list_items(&ItemQuery::public(ContentKind::BreakingNews))
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert!(items[0].is_publicly_visible());
    }

    #[tokio::test]
    async fn stale_update_is_refused() {
        let db = DBClient::in_memory();
        let item = db
            .insert_item(&entry(ApprovalStatus::Pending, true, "first"))
            .await
            .unwrap();

        let mut first = item.clone();
        first.enabled = false;
        let saved = db.update_item(&first).await.unwrap();
        assert_eq!(saved.version, 2);

        let mut second = item;
        second.approval_status = ApprovalStatus::Approved;
        assert!(matches!(
            db.update_item(&second).await,
            Err(DbError::StaleVersion)
        ));

        let stored = db
            .get_item(ContentKind::BreakingNews, saved.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.approval_status, ApprovalStatus::Pending);
        assert!(!stored.enabled);
    }

    #[tokio::test]
    async fn kind_mismatch_looks_missing() {
        let db = DBClient::in_memory();
        let item = db
            .insert_item(&entry(ApprovalStatus::Approved, true, "x"))
            .await
            .unwrap();
        assert!(db.get_item(ContentKind::News, item.id).await.unwrap().is_none());
        assert!(matches!(
            db.delete_item(ContentKind::News, item.id).await,
            Err(DbError::NotFound)
        ));
    }

    #[tokio::test]
    async fn pages_are_sliced_after_counting() {
        let db = DBClient::in_memory();
        for i in 0..5 {
            db.insert_item(&entry(ApprovalStatus::Approved, true, &format!("n{i}")))
                .await
                .unwrap();
        }
        let query = ItemQuery {
            page: Some((2, 2)),
            ..ItemQuery::public(ContentKind::BreakingNews)
        };
        let (items, total) = db.list_items(&query).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(items.len(), 2);

        let query = ItemQuery {
            page: Some((3, 2)),
            ..ItemQuery::public(ContentKind::BreakingNews)
        };
        let (items, _) = db.list_items(&query).await.unwrap();
        assert_eq!(items.len(), 1);
    }
}

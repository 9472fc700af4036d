use super::{Backend, DBClient, DbError};
use crate::models::BreakingTicker;

const TICKER_COLUMNS: &str = "enabled, text, updated_by, updated_at, pending_text, pending_by, \
     pending_at, pending_status, reviewed_by, reviewed_at, version";

/// Breaking ticker singleton operations
pub trait TickerExt {
    async fn get_ticker(&self) -> Result<Option<BreakingTicker>, DbError>;

    /// Write the ticker row.
    ///
    /// `expected_version` is the version that was read: `None` means no row
    /// existed. Any mismatch fails with `StaleVersion`.
    async fn save_ticker(
        &self,
        ticker: &BreakingTicker,
        expected_version: Option<i64>,
    ) -> Result<BreakingTicker, DbError>;
}

impl TickerExt for DBClient {
    async fn get_ticker(&self) -> Result<Option<BreakingTicker>, DbError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let ticker = sqlx::query_as::<_, BreakingTicker>(&format!(
                    "SELECT {TICKER_COLUMNS} FROM breaking_ticker WHERE id = 1"
                ))
                .fetch_optional(pool)
                .await?;
                Ok(ticker)
            }
            Backend::Memory(store) => Ok(store.ticker.read().await.clone()),
        }
    }

    async fn save_ticker(
        &self,
        ticker: &BreakingTicker,
        expected_version: Option<i64>,
    ) -> Result<BreakingTicker, DbError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let sql = match expected_version {
                    None => format!(
                        r#"
                        INSERT INTO breaking_ticker
                            (id, enabled, text, updated_by, updated_at, pending_text, pending_by,
                             pending_at, pending_status, reviewed_by, reviewed_at, version)
                        VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 1)
                        ON CONFLICT (id) DO NOTHING
                        RETURNING {TICKER_COLUMNS}
                        "#
                    ),
                    Some(_) => format!(
                        r#"
                        UPDATE breaking_ticker
                        SET enabled = $1, text = $2, updated_by = $3, updated_at = $4,
                            pending_text = $5, pending_by = $6, pending_at = $7,
                            pending_status = $8, reviewed_by = $9, reviewed_at = $10,
                            version = version + 1
                        WHERE id = 1 AND version = $11
                        RETURNING {TICKER_COLUMNS}
                        "#
                    ),
                };

                let mut query = sqlx::query_as::<_, BreakingTicker>(&sql)
                    .bind(ticker.enabled)
                    .bind(&ticker.text)
                    .bind(&ticker.updated_by)
                    .bind(ticker.updated_at)
                    .bind(&ticker.pending_text)
                    .bind(&ticker.pending_by)
                    .bind(ticker.pending_at)
                    .bind(ticker.pending_status)
                    .bind(&ticker.reviewed_by)
                    .bind(ticker.reviewed_at);
                if let Some(version) = expected_version {
                    query = query.bind(version);
                }

                query
                    .fetch_optional(pool)
                    .await?
                    .ok_or(DbError::StaleVersion)
            }
            Backend::Memory(store) => {
                let mut slot = store.ticker.write().await;
                let current = slot.as_ref().map(|t| t.version);
                if current != expected_version {
                    return Err(DbError::StaleVersion);
                }
                let saved = BreakingTicker {
                    version: expected_version.unwrap_or(0) + 1,
                    ..ticker.clone()
                };
                *slot = Some(saved.clone());
                Ok(saved)
            }
        }
    }
}

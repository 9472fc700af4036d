use chrono::Utc;

use super::{Backend, DBClient, DbError};
use crate::models::PremiumAd;

const PREMIUM_COLUMNS: &str = "enabled, image_url, link_url, title, updated_at";

/// Fields to overwrite on the premium banner. `None` keeps what is stored.
#[derive(Debug, Clone, Default)]
pub struct PremiumAdChanges {
    pub enabled: Option<bool>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub title: Option<String>,
}

impl PremiumAdChanges {
    fn apply(self, ad: &mut PremiumAd) {
        if let Some(enabled) = self.enabled {
            ad.enabled = enabled;
        }
        if let Some(image_url) = self.image_url {
            ad.image_url = image_url;
        }
        if let Some(link_url) = self.link_url {
            ad.link_url = link_url;
        }
        if let Some(title) = self.title {
            ad.title = title;
        }
    }
}

/// Premium banner singleton operations
pub trait PremiumAdExt {
    async fn get_premium_ad(&self) -> Result<Option<PremiumAd>, DbError>;

    /// Merge `changes` into the stored row, creating it (disabled, empty)
    /// on first write. The merge happens in one statement.
    async fn save_premium_ad(&self, changes: PremiumAdChanges) -> Result<PremiumAd, DbError>;
}

impl PremiumAdExt for DBClient {
    async fn get_premium_ad(&self) -> Result<Option<PremiumAd>, DbError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let ad = sqlx::query_as::<_, PremiumAd>(&format!(
                    "SELECT {PREMIUM_COLUMNS} FROM premium_ad WHERE id = 1"
                ))
                .fetch_optional(pool)
                .await?;
                Ok(ad)
            }
            Backend::Memory(store) => Ok(store.premium_ad.read().await.clone()),
        }
    }

    async fn save_premium_ad(&self, changes: PremiumAdChanges) -> Result<PremiumAd, DbError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let ad = sqlx::query_as::<_, PremiumAd>(&format!(
                    r#"
                    INSERT INTO premium_ad (id, enabled, image_url, link_url, title, updated_at)
                    VALUES (1, COALESCE($1, FALSE), COALESCE($2, ''), COALESCE($3, ''),
                            COALESCE($4, ''), NOW())
                    ON CONFLICT (id) DO UPDATE
                    SET enabled = COALESCE($1, premium_ad.enabled),
                        image_url = COALESCE($2, premium_ad.image_url),
                        link_url = COALESCE($3, premium_ad.link_url),
                        title = COALESCE($4, premium_ad.title),
                        updated_at = NOW()
                    RETURNING {PREMIUM_COLUMNS}
                    "#
                ))
                .bind(changes.enabled)
                .bind(changes.image_url)
                .bind(changes.link_url)
                .bind(changes.title)
                .fetch_one(pool)
                .await?;
                Ok(ad)
            }
            Backend::Memory(store) => {
                let mut slot = store.premium_ad.write().await;
                let mut ad = slot.clone().unwrap_or_else(|| PremiumAd {
                    enabled: false,
                    image_url: String::new(),
                    link_url: String::new(),
                    title: String::new(),
                    updated_at: Utc::now(),
                });
                changes.apply(&mut ad);
                ad.updated_at = Utc::now();
                *slot = Some(ad.clone());
                Ok(ad)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn partial_saves_keep_other_fields() {
        let db = DBClient::in_memory();
        assert!(db.get_premium_ad().await.unwrap().is_none());

        let first = db
            .save_premium_ad(PremiumAdChanges {
                image_url: Some("https://cdn/banner.png".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(!first.enabled);
        assert_eq!(first.title, "");

        let second = db
            .save_premium_ad(PremiumAdChanges {
                enabled: Some(true),
                title: Some("Festival offers".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(second.enabled);
        assert_eq!(second.image_url, "https://cdn/banner.png");
        assert_eq!(db.get_premium_ad().await.unwrap(), Some(second));
    }
}

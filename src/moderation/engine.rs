use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use super::{
    ApprovalPolicies, SubmitIntent, WorkflowError, descriptor,
    ticker::{self, Track},
    workflow,
};
use crate::{
    access,
    db::{ContentExt, DBClient, DbError, ItemQuery, TickerExt},
    error::validation_message,
    models::{ApprovalStatus, BreakingTicker, ContentItem, ContentKind, Identity},
    payloads::Payload,
};

/// Writes that lose a version race are retried this many times in total.
const MAX_ATTEMPTS: usize = 3;

/// Admin verdict on a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

/// Optional filters on public lists.
#[derive(Debug, Clone, Default)]
pub struct PublicFilter {
    pub category: Option<String>,
    pub featured: Option<bool>,
}

/// Runs workflow transitions against storage.
///
/// Every mutation reads the row, checks the caller and the transition, then
/// writes conditionally on the version it read. Nothing is written when a
/// check fails.
#[derive(Debug, Clone)]
pub struct ContentEngine {
    db: DBClient,
    policies: ApprovalPolicies,
}

fn ensure_admin(actor: Option<&Identity>) -> Result<&Identity, WorkflowError> {
    actor
        .filter(|identity| access::is_super_admin(Some(identity)))
        .ok_or_else(|| {
            WorkflowError::Forbidden("You are not allowed to perform this action".to_string())
        })
}

fn not_found(kind: ContentKind) -> WorkflowError {
    WorkflowError::NotFound(format!("{} not found", descriptor(kind).label))
}

impl ContentEngine {
    pub fn new(db: DBClient, policies: ApprovalPolicies) -> Self {
        ContentEngine { db, policies }
    }

    async fn load(&self, kind: ContentKind, id: Uuid) -> Result<ContentItem, WorkflowError> {
        self.db
            .get_item(kind, id)
            .await?
            .ok_or_else(|| not_found(kind))
    }

    /// Read, apply, write-if-unchanged. `apply` returns whether to persist.
    async fn mutate<F>(
        &self,
        kind: ContentKind,
        id: Uuid,
        mut apply: F,
    ) -> Result<ContentItem, WorkflowError>
    where
        F: FnMut(&mut ContentItem) -> Result<bool, WorkflowError> + Send,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut item = self.load(kind, id).await?;
            if !apply(&mut item)? {
                return Ok(item);
            }
            match self.db.update_item(&item).await {
                Ok(saved) => return Ok(saved),
                Err(DbError::StaleVersion) if attempt < MAX_ATTEMPTS => {
                    tracing::warn!(%kind, %id, attempt, "Concurrent write, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub async fn submit<P: Payload>(
        &self,
        actor: Option<&Identity>,
        mut payload: P,
        intent: Option<SubmitIntent>,
    ) -> Result<ContentItem, WorkflowError> {
        payload
            .validate()
            .map_err(|e| WorkflowError::Invalid(validation_message(&e)))?;
        if !access::is_super_admin(actor) {
            payload.reset_admin_flags();
        }

        let intent = intent.unwrap_or(descriptor(P::KIND).default_intent);
        let now = Utc::now();
        let (approval_status, published_at) = workflow::initial_status(actor, intent, now);

        let item = ContentItem {
            id: Uuid::new_v4(),
            owner_id: actor.map(|a| a.user_id),
            approval_status,
            enabled: true,
            rejection_reason: None,
            published_at,
            created_at: now,
            updated_at: now,
            version: 1,
            payload: payload.wrap(),
        };
        let saved = self.db.insert_item(&item).await?;
        tracing::info!(kind = %P::KIND, id = %saved.id, status = saved.approval_status.to_str(), "Content submitted");
        Ok(saved)
    }

    pub async fn edit<P: Payload>(
        &self,
        actor: Option<&Identity>,
        id: Uuid,
        patch: P::Patch,
        intent: Option<SubmitIntent>,
    ) -> Result<ContentItem, WorkflowError> {
        self.mutate(P::KIND, id, |item| {
            let mut merged = P::unwrap(&item.payload)
                .cloned()
                .ok_or_else(|| not_found(P::KIND))?;
            workflow::edit(item, actor, intent, Utc::now())?;

            merged.apply_patch(patch.clone());
            merged
                .validate()
                .map_err(|e| WorkflowError::Invalid(validation_message(&e)))?;
            item.payload = merged.wrap();
            Ok(true)
        })
        .await
    }

    pub async fn review(
        &self,
        kind: ContentKind,
        actor: Option<&Identity>,
        id: Uuid,
        decision: Decision,
    ) -> Result<ContentItem, WorkflowError> {
        ensure_admin(actor)?;
        let policy = self.policies.for_kind(kind);
        let item = self
            .mutate(kind, id, |item| match &decision {
                Decision::Approve => workflow::approve(item, policy, Utc::now()),
                Decision::Reject(reason) => {
                    workflow::reject(item, reason.clone(), Utc::now()).map(|_| true)
                }
            })
            .await?;
        tracing::info!(%kind, %id, status = item.approval_status.to_str(), "Content reviewed");
        Ok(item)
    }

    pub async fn toggle_enabled(
        &self,
        kind: ContentKind,
        actor: Option<&Identity>,
        id: Uuid,
    ) -> Result<ContentItem, WorkflowError> {
        ensure_admin(actor)?;
        self.mutate(kind, id, |item| {
            workflow::toggle_enabled(item, Utc::now());
            Ok(true)
        })
        .await
    }

    pub async fn toggle_featured(
        &self,
        kind: ContentKind,
        actor: Option<&Identity>,
        id: Uuid,
    ) -> Result<ContentItem, WorkflowError> {
        ensure_admin(actor)?;
        self.mutate(kind, id, |item| {
            item.payload.toggle_featured().ok_or_else(|| {
                WorkflowError::Invalid(format!(
                    "{} cannot be featured",
                    descriptor(kind).label
                ))
            })?;
            item.updated_at = Utc::now();
            Ok(true)
        })
        .await
    }

    pub async fn remove(
        &self,
        kind: ContentKind,
        actor: Option<&Identity>,
        id: Uuid,
    ) -> Result<(), WorkflowError> {
        let item = self.load(kind, id).await?;
        workflow::check_delete(&item, actor)?;
        self.db.delete_item(kind, id).await?;
        tracing::info!(%kind, %id, "Content deleted");
        Ok(())
    }

    /// Single read. Rows the caller may not see look missing.
    pub async fn find_visible(
        &self,
        kind: ContentKind,
        actor: Option<&Identity>,
        id: Uuid,
    ) -> Result<ContentItem, WorkflowError> {
        let item = self.load(kind, id).await?;
        if workflow::can_view(&item, actor) {
            Ok(item)
        } else {
            Err(not_found(kind))
        }
    }

    pub async fn list_public(
        &self,
        kind: ContentKind,
        filter: PublicFilter,
        page: PageRequest,
    ) -> Result<(Vec<ContentItem>, i64), WorkflowError> {
        let query = ItemQuery {
            category: filter.category,
            featured: filter.featured,
            page: Some((page.page, page.limit)),
            ..ItemQuery::public(kind)
        };
        Ok(self.db.list_items(&query).await?)
    }

    pub async fn list_owned(
        &self,
        kind: ContentKind,
        actor: &Identity,
        page: Option<PageRequest>,
    ) -> Result<(Vec<ContentItem>, i64), WorkflowError> {
        let query = ItemQuery {
            owner_id: Some(actor.user_id),
            page: page.map(|p| (p.page, p.limit)),
            ..ItemQuery::new(kind)
        };
        Ok(self.db.list_items(&query).await?)
    }

    pub async fn list_all(
        &self,
        kind: ContentKind,
        status: Option<ApprovalStatus>,
        page: Option<PageRequest>,
    ) -> Result<(Vec<ContentItem>, i64), WorkflowError> {
        let query = ItemQuery {
            approval_status: status,
            page: page.map(|p| (p.page, p.limit)),
            ..ItemQuery::new(kind)
        };
        Ok(self.db.list_items(&query).await?)
    }

    // ------------------------------------------------------------------
    // Breaking ticker
    // ------------------------------------------------------------------

    pub async fn ticker(&self) -> Result<Option<BreakingTicker>, WorkflowError> {
        Ok(self.db.get_ticker().await?)
    }

    /// Same read-check-write loop as `mutate`, over the singleton row.
    async fn write_ticker<F>(&self, mut apply: F) -> Result<BreakingTicker, WorkflowError>
    where
        F: FnMut(Option<BreakingTicker>) -> Result<BreakingTicker, WorkflowError> + Send,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let current = self.db.get_ticker().await?;
            let expected = current.as_ref().map(|t| t.version);
            let next = apply(current)?;
            match self.db.save_ticker(&next, expected).await {
                Ok(saved) => return Ok(saved),
                Err(DbError::StaleVersion) if attempt < MAX_ATTEMPTS => {
                    tracing::warn!(attempt, "Concurrent ticker write, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub async fn submit_ticker(
        &self,
        actor: &Identity,
        text: &str,
    ) -> Result<(BreakingTicker, Track), WorkflowError> {
        let mut track = Track::Queued;
        let saved = self
            .write_ticker(|current| {
                let (next, outcome) = ticker::submit(current, actor, text, Utc::now())?;
                track = outcome;
                Ok(next)
            })
            .await?;
        tracing::info!(by = %actor.email, ?track, "Breaking ticker written");
        Ok((saved, track))
    }

    pub async fn review_ticker(
        &self,
        actor: Option<&Identity>,
        decision: Decision,
        expected_version: Option<i64>,
    ) -> Result<BreakingTicker, WorkflowError> {
        let admin = ensure_admin(actor)?;
        let missing = match decision {
            Decision::Approve => "No pending ticker to approve",
            Decision::Reject(_) => "No pending ticker to reject",
        };
        self.write_ticker(|current| {
            let mut ticker =
                current.ok_or_else(|| WorkflowError::NotFound(missing.to_string()))?;
            let now = Utc::now();
            match decision {
                Decision::Approve => ticker::approve(&mut ticker, admin, expected_version, now)?,
                Decision::Reject(_) => ticker::reject(&mut ticker, admin, expected_version, now)?,
            }
            Ok(ticker)
        })
        .await
    }

    pub async fn toggle_ticker(
        &self,
        actor: Option<&Identity>,
    ) -> Result<BreakingTicker, WorkflowError> {
        ensure_admin(actor)?;
        self.write_ticker(|current| {
            let mut ticker =
                current.ok_or_else(|| WorkflowError::NotFound("No ticker exists".to_string()))?;
            ticker::toggle(&mut ticker, Utc::now());
            Ok(ticker)
        })
        .await
    }
}

//! Approval transitions for row-based content.
//!
//! ```text
//! (new) --save--> draft --submit--> pending --approve--> approved
//!                                      |  ^                  |
//!                                   reject |                 reject
//!                                      v  | owner edit       v
//!                                    rejected <--------------+
//! ```
//!
//! Only the super-admin approves or rejects. Admin edits never move the
//! status; owner edits on approved rows are refused.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{ApprovalPolicy, WorkflowError};
use crate::{
    access,
    models::{ApprovalStatus, ContentItem, Identity},
};

/// What the author asked for when saving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitIntent {
    Submit,
    #[serde(other)]
    Draft,
}

/// Status and publish stamp for a freshly created row.
pub fn initial_status(
    actor: Option<&Identity>,
    intent: SubmitIntent,
    now: DateTime<Utc>,
) -> (ApprovalStatus, Option<DateTime<Utc>>) {
    match (actor, intent) {
        // An anonymous draft could never be resubmitted.
        (None, _) => (ApprovalStatus::Pending, None),
        (Some(_), SubmitIntent::Draft) => (ApprovalStatus::Draft, None),
        (Some(id), SubmitIntent::Submit) if access::is_super_admin(Some(id)) => {
            (ApprovalStatus::Approved, Some(now))
        }
        (Some(_), SubmitIntent::Submit) => (ApprovalStatus::Pending, None),
    }
}

/// Returns whether anything changed.
pub fn approve(
    item: &mut ContentItem,
    policy: ApprovalPolicy,
    now: DateTime<Utc>,
) -> Result<bool, WorkflowError> {
    match item.approval_status {
        ApprovalStatus::Draft => Err(WorkflowError::Invalid(
            "Drafts must be submitted before approval".to_string(),
        )),
        ApprovalStatus::Approved if !policy.restamp_on_reapprove => Ok(false),
        ApprovalStatus::Approved => {
            item.published_at = Some(now);
            item.updated_at = now;
            Ok(true)
        }
        ApprovalStatus::Pending | ApprovalStatus::Rejected => {
            item.approval_status = ApprovalStatus::Approved;
            item.published_at = Some(now);
            item.rejection_reason = None;
            item.updated_at = now;
            Ok(true)
        }
    }
}

pub fn reject(
    item: &mut ContentItem,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    if item.approval_status == ApprovalStatus::Draft {
        return Err(WorkflowError::Invalid(
            "Drafts must be submitted before rejection".to_string(),
        ));
    }
    item.approval_status = ApprovalStatus::Rejected;
    item.rejection_reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
    item.published_at = None;
    item.updated_at = now;
    Ok(())
}

/// Status change caused by an edit. The payload merge happens elsewhere.
pub fn edit(
    item: &mut ContentItem,
    actor: Option<&Identity>,
    intent: Option<SubmitIntent>,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    let Some(identity) = actor else {
        return Err(WorkflowError::Forbidden(
            "You can only edit your own content".to_string(),
        ));
    };

    if access::is_super_admin(Some(identity)) {
        item.updated_at = now;
        return Ok(());
    }

    if !item.is_owned_by(identity.user_id) {
        return Err(WorkflowError::Forbidden(
            "You can only edit your own content".to_string(),
        ));
    }

    match item.approval_status {
        ApprovalStatus::Approved => {
            return Err(WorkflowError::Forbidden(
                "Cannot edit approved content".to_string(),
            ));
        }
        ApprovalStatus::Draft => {
            if intent == Some(SubmitIntent::Submit) {
                item.approval_status = ApprovalStatus::Pending;
            }
        }
        ApprovalStatus::Pending | ApprovalStatus::Rejected => {
            item.approval_status = ApprovalStatus::Pending;
            item.rejection_reason = None;
        }
    }
    item.updated_at = now;
    Ok(())
}

pub fn toggle_enabled(item: &mut ContentItem, now: DateTime<Utc>) -> bool {
    item.enabled = !item.enabled;
    item.updated_at = now;
    item.enabled
}

pub fn check_delete(item: &ContentItem, actor: Option<&Identity>) -> Result<(), WorkflowError> {
    if access::is_super_admin(actor) {
        return Ok(());
    }
    match actor {
        Some(identity) if item.is_owned_by(identity.user_id) => {
            if item.approval_status == ApprovalStatus::Approved {
                Err(WorkflowError::Forbidden(
                    "Cannot delete approved content".to_string(),
                ))
            } else {
                Ok(())
            }
        }
        _ => Err(WorkflowError::Forbidden(
            "You can only delete your own content".to_string(),
        )),
    }
}

/// Public rows, plus anything the caller owns, plus everything for the admin.
pub fn can_view(item: &ContentItem, actor: Option<&Identity>) -> bool {
    item.is_publicly_visible() || access::owns_or_admin(actor, item.owner_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentPayload, UserRole};
    use crate::payloads::BreakingNews;
    use uuid::Uuid;

    fn identity(role: UserRole) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            email: "someone@x.com".to_string(),
            role,
            must_change_password: false,
        }
    }

    fn item(owner: &Identity, status: ApprovalStatus) -> ContentItem {
        let now = Utc::now();
        ContentItem {
            id: Uuid::new_v4(),
            owner_id: Some(owner.user_id),
            approval_status: status,
            enabled: true,
            rejection_reason: None,
            published_at: None,
            created_at: now,
            updated_at: now,
            version: 1,
            payload: ContentPayload::BreakingNews(BreakingNews {
                text: "Flood alert".to_string(),
                priority: 10,
            }),
        }
    }

    const NO_RESTAMP: ApprovalPolicy = ApprovalPolicy {
        restamp_on_reapprove: false,
    };

    #[test]
    fn creation_status_follows_intent_and_role() {
        let now = Utc::now();
        let reporter = identity(UserRole::Reporter);
        let admin = identity(UserRole::SuperAdmin);

        assert_eq!(
            initial_status(Some(&reporter), SubmitIntent::Draft, now),
            (ApprovalStatus::Draft, None)
        );
        assert_eq!(
            initial_status(Some(&reporter), SubmitIntent::Submit, now),
            (ApprovalStatus::Pending, None)
        );
        assert_eq!(
            initial_status(Some(&admin), SubmitIntent::Submit, now),
            (ApprovalStatus::Approved, Some(now))
        );
        assert_eq!(
            initial_status(Some(&admin), SubmitIntent::Draft, now),
            (ApprovalStatus::Draft, None)
        );
        assert_eq!(
            initial_status(None, SubmitIntent::Draft, now),
            (ApprovalStatus::Pending, None)
        );
    }

    #[test]
    fn unknown_intent_means_draft() {
        let intent: SubmitIntent = serde_json::from_str("\"publish-now\"").unwrap();
        assert_eq!(intent, SubmitIntent::Draft);
        let intent: SubmitIntent = serde_json::from_str("\"submit\"").unwrap();
        assert_eq!(intent, SubmitIntent::Submit);
    }

    #[test]
    fn approve_stamps_only_on_the_first_edge() {
        let owner = identity(UserRole::Reporter);
        let mut row = item(&owner, ApprovalStatus::Pending);
        row.rejection_reason = Some("old".into());
        let first = Utc::now();

        assert!(approve(&mut row, NO_RESTAMP, first).unwrap());
        assert_eq!(row.approval_status, ApprovalStatus::Approved);
        assert_eq!(row.published_at, Some(first));
        assert_eq!(row.rejection_reason, None);

        let later = first + chrono::Duration::seconds(30);
        assert!(!approve(&mut row, NO_RESTAMP, later).unwrap());
        assert_eq!(row.published_at, Some(first));
    }

    #[test]
    fn approve_restamps_when_policy_asks() {
        let owner = identity(UserRole::Reporter);
        let mut row = item(&owner, ApprovalStatus::Approved);
        let now = Utc::now();
        let policy = ApprovalPolicy {
            restamp_on_reapprove: true,
        };
        assert!(approve(&mut row, policy, now).unwrap());
        assert_eq!(row.published_at, Some(now));
        assert_eq!(row.approval_status, ApprovalStatus::Approved);
    }

    #[test]
    fn drafts_cannot_be_reviewed() {
        let owner = identity(UserRole::Reporter);
        let mut row = item(&owner, ApprovalStatus::Draft);
        assert!(matches!(
            approve(&mut row, NO_RESTAMP, Utc::now()),
            Err(WorkflowError::Invalid(_))
        ));
        assert!(matches!(
            reject(&mut row, None, Utc::now()),
            Err(WorkflowError::Invalid(_))
        ));
        assert_eq!(row.approval_status, ApprovalStatus::Draft);
    }

    #[test]
    fn reject_records_reason_and_unpublishes() {
        let owner = identity(UserRole::Reporter);
        let mut row = item(&owner, ApprovalStatus::Approved);
        row.published_at = Some(Utc::now());
        reject(&mut row, Some(" Blurry photo ".into()), Utc::now()).unwrap();
        assert_eq!(row.approval_status, ApprovalStatus::Rejected);
        assert_eq!(row.rejection_reason.as_deref(), Some("Blurry photo"));
        assert_eq!(row.published_at, None);
    }

    #[test]
    fn owner_resubmission_clears_rejection() {
        let owner = identity(UserRole::Reporter);
        let mut row = item(&owner, ApprovalStatus::Rejected);
        row.rejection_reason = Some("Needs sources".into());
        edit(&mut row, Some(&owner), Some(SubmitIntent::Draft), Utc::now()).unwrap();
        assert_eq!(row.approval_status, ApprovalStatus::Pending);
        assert_eq!(row.rejection_reason, None);
    }

    #[test]
    fn owner_cannot_edit_approved() {
        let owner = identity(UserRole::Reporter);
        let mut row = item(&owner, ApprovalStatus::Approved);
        let before = row.clone();
        let err = edit(&mut row, Some(&owner), None, Utc::now()).unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden(_)));
        assert_eq!(row, before);
    }

    #[test]
    fn draft_stays_draft_until_submitted() {
        let owner = identity(UserRole::Reporter);
        let mut row = item(&owner, ApprovalStatus::Draft);
        edit(&mut row, Some(&owner), None, Utc::now()).unwrap();
        assert_eq!(row.approval_status, ApprovalStatus::Draft);
        edit(&mut row, Some(&owner), Some(SubmitIntent::Submit), Utc::now()).unwrap();
        assert_eq!(row.approval_status, ApprovalStatus::Pending);
    }

    #[test]
    fn admin_edit_keeps_status() {
        let owner = identity(UserRole::Reporter);
        let admin = identity(UserRole::SuperAdmin);
        for status in [
            ApprovalStatus::Approved,
            ApprovalStatus::Rejected,
            ApprovalStatus::Draft,
        ] {
            let mut row = item(&owner, status);
            edit(&mut row, Some(&admin), Some(SubmitIntent::Submit), Utc::now()).unwrap();
            assert_eq!(row.approval_status, status);
        }
    }

    #[test]
    fn strangers_cannot_edit() {
        let owner = identity(UserRole::Reporter);
        let other = identity(UserRole::Reporter);
        let mut row = item(&owner, ApprovalStatus::Pending);
        assert!(edit(&mut row, Some(&other), None, Utc::now()).is_err());
        assert!(edit(&mut row, None, None, Utc::now()).is_err());
    }

    #[test]
    fn delete_rules() {
        let owner = identity(UserRole::Reporter);
        let admin = identity(UserRole::SuperAdmin);
        let other = identity(UserRole::Reporter);

        let pending = item(&owner, ApprovalStatus::Pending);
        assert!(check_delete(&pending, Some(&owner)).is_ok());
        assert!(check_delete(&pending, Some(&other)).is_err());
        assert!(check_delete(&pending, None).is_err());

        let approved = item(&owner, ApprovalStatus::Approved);
        assert!(check_delete(&approved, Some(&owner)).is_err());
        assert!(check_delete(&approved, Some(&admin)).is_ok());
    }

    #[test]
    fn visibility_needs_approval_and_enabled() {
        let owner = identity(UserRole::Reporter);
        let mut row = item(&owner, ApprovalStatus::Pending);
        assert!(!row.is_publicly_visible());
        assert!(!can_view(&row, None));
        assert!(can_view(&row, Some(&owner)));

        row.approval_status = ApprovalStatus::Approved;
        assert!(can_view(&row, None));

        assert!(!toggle_enabled(&mut row, Utc::now()));
        assert!(!row.is_publicly_visible());
        assert_eq!(row.approval_status, ApprovalStatus::Approved);
        assert!(can_view(&row, Some(&identity(UserRole::SuperAdmin))));
    }
}

//! Breaking ticker: one row, two tracks.
//!
//! The super-admin writes straight to the live `text`. Everyone else lands in
//! the `pending_*` fields until the admin approves or rejects.

use chrono::{DateTime, Utc};

use super::WorkflowError;
use crate::{
    access,
    models::{ApprovalStatus, BreakingTicker, Identity},
};

/// Outcome of a ticker write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    Live,
    Queued,
}

fn blank(now: DateTime<Utc>) -> BreakingTicker {
    BreakingTicker {
        enabled: false,
        text: String::new(),
        updated_by: None,
        updated_at: now,
        pending_text: None,
        pending_by: None,
        pending_at: None,
        pending_status: None,
        reviewed_by: None,
        reviewed_at: None,
        version: 0,
    }
}

fn clear_pending(ticker: &mut BreakingTicker) {
    ticker.pending_text = None;
    ticker.pending_by = None;
    ticker.pending_at = None;
}

fn check_version(ticker: &BreakingTicker, expected: Option<i64>) -> Result<(), WorkflowError> {
    match expected {
        Some(version) if version != ticker.version => Err(WorkflowError::Conflict(format!(
            "Ticker changed since version {} (now {})",
            version, ticker.version
        ))),
        _ => Ok(()),
    }
}

pub fn submit(
    current: Option<BreakingTicker>,
    actor: &Identity,
    text: &str,
    now: DateTime<Utc>,
) -> Result<(BreakingTicker, Track), WorkflowError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(WorkflowError::Invalid(
            "Breaking ticker text is required".to_string(),
        ));
    }

    let mut ticker = current.unwrap_or_else(|| blank(now));

    if access::is_super_admin(Some(actor)) {
        ticker.text = text.to_string();
        ticker.enabled = true;
        ticker.updated_by = Some(actor.email.clone());
        ticker.updated_at = now;
        clear_pending(&mut ticker);
        ticker.pending_status = None;
        return Ok((ticker, Track::Live));
    }

    ticker.pending_text = Some(text.to_string());
    ticker.pending_by = Some(actor.email.clone());
    ticker.pending_at = Some(now);
    ticker.pending_status = Some(ApprovalStatus::Pending);
    Ok((ticker, Track::Queued))
}

/// Promote the pending text to live.
pub fn approve(
    ticker: &mut BreakingTicker,
    actor: &Identity,
    expected_version: Option<i64>,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    check_version(ticker, expected_version)?;
    if !ticker.has_pending() {
        return Err(WorkflowError::NotFound(
            "No pending ticker to approve".to_string(),
        ));
    }

    ticker.text = ticker.pending_text.take().unwrap_or_default();
    ticker.enabled = true;
    ticker.updated_by = ticker.pending_by.take();
    ticker.updated_at = now;
    ticker.pending_at = None;
    ticker.pending_status = None;
    ticker.reviewed_by = Some(actor.email.clone());
    ticker.reviewed_at = Some(now);
    Ok(())
}

/// Drop the pending text; live text is untouched.
pub fn reject(
    ticker: &mut BreakingTicker,
    actor: &Identity,
    expected_version: Option<i64>,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    check_version(ticker, expected_version)?;
    if !ticker.has_pending() {
        return Err(WorkflowError::NotFound(
            "No pending ticker to reject".to_string(),
        ));
    }

    clear_pending(ticker);
    ticker.pending_status = Some(ApprovalStatus::Rejected);
    ticker.reviewed_by = Some(actor.email.clone());
    ticker.reviewed_at = Some(now);
    Ok(())
}

pub fn toggle(ticker: &mut BreakingTicker, now: DateTime<Utc>) -> bool {
    ticker.enabled = !ticker.enabled;
    ticker.updated_at = now;
    ticker.enabled
}

impl BreakingTicker {
    /// What the public endpoint shows.
    pub fn live_text(&self) -> &str {
        if self.enabled { &self.text } else { "" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use uuid::Uuid;

    fn identity(role: UserRole, email: &str) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            role,
            must_change_password: false,
        }
    }

    #[test]
    fn reporter_submission_is_queued() {
        let reporter = identity(UserRole::Reporter, "r@x.com");
        let (ticker, track) = submit(None, &reporter, "  Flood alert ", Utc::now()).unwrap();
        assert_eq!(track, Track::Queued);
        assert_eq!(ticker.text, "");
        assert!(!ticker.enabled);
        assert_eq!(ticker.pending_text.as_deref(), Some("Flood alert"));
        assert_eq!(ticker.pending_by.as_deref(), Some("r@x.com"));
        assert!(ticker.has_pending());
    }

    #[test]
    fn admin_write_goes_live_and_clears_queue() {
        let reporter = identity(UserRole::Reporter, "r@x.com");
        let admin = identity(UserRole::SuperAdmin, "a@x.com");
        let (queued, _) = submit(None, &reporter, "Flood alert", Utc::now()).unwrap();
        let (ticker, track) = submit(Some(queued), &admin, "Roads open", Utc::now()).unwrap();
        assert_eq!(track, Track::Live);
        assert_eq!(ticker.text, "Roads open");
        assert!(ticker.enabled);
        assert!(!ticker.has_pending());
        assert_eq!(ticker.live_text(), "Roads open");
    }

    #[test]
    fn empty_text_is_refused() {
        let reporter = identity(UserRole::Reporter, "r@x.com");
        assert!(matches!(
            submit(None, &reporter, "   ", Utc::now()),
            Err(WorkflowError::Invalid(_))
        ));
    }

    #[test]
    fn approve_promotes_pending() {
        let reporter = identity(UserRole::Reporter, "r@x.com");
        let admin = identity(UserRole::SuperAdmin, "a@x.com");
        let (mut ticker, _) = submit(None, &reporter, "Flood alert", Utc::now()).unwrap();
        approve(&mut ticker, &admin, Some(0), Utc::now()).unwrap();
        assert_eq!(ticker.text, "Flood alert");
        assert_eq!(ticker.pending_text, None);
        assert_eq!(ticker.pending_status, None);
        assert_eq!(ticker.updated_by.as_deref(), Some("r@x.com"));
        assert_eq!(ticker.reviewed_by.as_deref(), Some("a@x.com"));
        assert!(ticker.enabled);
    }

    #[test]
    fn approve_without_pending_is_not_found() {
        let admin = identity(UserRole::SuperAdmin, "a@x.com");
        let (mut ticker, _) = submit(None, &admin, "Live", Utc::now()).unwrap();
        let before = ticker.clone();
        assert!(matches!(
            approve(&mut ticker, &admin, None, Utc::now()),
            Err(WorkflowError::NotFound(_))
        ));
        assert_eq!(ticker, before);
    }

    #[test]
    fn reject_keeps_live_text() {
        let reporter = identity(UserRole::Reporter, "r@x.com");
        let admin = identity(UserRole::SuperAdmin, "a@x.com");
        let (live, _) = submit(None, &admin, "Live", Utc::now()).unwrap();
        let (mut ticker, _) = submit(Some(live), &reporter, "Rumour", Utc::now()).unwrap();
        reject(&mut ticker, &admin, None, Utc::now()).unwrap();
        assert_eq!(ticker.text, "Live");
        assert_eq!(ticker.pending_text, None);
        assert_eq!(ticker.pending_status, Some(ApprovalStatus::Rejected));
        assert!(reject(&mut ticker, &admin, None, Utc::now()).is_err());
    }

    #[test]
    fn stale_version_is_a_conflict() {
        let reporter = identity(UserRole::Reporter, "r@x.com");
        let admin = identity(UserRole::SuperAdmin, "a@x.com");
        let (mut ticker, _) = submit(None, &reporter, "Flood alert", Utc::now()).unwrap();
        ticker.version = 3;
        let before = ticker.clone();
        assert!(matches!(
            approve(&mut ticker, &admin, Some(2), Utc::now()),
            Err(WorkflowError::Conflict(_))
        ));
        assert_eq!(ticker, before);
    }

    #[test]
    fn disabled_ticker_shows_nothing() {
        let admin = identity(UserRole::SuperAdmin, "a@x.com");
        let (mut ticker, _) = submit(None, &admin, "Live", Utc::now()).unwrap();
        assert!(!toggle(&mut ticker, Utc::now()));
        assert_eq!(ticker.live_text(), "");
    }
}

use std::fmt;
use std::str::FromStr;

use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::inquiry::{BusinessPromotion, ReporterApplication};
use crate::payloads::{Advertisement, BreakingNews, Business, Classified, Enewspaper, News};

/// User role enumeration for role-based access control (RBAC)
///
/// Stored in PostgreSQL as the `user_role` ENUM. `SuperAdmin` is held by
/// exactly one account, created through the seed operation.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Registered,
    Reporter,
    Advertiser,
    SuperAdmin,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Registered => "registered",
            UserRole::Reporter => "reporter",
            UserRole::Advertiser => "advertiser",
            UserRole::SuperAdmin => "super_admin",
        }
    }

    /// Roles that go through admin review after self-registration.
    pub fn requires_review(&self) -> bool {
        matches!(self, UserRole::Reporter | UserRole::Advertiser)
    }
}

/// Account status. `Pending` only ever applies to self-registered reporters
/// and advertisers.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Pending,
    Blocked,
    Rejected,
}

impl UserStatus {
    pub fn to_str(&self) -> &str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Pending => "pending",
            UserStatus::Blocked => "blocked",
            UserStatus::Rejected => "rejected",
        }
    }
}

/// User model representing the users table
///
/// `password` holds the argon2 PHC string, never plain text. It is stripped
/// before anything leaves the server (see `FilterUserDto`).
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub must_change_password: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.id,
            email: self.email.clone(),
            role: self.role,
            must_change_password: self.must_change_password,
        }
    }
}

/// Fields needed to insert a user; id and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub must_change_password: bool,
}

/// Verified caller identity, decoded from a bearer token and re-checked
/// against the credential store on every request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub must_change_password: bool,
}

/// Editorial gate, controlled solely by the super-admin.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "approval_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn to_str(&self) -> &str {
        match self {
            ApprovalStatus::Draft => "draft",
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

/// Kinds stored as rows in `content_items`.
///
/// The breaking ticker is moderated too, but it is a singleton with its own
/// table and rules (see `BreakingTicker`), so it has no variant here.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "content_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    News,
    Business,
    Classified,
    Enewspaper,
    BreakingNews,
    Advertisement,
}

impl ContentKind {
    pub const ALL: [ContentKind; 6] = [
        ContentKind::News,
        ContentKind::Business,
        ContentKind::Classified,
        ContentKind::Enewspaper,
        ContentKind::BreakingNews,
        ContentKind::Advertisement,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            ContentKind::News => "news",
            ContentKind::Business => "business",
            ContentKind::Classified => "classified",
            ContentKind::Enewspaper => "enewspaper",
            ContentKind::BreakingNews => "breaking_news",
            ContentKind::Advertisement => "advertisement",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        ContentKind::ALL
            .into_iter()
            .find(|kind| kind.to_str() == wanted)
            .ok_or_else(|| format!("unknown content kind: {}", s))
    }
}

/// Kind-specific payload of a moderated row. Serialized with a `kind` tag so
/// the JSONB column and the API response both carry the discriminant.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentPayload {
    News(News),
    Business(Business),
    Classified(Classified),
    Enewspaper(Enewspaper),
    BreakingNews(BreakingNews),
    Advertisement(Advertisement),
}

impl ContentPayload {
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentPayload::News(_) => ContentKind::News,
            ContentPayload::Business(_) => ContentKind::Business,
            ContentPayload::Classified(_) => ContentKind::Classified,
            ContentPayload::Enewspaper(_) => ContentKind::Enewspaper,
            ContentPayload::BreakingNews(_) => ContentKind::BreakingNews,
            ContentPayload::Advertisement(_) => ContentKind::Advertisement,
        }
    }

    /// Category used by the public list filters.
    pub fn category(&self) -> Option<&str> {
        match self {
            ContentPayload::News(news) => Some(&news.category_id),
            ContentPayload::Business(business) => Some(&business.category),
            ContentPayload::Classified(classified) => Some(&classified.category),
            ContentPayload::Advertisement(ad) => Some(&ad.placement),
            ContentPayload::Enewspaper(_) | ContentPayload::BreakingNews(_) => None,
        }
    }

    pub fn featured(&self) -> bool {
        match self {
            ContentPayload::News(news) => news.featured,
            ContentPayload::Business(business) => business.featured,
            _ => false,
        }
    }
}

/// A moderated content row.
///
/// `approval_status` and `enabled` are orthogonal: approval is the editorial
/// gate, enabled is the operational toggle. Public visibility needs both.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub approval_status: ApprovalStatus,
    pub enabled: bool,
    pub rejection_reason: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
    #[serde(flatten)]
    pub payload: ContentPayload,
}

impl ContentItem {
    pub fn kind(&self) -> ContentKind {
        self.payload.kind()
    }

    pub fn is_publicly_visible(&self) -> bool {
        self.approval_status == ApprovalStatus::Approved && self.enabled
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == Some(user_id)
    }
}

/// The breaking ticker singleton.
///
/// The live text and the queued reporter submission share one row: `text`
/// is what the public sees, `pending_*` is what awaits admin review.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BreakingTicker {
    pub enabled: bool,
    pub text: String,
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub pending_text: Option<String>,
    pub pending_by: Option<String>,
    pub pending_at: Option<DateTime<Utc>>,
    pub pending_status: Option<ApprovalStatus>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl BreakingTicker {
    pub fn has_pending(&self) -> bool {
        self.pending_text.is_some() && self.pending_status == Some(ApprovalStatus::Pending)
    }
}

/// News category.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// The premium banner slot. A singleton edited only by the super-admin.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PremiumAd {
    pub enabled: bool,
    pub image_url: String,
    pub link_url: String,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

/// Public request forms that the admin follows up outside the portal.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "inquiry_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InquiryKind {
    ReporterApplication,
    BusinessPromotion,
}

impl InquiryKind {
    pub fn to_str(&self) -> &'static str {
        match self {
            InquiryKind::ReporterApplication => "reporter_application",
            InquiryKind::BusinessPromotion => "business_promotion",
        }
    }

    /// Reporter applications are never "approved" here: approval means an
    /// account, which the admin creates separately.
    pub fn allows(&self, status: InquiryStatus) -> bool {
        match self {
            InquiryKind::ReporterApplication => status != InquiryStatus::Approved,
            InquiryKind::BusinessPromotion => true,
        }
    }

    /// One open application per email address.
    pub fn unique_email(&self) -> bool {
        matches!(self, InquiryKind::ReporterApplication)
    }
}

impl fmt::Display for InquiryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// Follow-up state of an inquiry. Sent upper-case on the wire.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "inquiry_status", rename_all = "snake_case")]
#[serde(rename_all = "UPPERCASE")]
pub enum InquiryStatus {
    Pending,
    Contacted,
    Approved,
    Rejected,
}

impl FromStr for InquiryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(InquiryStatus::Pending),
            "CONTACTED" => Ok(InquiryStatus::Contacted),
            "APPROVED" => Ok(InquiryStatus::Approved),
            "REJECTED" => Ok(InquiryStatus::Rejected),
            other => Err(format!("unknown inquiry status: {}", other)),
        }
    }
}

/// A submitted inquiry. `form` carries the kind tag and its fields.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub id: Uuid,
    pub status: InquiryStatus,
    pub admin_note: String,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub form: InquiryForm,
}

impl Inquiry {
    pub fn kind(&self) -> InquiryKind {
        self.form.kind()
    }

    pub fn email(&self) -> &str {
        self.form.email()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InquiryForm {
    ReporterApplication(ReporterApplication),
    BusinessPromotion(BusinessPromotion),
}

impl InquiryForm {
    pub fn kind(&self) -> InquiryKind {
        match self {
            InquiryForm::ReporterApplication(_) => InquiryKind::ReporterApplication,
            InquiryForm::BusinessPromotion(_) => InquiryKind::BusinessPromotion,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            InquiryForm::ReporterApplication(form) => &form.email,
            InquiryForm::BusinessPromotion(form) => &form.email,
        }
    }
}

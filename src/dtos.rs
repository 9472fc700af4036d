use crate::{
    models::{ApprovalStatus, User, UserRole, UserStatus},
    moderation::SubmitIntent,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// DTOs define the JSON exchanged with clients. They stay separate from the
// models so the password hash and internal fields never leave the server.

// ============================================================================
// Authentication DTOs
// ============================================================================

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[serde(default)]
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 8, max = 64, message = "Password must be between 8 and 64 characters"))]
    pub password: String,

    pub phone: Option<String>,

    pub role: Option<UserRole>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordDto {
    #[serde(default)]
    #[validate(length(min = 1, message = "All password fields are required"))]
    pub old_password: String,

    #[serde(default)]
    #[validate(length(min = 8, max = 64, message = "Password must be between 8 and 64 characters"))]
    pub new_password: String,

    #[serde(default)]
    #[validate(must_match(other = "new_password", message = "New passwords do not match"))]
    pub confirm_password: String,
}

impl ChangePasswordDto {
    pub fn any_missing(&self) -> bool {
        self.old_password.is_empty()
            || self.new_password.is_empty()
            || self.confirm_password.is_empty()
    }
}

// ============================================================================
// Admin user management DTOs
// ============================================================================

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateReporterDto {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[serde(default)]
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    pub phone: Option<String>,

    #[validate(length(min = 8, max = 64, message = "Password must be between 8 and 64 characters"))]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDecisionDto {
    pub user_id: Uuid,
    pub action: ReviewAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatusDto {
    pub status: UserStatus,
}

// ============================================================================
// Moderation DTOs
// ============================================================================

/// Body of `POST /admin/<kind>/approve`. The id key follows the kind.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewDto {
    #[serde(
        alias = "articleId",
        alias = "businessId",
        alias = "classifiedId",
        alias = "adId"
    )]
    pub id: Uuid,
    pub action: ReviewAction,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RejectDto {
    pub reason: Option<String>,
}

/// Creation body: the kind's payload plus the author's intent.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitDto<P> {
    #[serde(flatten)]
    pub payload: P,
    pub status: Option<SubmitIntent>,
}

/// Edit body: a partial payload plus an optional intent.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDto<Patch> {
    #[serde(flatten)]
    pub patch: Patch,
    pub status: Option<SubmitIntent>,
}

#[derive(Serialize, Deserialize, Validate, Debug, Default)]
pub struct ListQueryDto {
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: Option<u32>,

    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<u32>,

    pub category: Option<String>,

    pub featured: Option<bool>,

    pub status: Option<ApprovalStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TickerSubmitDto {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerReviewDto {
    pub expected_version: Option<i64>,
}

#[derive(Validate, Debug, Default, Clone, Deserialize)]
pub struct CategoryDto {
    #[serde(default)]
    #[validate(length(min = 1, message = "Category name is required"))]
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
}

// ============================================================================
// Premium banner and inquiry DTOs
// ============================================================================

/// Partial update of the premium banner; absent keys keep their value.
#[derive(Validate, Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumAdDto {
    pub enabled: Option<bool>,
    #[validate(length(max = 2048, message = "Image URL is too long"))]
    pub image_url: Option<String>,
    #[validate(length(max = 2048, message = "Link URL is too long"))]
    pub link_url: Option<String>,
    #[validate(length(max = 200, message = "Title must not be more than 200 characters"))]
    pub title: Option<String>,
}

/// Admin follow-up on an inquiry. Status arrives as text so an unknown
/// value can be reported as such.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryUpdateDto {
    pub id: Option<Uuid>,
    pub status: Option<String>,
    pub admin_note: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct InquiryIdQuery {
    pub id: Option<String>,
}

// ============================================================================
// User Response DTOs (filtered data for client)
// ============================================================================

/// Client-safe view of a user, without the password hash.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterUserDto {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: String,
    pub status: String,
    pub must_change_password: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id.to_string(),
            email: user.email.to_owned(),
            name: user.name.to_owned(),
            phone: user.phone.to_owned(),
            role: user.role.to_str().to_string(),
            status: user.status.to_str().to_string(),
            must_change_password: user.must_change_password,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<FilterUserDto> {
        users.iter().map(FilterUserDto::filter_user).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponseDto {
    pub user: FilterUserDto,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponseDto {
    pub user: FilterUserDto,
    pub token: String,
    pub require_password_change: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChangePasswordResponseDto {
    pub success: bool,
    pub message: String,
    pub user: FilterUserDto,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReporterResponseDto {
    pub success: bool,
    pub user: FilterUserDto,
    pub temporary_password: String,
}

/// Generic success response
#[derive(Serialize, Deserialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}

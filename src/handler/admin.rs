use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    db::{DbError, UserExt},
    dtos::{
        CreateReporterDto, CreateReporterResponseDto, FilterUserDto, ReviewAction,
        UserDecisionDto, UserStatusDto,
    },
    error::{ErrorMessage, HttpError},
    extract::ValidJson,
    handler::auth::hash_password,
    models::{ApprovalStatus, ContentKind, NewUser, User, UserRole, UserStatus},
    utils::password,
};

async fn find_user(app_state: &AppState, user_id: Uuid) -> Result<User, HttpError> {
    app_state
        .db_client
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| HttpError::not_found("User not found"))
}

/// Everything waiting on the admin, grouped by kind.
#[instrument(skip_all)]
pub async fn pending_overview(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let engine = &app_state.engine;
    let pending = Some(ApprovalStatus::Pending);

    let (news, _) = engine.list_all(ContentKind::News, pending, None).await?;
    let (businesses, _) = engine.list_all(ContentKind::Business, pending, None).await?;
    let (classifieds, _) = engine.list_all(ContentKind::Classified, pending, None).await?;
    let (enewspapers, _) = engine.list_all(ContentKind::Enewspaper, pending, None).await?;
    let (breaking_news, _) = engine.list_all(ContentKind::BreakingNews, pending, None).await?;
    let (ads, _) = engine.list_all(ContentKind::Advertisement, pending, None).await?;
    let users = app_state
        .db_client
        .list_users(None, Some(UserStatus::Pending))
        .await?;
    let ticker = engine.ticker().await?.filter(|t| t.has_pending());

    Ok(Json(json!({
        "news": news,
        "businesses": businesses,
        "ads": ads,
        "classifieds": classifieds,
        "enewspapers": enewspapers,
        "breakingNews": breaking_news,
        "users": FilterUserDto::filter_users(&users),
        "ticker": ticker,
    })))
}

/// Settle a pending reporter or advertiser registration.
#[instrument(skip_all, fields(user_id = %body.user_id, action = ?body.action))]
pub async fn decide_user(
    State(app_state): State<AppState>,
    ValidJson(body): ValidJson<UserDecisionDto>,
) -> Result<impl IntoResponse, HttpError> {
    let user = find_user(&app_state, body.user_id).await?;
    if user.status != UserStatus::Pending {
        return Err(HttpError::bad_request("User is not pending approval"));
    }

    let status = match body.action {
        ReviewAction::Approve => UserStatus::Active,
        ReviewAction::Reject => UserStatus::Rejected,
    };
    let user = app_state
        .db_client
        .update_user_status(user.id, status)
        .await?;

    tracing::info!(user_id = %user.id, status = user.status.to_str(), "Registration decided");
    Ok(Json(json!({ "success": true, "user": FilterUserDto::filter_user(&user) })))
}

/// Block or unblock an account. The super-admin itself is out of reach.
#[instrument(skip_all, fields(%user_id, status = ?body.status))]
pub async fn set_user_status(
    State(app_state): State<AppState>,
    Path(user_id): Path<Uuid>,
    ValidJson(body): ValidJson<UserStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    if !matches!(body.status, UserStatus::Active | UserStatus::Blocked) {
        return Err(HttpError::bad_request("Status must be active or blocked"));
    }

    let user = find_user(&app_state, user_id).await?;
    if user.role == UserRole::SuperAdmin {
        return Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()));
    }

    let user = app_state
        .db_client
        .update_user_status(user.id, body.status)
        .await?;
    Ok(Json(json!({ "success": true, "user": FilterUserDto::filter_user(&user) })))
}

/// Create an active reporter who must change the password on first login.
#[instrument(skip_all, fields(email = %body.email))]
pub async fn create_reporter(
    State(app_state): State<AppState>,
    ValidJson(body): ValidJson<CreateReporterDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    if app_state
        .db_client
        .get_user_by_email(&body.email)
        .await?
        .is_some()
    {
        return Err(HttpError::bad_request(
            ErrorMessage::UserAlreadyExists.to_string(),
        ));
    }

    let temporary_password = body
        .password
        .clone()
        .unwrap_or_else(password::temporary_password);
    let hashed = hash_password(&temporary_password)?;

    let new_user = NewUser {
        email: body.email.clone(),
        password: hashed,
        name: body.name.trim().to_string(),
        phone: body.phone.clone(),
        role: UserRole::Reporter,
        status: UserStatus::Active,
        must_change_password: true,
    };
    let user = match app_state.db_client.save_user(new_user).await {
        Ok(user) => user,
        Err(DbError::Duplicate(_)) => {
            return Err(HttpError::bad_request(
                ErrorMessage::UserAlreadyExists.to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %user.id, "Reporter created");
    Ok((
        StatusCode::CREATED,
        Json(CreateReporterResponseDto {
            success: true,
            user: FilterUserDto::filter_user(&user),
            temporary_password,
        }),
    ))
}

pub async fn list_reporters(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let reporters = app_state
        .db_client
        .list_users(Some(UserRole::Reporter), None)
        .await?;
    Ok(Json(json!({ "reporters": FilterUserDto::filter_users(&reporters) })))
}

/// Remove a reporter account. Their content stays, without an owner.
#[instrument(skip_all, fields(%user_id))]
pub async fn delete_reporter(
    State(app_state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let user = find_user(&app_state, user_id).await?;
    if user.role != UserRole::Reporter {
        return Err(HttpError::not_found("Reporter not found"));
    }

    app_state.db_client.delete_user(user.id).await?;
    tracing::info!(user_id = %user.id, "Reporter deleted");
    Ok(Json(json!({ "success": true, "message": "Reporter deleted" })))
}

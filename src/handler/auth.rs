use crate::{
    AppState,
    access::{self, Action},
    db::{CategoryExt, DbError, UserExt},
    dtos::{
        AuthResponseDto, ChangePasswordDto, ChangePasswordResponseDto, FilterUserDto,
        LoginResponseDto, LoginUserDto, RegisterUserDto,
    },
    error::{ErrorMessage, HttpError},
    extract::ValidJson,
    handler::category::DEFAULT_CATEGORIES,
    middleware::{CurrentIdentity, gated},
    models::{NewUser, User, UserRole, UserStatus},
    utils::{password, token},
};
use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::json;
use validator::Validate;

use tracing::instrument;

/// Router for authentication endpoints
pub fn auth_handler() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", gated(get(me), Action::Authenticated))
        .route(
            "/change-password",
            gated(post(change_password), Action::Authenticated),
        )
}

/// Sign a token for the user with the configured lifetime.
fn issue_token(app_state: &AppState, user: &User) -> Result<String, HttpError> {
    token::create_token(
        &user.identity(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| {
        tracing::error!("Token creation error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })
}

/// Hash a password. Empty or oversized input is the caller's fault (400);
/// anything else is ours.
pub(crate) fn hash_password(plain: &str) -> Result<String, HttpError> {
    password::hash(plain).map_err(|e| match e {
        ErrorMessage::EmptyPassword | ErrorMessage::ExceededMaxPasswordLength(_) => {
            HttpError::bad_request(e.to_string())
        }
        _ => {
            tracing::error!("Password hashing error: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        }
    })
}

/// Register a new account.
///
/// Reporters and advertisers start `pending` until an admin approves them;
/// everyone else is active immediately. Registering as super-admin is never
/// allowed.
#[instrument(skip(app_state, body), fields(email = %body.email))]
pub async fn register(
    State(app_state): State<AppState>,
    ValidJson(body): ValidJson<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::info!("Invalid register input: {}", e);
        HttpError::from(e)
    })?;

    let role = body.role.unwrap_or(UserRole::Registered);
    if !access::permits(None, Action::SelfRegister(role)) {
        tracing::warn!("Attempt to self-register as super admin");
        return Err(HttpError::forbidden(
            ErrorMessage::AdminRegistrationForbidden.to_string(),
        ));
    }

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

    let status = if role.requires_review() {
        UserStatus::Pending
    } else {
        UserStatus::Active
    };

    let new_user = NewUser {
        email: body.email.clone(),
        password: hash_password(&body.password)?,
        name: body.name.trim().to_string(),
        phone: body.phone.clone(),
        role,
        status,
        must_change_password: false,
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

    let token = issue_token(&app_state, &user)?;
    tracing::info!(user_id = %user.id, role = user.role.to_str(), status = user.status.to_str(), "Register Successful");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponseDto {
            user: FilterUserDto::filter_user(&user),
            token,
        }),
    ))
}

/// Login. Unknown email and wrong password share one message; account
/// status is only revealed after the password checks out.
#[instrument(skip(app_state, jar, body), fields(email = %body.email))]
pub async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    ValidJson(body): ValidJson<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    let user = app_state
        .db_client
        .get_user_by_email(&body.email)
        .await?
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::InvalidCredentials.to_string()))?;

    if !password::verify(&body.password, &user.password) {
        tracing::info!("Login failed: wrong password");
        return Err(HttpError::unauthorized(
            ErrorMessage::InvalidCredentials.to_string(),
        ));
    }

    match user.status {
        UserStatus::Active => {}
        UserStatus::Blocked => {
            return Err(HttpError::forbidden(ErrorMessage::AccountBlocked.to_string()));
        }
        UserStatus::Pending => {
            return Err(HttpError::forbidden(ErrorMessage::AccountPending.to_string()));
        }
        UserStatus::Rejected => {
            return Err(HttpError::forbidden(ErrorMessage::AccountRejected.to_string()));
        }
    }

    let token = issue_token(&app_state, &user)?;
    let cookie = Cookie::build(("token", token.clone()))
        .path("/")
        .http_only(true)
        .build();

    tracing::info!(user_id = %user.id, "Login Successful");
    Ok((
        jar.add(cookie),
        Json(LoginResponseDto {
            user: FilterUserDto::filter_user(&user),
            token,
            require_password_change: user.must_change_password,
        }),
    ))
}

#[instrument(skip(app_state, current))]
pub async fn me(
    State(app_state): State<AppState>,
    Extension(current): Extension<CurrentIdentity>,
) -> Result<impl IntoResponse, HttpError> {
    let identity = current
        .get()
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNotAuthenticated.to_string()))?;

    let user = app_state
        .db_client
        .get_user_by_id(identity.user_id)
        .await?
        .ok_or_else(|| HttpError::not_found("User not found"))?;

    Ok(Json(FilterUserDto::filter_user(&user)))
}

/// Replace the caller's password and clear the must-change flag.
#[instrument(skip(app_state, current, body))]
pub async fn change_password(
    State(app_state): State<AppState>,
    Extension(current): Extension<CurrentIdentity>,
    ValidJson(body): ValidJson<ChangePasswordDto>,
) -> Result<impl IntoResponse, HttpError> {
    let identity = current
        .get()
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNotAuthenticated.to_string()))?;

    if body.any_missing() {
        return Err(HttpError::bad_request("All password fields are required"));
    }
    body.validate()?;

    let user = app_state
        .db_client
        .get_user_by_id(identity.user_id)
        .await?
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNoLongerExist.to_string()))?;

    if !password::verify(&body.old_password, &user.password) {
        return Err(HttpError::unauthorized(
            ErrorMessage::CurrentPasswordIncorrect.to_string(),
        ));
    }

    let hashed = hash_password(&body.new_password)?;
    let user = app_state
        .db_client
        .update_user_password(user.id, hashed)
        .await?;
    let token = issue_token(&app_state, &user)?;

    tracing::info!(user_id = %user.id, "Password changed");
    Ok(Json(ChangePasswordResponseDto {
        success: true,
        message: "Password changed successfully".to_string(),
        user: FilterUserDto::filter_user(&user),
        token,
    }))
}

/// Create the single super-admin from configuration and the default
/// category set. Refused once an admin exists.
#[instrument(skip(app_state))]
pub async fn seed_admin(State(app_state): State<AppState>) -> Result<impl IntoResponse, HttpError> {
    let already_exists =
        || HttpError::forbidden(ErrorMessage::AdminAlreadyExists.to_string());

    if app_state.db_client.super_admin_exists().await? {
        return Err(already_exists());
    }

    if app_state.db_client.count_categories().await? == 0 {
        for (name, slug, description) in DEFAULT_CATEGORIES {
            app_state
                .db_client
                .create_category(name, slug, Some(description.to_string()))
                .await?;
        }
        tracing::info!(count = DEFAULT_CATEGORIES.len(), "Default categories seeded");
    }

    let new_admin = NewUser {
        email: app_state.env.admin_email.clone(),
        password: hash_password(&app_state.env.admin_initial_password)?,
        name: "Portal Admin".to_string(),
        phone: None,
        role: UserRole::SuperAdmin,
        status: UserStatus::Active,
        must_change_password: true,
    };

    let admin = match app_state.db_client.save_user(new_admin).await {
        Ok(admin) => admin,
        Err(DbError::Duplicate(_)) => return Err(already_exists()),
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %admin.id, "Super admin seeded");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Super admin created. Change the password on first login.",
            "email": admin.email,
        })),
    ))
}

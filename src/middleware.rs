use axum::{
    extract::{Request, State},
    http::header,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::MethodRouter,
};

use axum_extra::extract::cookie::CookieJar;

use crate::{
    AppState,
    access::{self, Action, Audience},
    db::UserExt,
    error::{ErrorMessage, HttpError},
    models::{Identity, UserStatus},
    utils::token,
};

/// Request extension holding the resolved caller, `None` for anonymous.
///
/// Inserted by `identify` on every request, so handlers can always take
/// `Extension<CurrentIdentity>`.
#[derive(Debug, Clone, Default)]
pub struct CurrentIdentity(pub Option<Identity>);

impl CurrentIdentity {
    pub fn get(&self) -> Option<&Identity> {
        self.0.as_ref()
    }
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_owned())
        .filter(|token| !token.is_empty())
}

/// Resolve the caller before routing continues.
///
/// Token sources, in order: `Authorization: Bearer <token>`, then the
/// `token` cookie. Bad tokens, unknown users and accounts that are not
/// active resolve to anonymous; refusing is left to `authorize`. The one
/// exception is a storage failure while looking up the owner of a valid
/// token, which ends the request with 500.
pub async fn identify(
    cookie_jar: CookieJar,
    State(app_state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = bearer_token(&req).or_else(|| {
        cookie_jar
            .get("token")
            .map(|cookie| cookie.value().to_string())
    });

    let mut identity = None;
    if let Some(claims) =
        token.and_then(|t| token::verify_token(&t, app_state.env.jwt_secret.as_bytes()))
    {
        match app_state.db_client.get_user_by_id(claims.user_id).await {
            Ok(Some(user)) if user.status == UserStatus::Active => {
                identity = Some(user.identity());
            }
            Ok(Some(user)) => {
                tracing::debug!(user_id = %user.id, status = user.status.to_str(), "Token of inactive account ignored");
            }
            Ok(None) => {
                tracing::debug!(user_id = %claims.user_id, "{}", ErrorMessage::UserNoLongerExist);
            }
            Err(e) => {
                tracing::error!("Failed to resolve token owner: {}", e);
                return HttpError::server_error(ErrorMessage::ServerError.to_string())
                    .into_response();
            }
        }
    }

    req.extensions_mut().insert(CurrentIdentity(identity));
    next.run(req).await
}

/// Route gate. Attach one per protected route with the action it performs.
///
/// # Errors
/// - 401 when the route needs a signed-in caller and there is none
/// - 403 when the account must change its password first
/// - 403 when the caller's role is not allowed
pub async fn authorize(
    req: Request,
    next: Next,
    action: Action,
) -> Result<impl IntoResponse, HttpError> {
    let identity = req
        .extensions()
        .get::<CurrentIdentity>()
        .and_then(|current| current.0.clone());

    if access::allowed_roles(action) == Audience::Anyone {
        return Ok(next.run(req).await);
    }

    let Some(identity) = identity else {
        return Err(HttpError::unauthorized(
            ErrorMessage::UserNotAuthenticated.to_string(),
        ));
    };

    // Signed-in-only routes include change-password itself.
    if identity.must_change_password && action != Action::Authenticated {
        return Err(HttpError::forbidden(
            ErrorMessage::PasswordChangeRequired.to_string(),
        ));
    }

    if !access::permits(Some(&identity), action) {
        tracing::info!(user_id = %identity.user_id, role = identity.role.to_str(), ?action, "Permission denied");
        return Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()));
    }

    Ok(next.run(req).await)
}

/// Wrap a method router so it only runs for callers allowed to `action`.
pub fn gated(method_router: MethodRouter<AppState>, action: Action) -> MethodRouter<AppState> {
    method_router.route_layer(middleware::from_fn(move |req: Request, next: Next| {
        authorize(req, next, action)
    }))
}

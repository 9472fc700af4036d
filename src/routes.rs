//! The route table.
//!
//! Every protected route names the `Action` it performs through `gated`;
//! the role rules themselves live in `access`. Identity is resolved once,
//! for all routes, before any of them run.

use axum::{
    Json, Router,
    http::{
        HeaderValue, Method, Uri,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};
use tower::Layer;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::TraceLayer,
};

use crate::{
    AppState,
    access::Action,
    error::HttpError,
    handler::{
        admin,
        auth::{auth_handler, seed_admin},
        category::category_handler,
        inquiry::inquiry_handler,
        premium::premium_ad_handler,
        content::{
            admin_create, approve, create, feature, get_one, list_admin, list_mine, list_public,
            reject, remove, review, toggle, update,
        },
        ticker,
    },
    middleware::{gated, identify},
    payloads::{Advertisement, BreakingNews, Business, Classified, Enewspaper, News},
};

async fn root() -> Json<Value> {
    Json(json!({ "message": "Portal API v1.0", "status": "running" }))
}

async fn route_not_found(uri: Uri) -> HttpError {
    HttpError::not_found(format!("Route {} not found", uri.path()))
}

fn news_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/news",
            get(list_public::<News>).merge(gated(post(create::<News>), Action::AuthorNews)),
        )
        .route(
            "/news/my-articles",
            gated(get(list_mine::<News>), Action::AuthorNews),
        )
        .route(
            "/news/{id}",
            get(get_one::<News>).merge(gated(
                put(update::<News>).delete(remove::<News>),
                Action::AuthorNews,
            )),
        )
        .route(
            "/admin/news",
            gated(
                get(list_admin::<News>).post(admin_create::<News>),
                Action::Moderate,
            ),
        )
        .route(
            "/admin/news/approve",
            gated(post(review::<News>), Action::Moderate),
        )
        .route(
            "/admin/news/{id}",
            gated(
                put(update::<News>).delete(remove::<News>),
                Action::EditApproved,
            ),
        )
        .route(
            "/admin/news/{id}/toggle",
            gated(post(toggle::<News>), Action::Moderate),
        )
        .route(
            "/admin/news/{id}/featured",
            gated(post(feature::<News>), Action::Moderate),
        )
}

fn business_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/businesses",
            get(list_public::<Business>)
                .merge(gated(post(create::<Business>), Action::SubmitListing)),
        )
        .route(
            "/businesses/mine",
            gated(get(list_mine::<Business>), Action::SubmitListing),
        )
        .route(
            "/businesses/{id}",
            get(get_one::<Business>).merge(gated(
                put(update::<Business>).delete(remove::<Business>),
                Action::SubmitListing,
            )),
        )
        .route(
            "/admin/businesses",
            gated(
                get(list_admin::<Business>).post(admin_create::<Business>),
                Action::Moderate,
            ),
        )
        .route(
            "/admin/businesses/approve",
            gated(post(review::<Business>), Action::Moderate),
        )
        .route(
            "/admin/businesses/{id}",
            gated(
                put(update::<Business>).delete(remove::<Business>),
                Action::EditApproved,
            ),
        )
        .route(
            "/admin/businesses/{id}/toggle",
            gated(post(toggle::<Business>), Action::Moderate),
        )
        .route(
            "/admin/businesses/{id}/featured",
            gated(post(feature::<Business>), Action::Moderate),
        )
}

fn classified_routes() -> Router<AppState> {
    Router::new()
        .route("/classifieds", get(list_public::<Classified>))
        .route(
            "/classifieds/submit",
            gated(post(create::<Classified>), Action::SubmitClassified),
        )
        .route("/classifieds/{id}", get(get_one::<Classified>))
        .route(
            "/admin/classifieds",
            gated(
                get(list_admin::<Classified>).post(admin_create::<Classified>),
                Action::Moderate,
            ),
        )
        .route(
            "/admin/classifieds/approve",
            gated(post(review::<Classified>), Action::Moderate),
        )
        .route(
            "/admin/classifieds/{id}",
            gated(
                put(update::<Classified>).delete(remove::<Classified>),
                Action::EditApproved,
            ),
        )
        .route(
            "/admin/classifieds/{id}/toggle",
            gated(post(toggle::<Classified>), Action::Moderate),
        )
}

fn enewspaper_routes() -> Router<AppState> {
    Router::new()
        .route("/enewspaper", get(list_public::<Enewspaper>))
        .route("/enewspaper/{id}", get(get_one::<Enewspaper>))
        .route(
            "/reporter/enewspaper",
            gated(
                get(list_mine::<Enewspaper>).post(create::<Enewspaper>),
                Action::AuthorNews,
            ),
        )
        .route(
            "/reporter/enewspaper/{id}",
            gated(
                put(update::<Enewspaper>).delete(remove::<Enewspaper>),
                Action::AuthorNews,
            ),
        )
        .route(
            "/admin/enewspaper",
            gated(
                get(list_admin::<Enewspaper>).post(admin_create::<Enewspaper>),
                Action::Moderate,
            ),
        )
        .route(
            "/admin/enewspaper/{id}",
            gated(delete(remove::<Enewspaper>), Action::Moderate),
        )
        .route(
            "/admin/enewspaper/{id}/approve",
            gated(put(approve::<Enewspaper>), Action::Moderate),
        )
        .route(
            "/admin/enewspaper/{id}/reject",
            gated(put(reject::<Enewspaper>), Action::Moderate),
        )
        .route(
            "/admin/enewspaper/{id}/toggle",
            gated(post(toggle::<Enewspaper>), Action::Moderate),
        )
}

fn breaking_news_routes() -> Router<AppState> {
    Router::new()
        .route("/breaking-news", get(list_public::<BreakingNews>))
        .route(
            "/reporter/breaking-news",
            gated(
                get(list_mine::<BreakingNews>).post(create::<BreakingNews>),
                Action::AuthorNews,
            ),
        )
        .route(
            "/reporter/breaking-news/{id}",
            gated(
                put(update::<BreakingNews>).delete(remove::<BreakingNews>),
                Action::AuthorNews,
            ),
        )
        .route(
            "/admin/breaking-news",
            gated(get(list_admin::<BreakingNews>), Action::Moderate),
        )
        .route(
            "/admin/breaking-news/{id}/approve",
            gated(put(approve::<BreakingNews>), Action::Moderate),
        )
        .route(
            "/admin/breaking-news/{id}/reject",
            gated(put(reject::<BreakingNews>), Action::Moderate),
        )
        .route(
            "/admin/breaking-news/{id}/toggle",
            gated(put(toggle::<BreakingNews>), Action::Moderate),
        )
}

fn ad_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/ads",
            get(list_public::<Advertisement>)
                .merge(gated(post(create::<Advertisement>), Action::SubmitAd)),
        )
        .route(
            "/ads/mine",
            gated(get(list_mine::<Advertisement>), Action::SubmitAd),
        )
        .route(
            "/ads/{id}",
            get(get_one::<Advertisement>).merge(gated(
                put(update::<Advertisement>).delete(remove::<Advertisement>),
                Action::SubmitAd,
            )),
        )
        .route(
            "/admin/ads",
            gated(
                get(list_admin::<Advertisement>).post(admin_create::<Advertisement>),
                Action::Moderate,
            ),
        )
        .route(
            "/admin/ads/approve",
            gated(post(review::<Advertisement>), Action::Moderate),
        )
        .route(
            "/admin/ads/{id}",
            gated(
                put(update::<Advertisement>).delete(remove::<Advertisement>),
                Action::EditApproved,
            ),
        )
        .route(
            "/admin/ads/{id}/toggle",
            gated(post(toggle::<Advertisement>), Action::Moderate),
        )
}

fn ticker_routes() -> Router<AppState> {
    Router::new()
        .route("/breaking-ticker", get(ticker::public_ticker))
        .route(
            "/reporter/breaking-ticker",
            gated(
                get(ticker::current_ticker).put(ticker::submit_ticker),
                Action::AuthorNews,
            ),
        )
        .route(
            "/admin/pending-ticker",
            gated(get(ticker::pending_ticker), Action::Moderate),
        )
        .route(
            "/admin/pending-ticker/approve",
            gated(put(ticker::approve_ticker), Action::Moderate),
        )
        .route(
            "/admin/pending-ticker/reject",
            gated(put(ticker::reject_ticker), Action::Moderate),
        )
        .route(
            "/admin/breaking-ticker",
            gated(get(ticker::current_ticker), Action::Administer),
        )
        .route(
            "/admin/breaking-ticker/toggle",
            gated(put(ticker::toggle_ticker), Action::Administer),
        )
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/admin/pending",
            gated(get(admin::pending_overview), Action::Moderate),
        )
        .route(
            "/admin/users/approve",
            gated(post(admin::decide_user), Action::Administer),
        )
        .route(
            "/admin/users/{id}/status",
            gated(put(admin::set_user_status), Action::Administer),
        )
        .route(
            "/admin/users/create-reporter",
            gated(post(admin::create_reporter), Action::Administer),
        )
        .route(
            "/admin/users/reporters",
            gated(get(admin::list_reporters), Action::Administer),
        )
        .route(
            "/admin/users/reporters/{id}",
            gated(delete(admin::delete_reporter), Action::Administer),
        )
}

/// `*` allows any origin without credentials; otherwise a comma list of
/// origins with credentials.
pub fn cors_layer(origins: &str) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if origins.trim() == "*" {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_headers(Any)
            .allow_methods(methods);
    }

    let allowed: Vec<HeaderValue> = origins
        .split(',')
        .filter_map(|origin| origin.trim().parse::<HeaderValue>().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods(methods)
}

pub fn create_router(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.env.cors_origins);

    Router::new()
        .route("/", get(root))
        .route("/seed-admin", post(seed_admin))
        .nest("/auth", auth_handler())
        .merge(category_handler())
        .merge(news_routes())
        .merge(business_routes())
        .merge(classified_routes())
        .merge(enewspaper_routes())
        .merge(breaking_news_routes())
        .merge(ad_routes())
        .merge(premium_ad_handler())
        .merge(inquiry_handler())
        .merge(ticker_routes())
        .merge(admin_routes())
        .fallback(route_not_found)
        .layer(middleware::from_fn_with_state(app_state.clone(), identify))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// The router with trailing slashes trimmed before matching.
pub fn create_app(app_state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(create_router(app_state))
}

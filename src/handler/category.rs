use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::instrument;
use validator::Validate;

use crate::{
    AppState, access::Action, db::CategoryExt, dtos::CategoryDto, error::HttpError,
    extract::ValidJson, middleware::gated,
};

/// Seeded alongside the super-admin when no categories exist yet.
pub const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("City", "city", "City news and updates"),
    ("Politics", "politics", "Political news"),
    ("Crime", "crime", "Crime reports"),
    ("Sports", "sports", "Sports news"),
    ("Education", "education", "Education news"),
    ("Entertainment", "entertainment", "Entertainment news"),
    ("Jobs", "jobs", "Job opportunities"),
];

pub fn category_handler() -> Router<AppState> {
    Router::new().route(
        "/categories",
        get(list_categories).merge(gated(post(create_category), Action::Administer)),
    )
}

/// Lower-case the name and join words with `-`.
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

pub async fn list_categories(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let categories = app_state.db_client.list_categories(true).await?;
    Ok(Json(categories))
}

#[instrument(skip(app_state, body), fields(name = %body.name))]
pub async fn create_category(
    State(app_state): State<AppState>,
    ValidJson(body): ValidJson<CategoryDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    let slug = body
        .slug
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| slugify(&body.name));

    let category = app_state
        .db_client
        .create_category(body.name.trim(), &slug, body.description.clone())
        .await?;

    tracing::info!(id = %category.id, slug = %category.slug, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_from_name() {
        assert_eq!(slugify("Local  Sports News"), "local-sports-news");
        assert_eq!(slugify("City"), "city");
    }
}

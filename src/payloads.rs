//! Kind-specific fields of moderated content.
//!
//! Each payload validates its own required fields. Partial updates arrive as
//! the matching `*Patch` type and are merged before validation runs again, so
//! an edit can never leave a row in a state its create would have refused.

use std::borrow::Cow;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use validator::{Validate, ValidationError};

use crate::models::{ContentKind, ContentPayload};

pub const MIN_CLASSIFIED_IMAGES: usize = 1;
pub const MAX_CLASSIFIED_IMAGES: usize = 8;

/// A payload type that the content engine can store under its kind.
pub trait Payload: Serialize + DeserializeOwned + Validate + Clone + Send + Sync + 'static {
    const KIND: ContentKind;

    type Patch: DeserializeOwned + Clone + Send + Sync + 'static;

    fn apply_patch(&mut self, patch: Self::Patch);

    fn wrap(self) -> ContentPayload;

    fn unwrap(payload: &ContentPayload) -> Option<&Self>;

    /// Drop flags only the super-admin may set.
    fn reset_admin_flags(&mut self) {}
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn set_opt<T>(target: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *target = value;
    }
}

// ============================================================================
// News
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct News {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Category is required"))]
    pub category_id: String,
    #[serde(default)]
    pub city: String,
    #[serde(default = "default_genre")]
    pub genre: String,
    pub main_image: Option<String>,
    #[serde(default)]
    pub gallery_images: Vec<String>,
    pub video_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub meta_description: Option<String>,
    pub author_name: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

fn default_genre() -> String {
    "breaking".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category_id: Option<String>,
    pub city: Option<String>,
    pub genre: Option<String>,
    pub main_image: Option<String>,
    pub gallery_images: Option<Vec<String>>,
    pub video_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub meta_description: Option<String>,
    pub author_name: Option<String>,
}

impl Payload for News {
    const KIND: ContentKind = ContentKind::News;
    type Patch = NewsPatch;

    fn apply_patch(&mut self, patch: NewsPatch) {
        set(&mut self.title, patch.title);
        set(&mut self.content, patch.content);
        set(&mut self.category_id, patch.category_id);
        set(&mut self.city, patch.city);
        set(&mut self.genre, patch.genre);
        set_opt(&mut self.main_image, patch.main_image);
        set(&mut self.gallery_images, patch.gallery_images);
        set_opt(&mut self.video_url, patch.video_url);
        set(&mut self.tags, patch.tags);
        set_opt(&mut self.meta_description, patch.meta_description);
        set_opt(&mut self.author_name, patch.author_name);
    }

    fn wrap(self) -> ContentPayload {
        ContentPayload::News(self)
    }

    fn unwrap(payload: &ContentPayload) -> Option<&Self> {
        match payload {
            ContentPayload::News(news) => Some(news),
            _ => None,
        }
    }

    fn reset_admin_flags(&mut self) {
        self.featured = false;
    }
}

// ============================================================================
// Business listing
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    #[serde(default)]
    #[validate(length(min = 1, message = "Business name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Business category is required"))]
    pub category: String,
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub area: Option<String>,
    pub google_maps_link: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub area: Option<String>,
    pub google_maps_link: Option<String>,
}

impl Payload for Business {
    const KIND: ContentKind = ContentKind::Business;
    type Patch = BusinessPatch;

    fn apply_patch(&mut self, patch: BusinessPatch) {
        set(&mut self.name, patch.name);
        set(&mut self.category, patch.category);
        set_opt(&mut self.description, patch.description);
        set(&mut self.images, patch.images);
        set_opt(&mut self.phone, patch.phone);
        set_opt(&mut self.whatsapp, patch.whatsapp);
        set_opt(&mut self.website, patch.website);
        set_opt(&mut self.address, patch.address);
        set_opt(&mut self.area, patch.area);
        set_opt(&mut self.google_maps_link, patch.google_maps_link);
    }

    fn wrap(self) -> ContentPayload {
        ContentPayload::Business(self)
    }

    fn unwrap(payload: &ContentPayload) -> Option<&Self> {
        match payload {
            ContentPayload::Business(business) => Some(business),
            _ => None,
        }
    }

    fn reset_admin_flags(&mut self) {
        self.featured = false;
    }
}

// ============================================================================
// Classified
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Classified {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
    #[serde(default)]
    #[validate(custom(function = "validate_image_count"))]
    pub images: Vec<String>,
    pub price: Option<String>,
    #[serde(default = "default_classified_category")]
    pub category: String,
    #[serde(default)]
    pub whatsapp_enabled: bool,
    pub seller_name: Option<String>,
    pub condition: Option<String>,
}

fn default_classified_category() -> String {
    "User Submitted".to_string()
}

fn validate_image_count(images: &Vec<String>) -> Result<(), ValidationError> {
    let count = images.iter().filter(|url| !url.trim().is_empty()).count();
    if count < MIN_CLASSIFIED_IMAGES {
        return Err(ValidationError::new("images_min")
            .with_message(Cow::Borrowed("Minimum 1 image required")));
    }
    if count > MAX_CLASSIFIED_IMAGES {
        return Err(ValidationError::new("images_max")
            .with_message(Cow::Borrowed("Maximum 8 images allowed")));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub images: Option<Vec<String>>,
    pub price: Option<String>,
    pub category: Option<String>,
    pub whatsapp_enabled: Option<bool>,
    pub seller_name: Option<String>,
    pub condition: Option<String>,
}

impl Payload for Classified {
    const KIND: ContentKind = ContentKind::Classified;
    type Patch = ClassifiedPatch;

    fn apply_patch(&mut self, patch: ClassifiedPatch) {
        set(&mut self.title, patch.title);
        set(&mut self.description, patch.description);
        set(&mut self.location, patch.location);
        set(&mut self.phone, patch.phone);
        set(&mut self.images, patch.images);
        set_opt(&mut self.price, patch.price);
        set(&mut self.category, patch.category);
        set(&mut self.whatsapp_enabled, patch.whatsapp_enabled);
        set_opt(&mut self.seller_name, patch.seller_name);
        set_opt(&mut self.condition, patch.condition);
    }

    fn wrap(self) -> ContentPayload {
        ContentPayload::Classified(self)
    }

    fn unwrap(payload: &ContentPayload) -> Option<&Self> {
        match payload {
            ContentPayload::Classified(classified) => Some(classified),
            _ => None,
        }
    }
}

// ============================================================================
// E-newspaper edition
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Enewspaper {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Edition date is required"))]
    pub edition_date: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "PDF URL is required"))]
    pub pdf_url: String,
    pub thumbnail_url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnewspaperPatch {
    pub title: Option<String>,
    pub edition_date: Option<String>,
    pub pdf_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub description: Option<String>,
}

impl Payload for Enewspaper {
    const KIND: ContentKind = ContentKind::Enewspaper;
    type Patch = EnewspaperPatch;

    fn apply_patch(&mut self, patch: EnewspaperPatch) {
        set(&mut self.title, patch.title);
        set(&mut self.edition_date, patch.edition_date);
        set(&mut self.pdf_url, patch.pdf_url);
        set_opt(&mut self.thumbnail_url, patch.thumbnail_url);
        set_opt(&mut self.description, patch.description);
    }

    fn wrap(self) -> ContentPayload {
        ContentPayload::Enewspaper(self)
    }

    fn unwrap(payload: &ContentPayload) -> Option<&Self> {
        match payload {
            ContentPayload::Enewspaper(paper) => Some(paper),
            _ => None,
        }
    }
}

// ============================================================================
// Breaking news entry
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BreakingNews {
    #[serde(default)]
    #[validate(length(min = 1, message = "Breaking news text is required"))]
    pub text: String,
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_priority() -> i32 {
    10
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakingNewsPatch {
    pub text: Option<String>,
    pub priority: Option<i32>,
}

impl Payload for BreakingNews {
    const KIND: ContentKind = ContentKind::BreakingNews;
    type Patch = BreakingNewsPatch;

    fn apply_patch(&mut self, patch: BreakingNewsPatch) {
        set(&mut self.text, patch.text);
        set(&mut self.priority, patch.priority);
    }

    fn wrap(self) -> ContentPayload {
        ContentPayload::BreakingNews(self)
    }

    fn unwrap(payload: &ContentPayload) -> Option<&Self> {
        match payload {
            ContentPayload::BreakingNews(entry) => Some(entry),
            _ => None,
        }
    }
}

// ============================================================================
// Advertisement
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Advertisement {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Image URL is required"))]
    pub image_url: String,
    pub link_url: Option<String>,
    /// Where the banner runs; doubles as the list filter category.
    #[serde(default = "default_placement")]
    pub placement: String,
    pub business_name: Option<String>,
    pub description: Option<String>,
}

fn default_placement() -> String {
    "sidebar".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvertisementPatch {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub placement: Option<String>,
    pub business_name: Option<String>,
    pub description: Option<String>,
}

impl Payload for Advertisement {
    const KIND: ContentKind = ContentKind::Advertisement;
    type Patch = AdvertisementPatch;

    fn apply_patch(&mut self, patch: AdvertisementPatch) {
        set(&mut self.title, patch.title);
        set(&mut self.image_url, patch.image_url);
        set_opt(&mut self.link_url, patch.link_url);
        set(&mut self.placement, patch.placement);
        set_opt(&mut self.business_name, patch.business_name);
        set_opt(&mut self.description, patch.description);
    }

    fn wrap(self) -> ContentPayload {
        ContentPayload::Advertisement(self)
    }

    fn unwrap(payload: &ContentPayload) -> Option<&Self> {
        match payload {
            ContentPayload::Advertisement(ad) => Some(ad),
            _ => None,
        }
    }
}

impl ContentPayload {
    /// Flip the featured flag. `None` for kinds that have no such flag.
    pub fn toggle_featured(&mut self) -> Option<bool> {
        let featured = match self {
            ContentPayload::News(news) => &mut news.featured,
            ContentPayload::Business(business) => &mut business.featured,
            _ => return None,
        };
        *featured = !*featured;
        Some(*featured)
    }
}

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{BreakingTicker, Category, ContentItem, Inquiry, PremiumAd, User};

/// In-process tables behind `DBClient::in_memory`.
///
/// Each table has its own lock. No operation holds two locks at once.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub(super) users: RwLock<HashMap<Uuid, User>>,
    pub(super) items: RwLock<HashMap<Uuid, ContentItem>>,
    pub(super) ticker: RwLock<Option<BreakingTicker>>,
    pub(super) categories: RwLock<Vec<Category>>,
    pub(super) premium_ad: RwLock<Option<PremiumAd>>,
    pub(super) inquiries: RwLock<Vec<Inquiry>>,
}

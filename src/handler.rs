pub mod admin;
pub mod auth;
pub mod category;
pub mod content;
pub mod inquiry;
pub mod premium;
pub mod ticker;

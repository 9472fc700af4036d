//! Public request forms: reporter applications and business promotions.
//!
//! These are not moderated content. Nothing is published from them; the
//! admin reads the queue, follows up by phone or email and records the
//! outcome as an `InquiryStatus` with a note.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use validator::Validate;

use crate::models::{InquiryForm, InquiryKind};

/// A form type that can be stored in the inquiry queue.
pub trait Form: DeserializeOwned + Validate + Send + 'static {
    const KIND: InquiryKind;

    /// Trim every field and lower-case the email.
    fn normalize(&mut self);

    fn wrap(self) -> InquiryForm;
}

/// Static facts about one queue, used for response keys and messages.
#[derive(Debug, Clone, Copy)]
pub struct QueueDescriptor {
    /// Key of the list in responses (`{"applications": [...]}`).
    pub collection: &'static str,
    /// "Application" / "Request".
    pub label: &'static str,
    pub submitted: &'static str,
}

pub fn queue(kind: InquiryKind) -> &'static QueueDescriptor {
    const APPLICATIONS: QueueDescriptor = QueueDescriptor {
        collection: "applications",
        label: "Application",
        submitted: "Application submitted successfully",
    };
    const PROMOTIONS: QueueDescriptor = QueueDescriptor {
        collection: "promotions",
        label: "Request",
        submitted: "Promotion request submitted successfully",
    };
    match kind {
        InquiryKind::ReporterApplication => &APPLICATIONS,
        InquiryKind::BusinessPromotion => &PROMOTIONS,
    }
}

fn trim(value: &mut String) {
    *value = value.trim().to_string();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReporterApplication {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name, phone, and email are required"))]
    pub full_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Name, phone, and email are required"))]
    pub phone: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Name, phone, and email are required"))]
    pub email: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub portfolio: String,
    #[serde(default)]
    pub reason: String,
}

impl Form for ReporterApplication {
    const KIND: InquiryKind = InquiryKind::ReporterApplication;

    fn normalize(&mut self) {
        for field in [
            &mut self.full_name,
            &mut self.phone,
            &mut self.email,
            &mut self.experience,
            &mut self.portfolio,
            &mut self.reason,
        ] {
            trim(field);
        }
        self.email = self.email.to_lowercase();
    }

    fn wrap(self) -> InquiryForm {
        InquiryForm::ReporterApplication(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BusinessPromotion {
    #[serde(default)]
    #[validate(length(min = 1, message = "All fields are required"))]
    pub business_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "All fields are required"))]
    pub owner_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "All fields are required"))]
    pub phone: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "All fields are required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "All fields are required"))]
    pub address: String,
    #[serde(default)]
    pub description: String,
}

impl Form for BusinessPromotion {
    const KIND: InquiryKind = InquiryKind::BusinessPromotion;

    fn normalize(&mut self) {
        for field in [
            &mut self.business_name,
            &mut self.owner_name,
            &mut self.phone,
            &mut self.email,
            &mut self.address,
            &mut self.description,
        ] {
            trim(field);
        }
        self.email = self.email.to_lowercase();
    }

    fn wrap(self) -> InquiryForm {
        InquiryForm::BusinessPromotion(self)
    }
}

use std::collections::HashSet;

use super::SubmitIntent;
use crate::models::ContentKind;

/// Static facts about one content kind.
#[derive(Debug, Clone, Copy)]
pub struct KindDescriptor {
    pub kind: ContentKind,
    /// Human label used in messages ("Article not found").
    pub label: &'static str,
    /// Key of the list in responses (`{"articles": [...]}`).
    pub collection: &'static str,
    /// Intent used when the body carries no `status`.
    pub default_intent: SubmitIntent,
    pub default_page_size: u32,
}

const NEWS: KindDescriptor = KindDescriptor {
    kind: ContentKind::News,
    label: "Article",
    collection: "articles",
    default_intent: SubmitIntent::Draft,
    default_page_size: 20,
};

const BUSINESS: KindDescriptor = KindDescriptor {
    kind: ContentKind::Business,
    label: "Business",
    collection: "businesses",
    default_intent: SubmitIntent::Submit,
    default_page_size: 20,
};

const CLASSIFIED: KindDescriptor = KindDescriptor {
    kind: ContentKind::Classified,
    label: "Classified",
    collection: "classifieds",
    default_intent: SubmitIntent::Submit,
    default_page_size: 20,
};

const ENEWSPAPER: KindDescriptor = KindDescriptor {
    kind: ContentKind::Enewspaper,
    label: "E-newspaper",
    collection: "papers",
    default_intent: SubmitIntent::Submit,
    default_page_size: 10,
};

const BREAKING_NEWS: KindDescriptor = KindDescriptor {
    kind: ContentKind::BreakingNews,
    label: "Breaking news",
    collection: "items",
    default_intent: SubmitIntent::Submit,
    default_page_size: 50,
};

const ADVERTISEMENT: KindDescriptor = KindDescriptor {
    kind: ContentKind::Advertisement,
    label: "Advertisement",
    collection: "ads",
    default_intent: SubmitIntent::Submit,
    default_page_size: 20,
};

pub fn descriptor(kind: ContentKind) -> &'static KindDescriptor {
    match kind {
        ContentKind::News => &NEWS,
        ContentKind::Business => &BUSINESS,
        ContentKind::Classified => &CLASSIFIED,
        ContentKind::Enewspaper => &ENEWSPAPER,
        ContentKind::BreakingNews => &BREAKING_NEWS,
        ContentKind::Advertisement => &ADVERTISEMENT,
    }
}

/// How a kind treats approval of something already approved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApprovalPolicy {
    pub restamp_on_reapprove: bool,
}

/// Per-kind approval policies, built from configuration.
#[derive(Debug, Clone, Default)]
pub struct ApprovalPolicies {
    restamp: HashSet<ContentKind>,
}

impl ApprovalPolicies {
    pub fn new(restamp: HashSet<ContentKind>) -> Self {
        ApprovalPolicies { restamp }
    }

    pub fn for_kind(&self, kind: ContentKind) -> ApprovalPolicy {
        ApprovalPolicy {
            restamp_on_reapprove: self.restamp.contains(&kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_descriptor() {
        for kind in ContentKind::ALL {
            assert_eq!(descriptor(kind).kind, kind);
        }
    }

    #[test]
    fn news_defaults_to_draft() {
        assert_eq!(descriptor(ContentKind::News).default_intent, SubmitIntent::Draft);
        assert_eq!(
            descriptor(ContentKind::Classified).default_intent,
            SubmitIntent::Submit
        );
    }

    #[test]
    fn policies_default_to_single_stamp() {
        let policies = ApprovalPolicies::new([ContentKind::News].into_iter().collect());
        assert!(policies.for_kind(ContentKind::News).restamp_on_reapprove);
        assert!(!policies.for_kind(ContentKind::Business).restamp_on_reapprove);
    }
}

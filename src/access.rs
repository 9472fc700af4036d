//! Role rules for every gated action.
//!
//! Everything here is a pure function of the caller identity. The router
//! attaches one `Action` per protected route and `middleware::authorize`
//! consults `permits` before the handler runs.

use crate::models::{Identity, UserRole};

/// Privileged operations that a route can be gated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Create or edit own news, e-newspapers, breaking entries and ticker text.
    AuthorNews,
    /// Create or edit own business listings.
    SubmitListing,
    /// Post a classified. Open to anonymous callers.
    SubmitClassified,
    /// Create or edit own advertisements.
    SubmitAd,
    /// Approve, reject, toggle or feature any content.
    Moderate,
    /// Categories, reporter accounts, user status, ticker toggling.
    Administer,
    /// Edit an item that is already approved.
    EditApproved,
    /// Register an account with the given role.
    SelfRegister(UserRole),
    /// Any signed-in account.
    Authenticated,
}

/// Who may perform an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Anyone,
    AnySignedIn,
    Roles(&'static [UserRole]),
    Nobody,
}

const AUTHORS: &[UserRole] = &[UserRole::Reporter, UserRole::SuperAdmin];
const LISTERS: &[UserRole] = &[
    UserRole::Registered,
    UserRole::Reporter,
    UserRole::Advertiser,
    UserRole::SuperAdmin,
];
const ADVERTISERS: &[UserRole] = &[UserRole::Advertiser, UserRole::SuperAdmin];
const ADMIN_ONLY: &[UserRole] = &[UserRole::SuperAdmin];

pub fn allowed_roles(action: Action) -> Audience {
    match action {
        Action::AuthorNews => Audience::Roles(AUTHORS),
        Action::SubmitListing => Audience::Roles(LISTERS),
        Action::SubmitClassified => Audience::Anyone,
        Action::SubmitAd => Audience::Roles(ADVERTISERS),
        Action::Moderate | Action::Administer | Action::EditApproved => {
            Audience::Roles(ADMIN_ONLY)
        }
        Action::SelfRegister(UserRole::SuperAdmin) => Audience::Nobody,
        Action::SelfRegister(_) => Audience::Anyone,
        Action::Authenticated => Audience::AnySignedIn,
    }
}

pub fn is_super_admin(identity: Option<&Identity>) -> bool {
    has_any_role(identity, ADMIN_ONLY)
}

pub fn has_any_role(identity: Option<&Identity>, roles: &[UserRole]) -> bool {
    identity.is_some_and(|id| roles.contains(&id.role))
}

pub fn permits(identity: Option<&Identity>, action: Action) -> bool {
    match allowed_roles(action) {
        Audience::Anyone => true,
        Audience::AnySignedIn => identity.is_some(),
        Audience::Roles(roles) => has_any_role(identity, roles),
        Audience::Nobody => false,
    }
}

/// Owner of the row, or the super-admin.
pub fn owns_or_admin(identity: Option<&Identity>, owner_id: Option<uuid::Uuid>) -> bool {
    match identity {
        Some(id) => id.role == UserRole::SuperAdmin || owner_id == Some(id.user_id),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn as_role(role: UserRole) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            email: format!("{}@x.com", role.to_str()),
            role,
            must_change_password: false,
        }
    }

    const ALL_ROLES: [UserRole; 4] = [
        UserRole::Registered,
        UserRole::Reporter,
        UserRole::Advertiser,
        UserRole::SuperAdmin,
    ];

    fn allowed(action: Action) -> Vec<UserRole> {
        ALL_ROLES
            .into_iter()
            .filter(|role| permits(Some(&as_role(*role)), action))
            .collect()
    }

    #[test]
    fn news_authoring_is_reporter_or_admin() {
        assert_eq!(
            allowed(Action::AuthorNews),
            vec![UserRole::Reporter, UserRole::SuperAdmin]
        );
        assert!(!permits(None, Action::AuthorNews));
    }

    #[test]
    fn moderation_and_admin_actions_are_super_admin_only() {
        for action in [Action::Moderate, Action::Administer, Action::EditApproved] {
            assert_eq!(allowed(action), vec![UserRole::SuperAdmin]);
            assert!(!permits(None, action));
        }
    }

    #[test]
    fn ads_are_advertiser_or_admin() {
        assert_eq!(
            allowed(Action::SubmitAd),
            vec![UserRole::Advertiser, UserRole::SuperAdmin]
        );
        assert!(!permits(None, Action::SubmitAd));
    }

    #[test]
    fn classifieds_accept_anonymous() {
        assert!(permits(None, Action::SubmitClassified));
        assert_eq!(allowed(Action::SubmitClassified), ALL_ROLES.to_vec());
    }

    #[test]
    fn nobody_self_registers_as_super_admin() {
        let register_admin = Action::SelfRegister(UserRole::SuperAdmin);
        assert!(!permits(None, register_admin));
        assert!(allowed(register_admin).is_empty());
        assert!(permits(None, Action::SelfRegister(UserRole::Reporter)));
    }

    #[test]
    fn listings_need_a_signed_in_user() {
        assert!(!permits(None, Action::SubmitListing));
        assert_eq!(allowed(Action::SubmitListing), ALL_ROLES.to_vec());
    }

    #[test]
    fn ownership_check() {
        let reporter = as_role(UserRole::Reporter);
        let admin = as_role(UserRole::SuperAdmin);
        assert!(owns_or_admin(Some(&reporter), Some(reporter.user_id)));
        assert!(!owns_or_admin(Some(&reporter), Some(Uuid::new_v4())));
        assert!(!owns_or_admin(Some(&reporter), None));
        assert!(owns_or_admin(Some(&admin), None));
        assert!(!owns_or_admin(None, None));
        assert!(is_super_admin(Some(&admin)));
        assert!(!is_super_admin(None));
    }
}

use std::collections::HashSet;

use crate::models::{Role, User};

/// Something an identity can provide and a permission can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Need {
    User(i64),
    Role(Role),
}

// Identity - what the authenticated principal provides
#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub user_id: Option<i64>,
    provides: HashSet<Need>,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user: &User) -> Self {
        let mut provides = HashSet::new();
        provides.insert(Need::User(user.id));
        provides.insert(Need::Role(user.role));
        Self {
            user_id: Some(user.id),
            provides,
        }
    }

    pub fn provides(&self, need: &Need) -> bool {
        self.provides.contains(need)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.provides(&Need::Role(role))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("permission denied")]
pub struct PermissionDenied;

// Permission - satisfied by any one of its needs
#[derive(Debug, Clone, Default)]
pub struct Permission {
    needs: HashSet<Need>,
}

impl Permission {
    pub fn new(needs: impl IntoIterator<Item = Need>) -> Self {
        Self {
            needs: needs.into_iter().collect(),
        }
    }

    pub fn roles(roles: &[Role]) -> Self {
        Self::new(roles.iter().copied().map(Need::Role))
    }

    pub fn union(&self, other: &Permission) -> Self {
        Self {
            needs: self.needs.union(&other.needs).copied().collect(),
        }
    }

    /// An empty permission allows everyone.
    pub fn allows(&self, identity: &Identity) -> bool {
        self.needs.is_empty() || self.needs.iter().any(|need| identity.provides(need))
    }

    pub fn require(&self, identity: &Identity) -> Result<(), PermissionDenied> {
        if self.allows(identity) {
            Ok(())
        } else {
            Err(PermissionDenied)
        }
    }
}

/// Named permissions used by the route handlers.
pub mod permissions {
    use super::Permission;
    use crate::models::Role;

    pub fn admin() -> Permission {
        Permission::roles(&[Role::Admin])
    }

    pub fn order_creators() -> Permission {
        Permission::roles(&[Role::Admin, Role::Customer])
    }

    pub fn courier_or_admin() -> Permission {
        Permission::roles(&[Role::Admin, Role::Courier])
    }

    pub fn stock_managers() -> Permission {
        Permission::roles(&[Role::Admin, Role::Supplier])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: i64, role: Role) -> User {
        User {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            password_hash: String::new(),
            role,
            active: true,
            created_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn identity_provides_user_and_role_needs() {
        let identity = Identity::for_user(&user(7, Role::Courier));
        assert!(identity.provides(&Need::User(7)));
        assert!(identity.has_role(Role::Courier));
        assert!(!identity.has_role(Role::Admin));
        assert!(!identity.provides(&Need::User(8)));
    }

    #[test]
    fn permission_needs_any_one_match() {
        let courier = Identity::for_user(&user(1, Role::Courier));
        let customer = Identity::for_user(&user(2, Role::Customer));
        let admin = Identity::for_user(&user(3, Role::Admin));

        let permission = permissions::courier_or_admin();
        assert!(permission.allows(&courier));
        assert!(permission.allows(&admin));
        assert!(!permission.allows(&customer));
        assert!(permission.require(&customer).is_err());
    }

    #[test]
    fn anonymous_identity_only_passes_empty_permissions() {
        let anonymous = Identity::anonymous();
        assert!(Permission::default().allows(&anonymous));
        assert!(!permissions::admin().allows(&anonymous));
    }

    #[test]
    fn union_combines_needs() {
        let owner = Permission::new([Need::User(42)]);
        let either = owner.union(&permissions::admin());

        assert!(either.allows(&Identity::for_user(&user(42, Role::Customer))));
        assert!(either.allows(&Identity::for_user(&user(1, Role::Admin))));
        assert!(!either.allows(&Identity::for_user(&user(5, Role::Customer))));
    }
}

//! Procedure access rules.
//!
//! A `Guard` is attached to a group of routes; the check itself only needs the
//! caller's role, so it is independent of how the caller was identified.

use crate::types::Role;

pub const ADMIN_ONLY: &[Role] = &[Role::Admin];
pub const KITCHEN_STAFF: &[Role] = &[Role::Admin, Role::Kitchen];
pub const ALL_STAFF: &[Role] = &[Role::Admin, Role::Kitchen, Role::Waiter, Role::Cashier];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Any signed-in user, customers included.
    Authed,
    /// Signed-in user whose role is in the set.
    Roles(&'static [Role]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardError {
    Unauthenticated,
    Forbidden,
}

impl Guard {
    pub fn check(&self, role: Option<Role>) -> Result<(), GuardError> {
        let role = role.ok_or(GuardError::Unauthenticated)?;
        match self {
            Guard::Authed => Ok(()),
            Guard::Roles(allowed) if allowed.contains(&role) => Ok(()),
            Guard::Roles(_) => Err(GuardError::Forbidden),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_caller_is_unauthenticated_everywhere() {
        assert_eq!(Guard::Authed.check(None), Err(GuardError::Unauthenticated));
        assert_eq!(Guard::Roles(ALL_STAFF).check(None), Err(GuardError::Unauthenticated));
    }

    #[test]
    fn authed_accepts_customers() {
        assert_eq!(Guard::Authed.check(Some(Role::Customer)), Ok(()));
    }

    #[test]
    fn role_sets_match_staff_tiers() {
        let kitchen = Guard::Roles(KITCHEN_STAFF);
        assert_eq!(kitchen.check(Some(Role::Kitchen)), Ok(()));
        assert_eq!(kitchen.check(Some(Role::Admin)), Ok(()));
        assert_eq!(kitchen.check(Some(Role::Waiter)), Err(GuardError::Forbidden));

        let admin = Guard::Roles(ADMIN_ONLY);
        assert_eq!(admin.check(Some(Role::Cashier)), Err(GuardError::Forbidden));

        let staff = Guard::Roles(ALL_STAFF);
        for role in Role::ALL {
            let expected = if role.is_staff() { Ok(()) } else { Err(GuardError::Forbidden) };
            assert_eq!(staff.check(Some(*role)), expected);
        }
    }
}

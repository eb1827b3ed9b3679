//! RBAC roles and gates.
//!
//! The role set is fixed (this is a single-shop POS, not a policy engine):
//! `admin` administers everything, `manager` runs the back office, `cashier`
//! operates the register, `viewer` reads reports.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Cashier,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Cashier => "cashier",
            Role::Viewer => "viewer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "cashier" => Some(Role::Cashier),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: requires one of {required:?}")]
    Forbidden { required: Vec<Role> },
}

/// Gate a request on the caller's roles: passes when any held role is in the
/// allowed set.
pub fn require_role(held: &[Role], allowed: &[Role]) -> Result<(), AuthzError> {
    if held.iter().any(|r| allowed.contains(r)) {
        return Ok(());
    }
    Err(AuthzError::Forbidden {
        required: allowed.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_matching_role_passes() {
        assert!(require_role(&[Role::Cashier, Role::Viewer], &[Role::Admin, Role::Cashier]).is_ok());
    }

    #[test]
    fn no_matching_role_is_forbidden() {
        let err = require_role(&[Role::Viewer], &[Role::Admin, Role::Manager]).unwrap_err();
        assert!(matches!(err, AuthzError::Forbidden { .. }));
    }

    #[test]
    fn empty_roles_are_forbidden() {
        assert!(require_role(&[], &[Role::Admin]).is_err());
    }

    #[test]
    fn parse_round_trips() {
        for role in [Role::Admin, Role::Manager, Role::Cashier, Role::Viewer] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("root"), None);
    }
}

//! The four-tier role hierarchy.
//!
//! Roles are a flat ordinal scale, not a capability lattice: every "can X act
//! on Y" question reduces to an integer comparison on [`Role::level`]. The
//! string forms match the CHECK constraint on `users.role`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_USER: &str = "user";
pub const ROLE_MODERATOR: &str = "moderator";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_SUPER_ADMIN: &str = "super_admin";

/// All valid role names, lowest rank first.
pub const VALID_ROLES: &[&str] = &[ROLE_USER, ROLE_MODERATOR, ROLE_ADMIN, ROLE_SUPER_ADMIN];

// ---------------------------------------------------------------------------
// Role enum
// ---------------------------------------------------------------------------

/// Account role, ordered by rank.
///
/// Derived `Ord` follows declaration order, so `Role::Admin > Role::Moderator`
/// holds without any extra machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User = 0,
    Moderator = 1,
    Admin = 2,
    SuperAdmin = 3,
}

impl Role {
    /// Ordinal rank used for outranking comparisons.
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Database string form, matching the `ck_users_role` constraint.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => ROLE_USER,
            Self::Moderator => ROLE_MODERATOR,
            Self::Admin => ROLE_ADMIN,
            Self::SuperAdmin => ROLE_SUPER_ADMIN,
        }
    }

    /// Parse a stored role string.
    ///
    /// Fails with `Validation` for anything outside [`VALID_ROLES`]; rows that
    /// violate this never pass the database CHECK constraint in the first
    /// place, so a parse failure indicates operator error, not user input.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            ROLE_USER => Ok(Self::User),
            ROLE_MODERATOR => Ok(Self::Moderator),
            ROLE_ADMIN => Ok(Self::Admin),
            ROLE_SUPER_ADMIN => Ok(Self::SuperAdmin),
            other => Err(CoreError::Validation(format!(
                "Invalid role '{other}'. Must be one of: {}",
                VALID_ROLES.join(", ")
            ))),
        }
    }

    /// Moderator or above.
    pub fn is_staff(self) -> bool {
        self >= Self::Moderator
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_rank() {
        assert!(Role::User < Role::Moderator);
        assert!(Role::Moderator < Role::Admin);
        assert!(Role::Admin < Role::SuperAdmin);
    }

    #[test]
    fn levels_are_contiguous_from_zero() {
        assert_eq!(Role::User.level(), 0);
        assert_eq!(Role::Moderator.level(), 1);
        assert_eq!(Role::Admin.level(), 2);
        assert_eq!(Role::SuperAdmin.level(), 3);
    }

    #[test]
    fn parse_round_trips_every_role() {
        for name in VALID_ROLES {
            let role = Role::parse(name).unwrap();
            assert_eq!(role.as_str(), *name);
        }
    }

    #[test]
    fn parse_rejects_unknown_role() {
        assert!(Role::parse("root").is_err());
        assert!(Role::parse("").is_err());
        assert!(Role::parse("Admin").is_err());
    }

    #[test]
    fn staff_starts_at_moderator() {
        assert!(!Role::User.is_staff());
        assert!(Role::Moderator.is_staff());
        assert!(Role::Admin.is_staff());
        assert!(Role::SuperAdmin.is_staff());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::SuperAdmin).unwrap();
        assert_eq!(json, "\"super_admin\"");
        let back: Role = serde_json::from_str("\"moderator\"").unwrap();
        assert_eq!(back, Role::Moderator);
    }
}

//! Roles carried in tokens.
//!
//! # Invariants
//! - The role set is closed: guest, admin, superuser.
//! - Each role has exactly one single-character code. `code` and `from_code`
//!   are inverses; `ROLE_CODES` lists every pair and the tests hold both
//!   directions to it.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Mapping between roles and their single-character token codes.
const ROLE_CODES: [(Role, char); 3] = [
    (Role::Guest, 'g'),
    (Role::Admin, 'a'),
    (Role::Superuser, 's'),
];

/// A user's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Guest,
    Admin,
    Superuser,
}

impl Role {
    /// The single-character code stored in a token payload.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Guest => 'g',
            Self::Admin => 'a',
            Self::Superuser => 's',
        }
    }

    /// Expand a token code to a role. Returns `None` for unknown codes.
    #[must_use]
    pub fn from_code(code: char) -> Option<Self> {
        ROLE_CODES
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(role, _)| *role)
    }

    /// The full role name used in authorization checks and API responses.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Admin => "admin",
            Self::Superuser => "superuser",
        }
    }

    /// Whether this role may use the admin back-office.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Admin | Self::Superuser)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.code())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = char::deserialize(deserializer)?;
        Self::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown role code '{code}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        for (i, (_, a)) in ROLE_CODES.iter().enumerate() {
            for (_, b) in &ROLE_CODES[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_code_lookup_matches_table() {
        for (role, code) in ROLE_CODES {
            assert_eq!(role.code(), code);
            assert_eq!(Role::from_code(code), Some(role));
        }
    }

    #[test]
    fn test_every_role_roundtrips_through_its_code() {
        for role in [Role::Guest, Role::Admin, Role::Superuser] {
            assert_eq!(Role::from_code(role.code()), Some(role));
        }
        assert_eq!(Role::Superuser.code(), 's');
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(Role::from_code('x'), None);
        assert_eq!(Role::from_code('A'), None);
    }

    #[test]
    fn test_serializes_as_single_char() {
        let json = serde_json::to_string(&Role::Admin).expect("serialize role");
        assert_eq!(json, "\"a\"");

        let role: Role = serde_json::from_str("\"s\"").expect("deserialize role");
        assert_eq!(role, Role::Superuser);

        assert!(serde_json::from_str::<Role>("\"admin\"").is_err());
    }

    #[test]
    fn test_names() {
        assert_eq!(Role::Guest.to_string(), "guest");
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(Role::Superuser.to_string(), "superuser");
        assert!(!Role::Guest.is_staff());
        assert!(Role::Admin.is_staff());
        assert!(Role::Superuser.is_staff());
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles for authorization.
///
/// ## Role Hierarchy
///
/// - `Admin` - Publishes chapters, grants currency, manages images
/// - `Editor` - Manages images
/// - `Reader` - Reads and unlocks chapters (every authenticated user)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Reader,
}

impl Role {
    fn rank(self) -> u8 {
        match self {
            Role::Admin => 2,
            Role::Editor => 1,
            Role::Reader => 0,
        }
    }

    /// Check if this role has at least the privileges of the required role.
    pub fn has_privilege(&self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    /// Parse role from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "editor" => Some(Role::Editor),
            "reader" => Some(Role::Reader),
            _ => None,
        }
    }
}

impl Default for Role {
    /// Least privilege for authenticated users.
    fn default() -> Self {
        Role::Reader
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Editor => write!(f, "editor"),
            Role::Reader => write!(f, "reader"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_all_privileges() {
        assert!(Role::Admin.has_privilege(Role::Admin));
        assert!(Role::Admin.has_privilege(Role::Editor));
        assert!(Role::Admin.has_privilege(Role::Reader));
    }

    #[test]
    fn editor_is_between_reader_and_admin() {
        assert!(!Role::Editor.has_privilege(Role::Admin));
        assert!(Role::Editor.has_privilege(Role::Editor));
        assert!(Role::Editor.has_privilege(Role::Reader));
        assert!(!Role::Reader.has_privilege(Role::Editor));
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("EDITOR"), Some(Role::Editor));
        assert_eq!(Role::parse("unknown"), None);
    }

    #[test]
    fn default_role_is_reader() {
        assert_eq!(Role::default(), Role::Reader);
    }
}

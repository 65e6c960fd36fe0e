//! Caller identity and access control entries.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Opaque textual identity of a caller, as issued by the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(text: impl Into<String>) -> Self {
        Principal(text.into())
    }

    /// Identity used for calls made without a verified session.
    pub fn anonymous() -> Self {
        Principal("anonymous".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Permission a principal holds on a file or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Access {
    /// Used for permission checks only, never stored in an access list.
    Owner,
    Admin,
    Write,
    Read,
    Delete,
    Removed,
    Public,
}

impl Access {
    pub fn all() -> Vec<Access> {
        vec![
            Access::Admin,
            Access::Write,
            Access::Read,
            Access::Delete,
            Access::Public,
        ]
    }

    pub fn can_edit() -> Vec<Access> {
        vec![Access::Admin, Access::Write]
    }

    pub fn admin_access() -> Vec<Access> {
        vec![Access::Admin, Access::Delete]
    }
}

/// A named set of principals sharing access to files.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub members: Vec<(Principal, Access)>,
    pub owner: Principal,
    pub public: bool,
}

impl Group {
    /// True when `principal` owns the group or holds one of `operations` in it.
    pub fn grants(&self, principal: &Principal, operations: &[Access]) -> bool {
        self.owner == *principal
            || operations
                .iter()
                .any(|op| self.members.iter().any(|(p, a)| p == principal && a == op))
    }

    /// True when `principal` may add files to this group.
    pub fn can_edit(&self, principal: &Principal) -> bool {
        self.grants(principal, &Access::can_edit())
    }
}

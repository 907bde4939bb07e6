//! The permission catalog and compact permission storage.
//!
//! The catalog is a closed enumeration: permissions are defined once, at
//! compile time, and never created at runtime. `PermissionSet` stores a
//! subset of the catalog as a bit-set, with JSON serialization (an array of
//! identifier strings) for database storage.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

/// A single capability checked by the authorization guard.
///
/// Identifiers use the `RESOURCE:ACTION` convention of the dashboard
/// (`MEMBER:READ`, `ROLE:WRITE`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Permission {
    /// View the member list of an organization.
    MemberRead,
    /// Invite a new member into an organization.
    MemberAdd,
    /// Change an existing member's role.
    MemberChangeRole,
    /// Remove a member from an organization.
    MemberRemove,
    /// View the roles defined in an organization.
    RoleRead,
    /// Create or edit roles.
    RoleWrite,
    /// Delete roles.
    RoleDelete,
    /// View organization settings.
    OrgSettingsRead,
    /// Edit organization settings.
    OrgSettingsWrite,
}

impl Permission {
    /// The full catalog, in display order.
    pub const ALL: [Permission; 9] = [
        Permission::MemberRead,
        Permission::MemberAdd,
        Permission::MemberChangeRole,
        Permission::MemberRemove,
        Permission::RoleRead,
        Permission::RoleWrite,
        Permission::RoleDelete,
        Permission::OrgSettingsRead,
        Permission::OrgSettingsWrite,
    ];

    /// The stable string identifier stored in the database.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MemberRead => "MEMBER:READ",
            Self::MemberAdd => "MEMBER:ADD",
            Self::MemberChangeRole => "MEMBER:CHANGE-ROLE",
            Self::MemberRemove => "MEMBER:REMOVE",
            Self::RoleRead => "ROLE:READ",
            Self::RoleWrite => "ROLE:WRITE",
            Self::RoleDelete => "ROLE:DELETE",
            Self::OrgSettingsRead => "ORG:SETTINGS:READ",
            Self::OrgSettingsWrite => "ORG:SETTINGS:WRITE",
        }
    }

    /// Parse a string identifier back into a permission.
    ///
    /// Returns `None` for identifiers outside the catalog.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MEMBER:READ" => Some(Self::MemberRead),
            "MEMBER:ADD" => Some(Self::MemberAdd),
            "MEMBER:CHANGE-ROLE" => Some(Self::MemberChangeRole),
            "MEMBER:REMOVE" => Some(Self::MemberRemove),
            "ROLE:READ" => Some(Self::RoleRead),
            "ROLE:WRITE" => Some(Self::RoleWrite),
            "ROLE:DELETE" => Some(Self::RoleDelete),
            "ORG:SETTINGS:READ" => Some(Self::OrgSettingsRead),
            "ORG:SETTINGS:WRITE" => Some(Self::OrgSettingsWrite),
            _ => None,
        }
    }

    /// Fixed human-readable description, for permission pickers.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::MemberRead => "View the members of the organization",
            Self::MemberAdd => "Invite new members to the organization",
            Self::MemberChangeRole => "Change the role assigned to a member",
            Self::MemberRemove => "Remove members from the organization",
            Self::RoleRead => "View the roles of the organization",
            Self::RoleWrite => "Create and edit roles",
            Self::RoleDelete => "Delete roles",
            Self::OrgSettingsRead => "View organization settings",
            Self::OrgSettingsWrite => "Edit organization settings",
        }
    }

    const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Permission {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Permission::parse(&s)
            .ok_or_else(|| de::Error::custom(format!("unknown permission: {s}")))
    }
}

/// A subset of the permission catalog, stored as a bit-set.
///
/// Membership tests are O(1). Serializes as a JSON array of identifier
/// strings, which is how role permission columns are stored.
///
/// # Example
///
/// ```rust
/// use orgward::{Permission, PermissionSet};
///
/// let set: PermissionSet = [Permission::MemberRead, Permission::MemberAdd]
///     .into_iter()
///     .collect();
///
/// assert!(set.contains(Permission::MemberRead));
/// assert!(!set.contains(Permission::RoleDelete));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionSet {
    bits: u16,
}

impl PermissionSet {
    /// The empty set. Role-less members evaluate to this.
    pub const EMPTY: PermissionSet = PermissionSet { bits: 0 };

    /// Create an empty permission set.
    #[must_use]
    pub fn new() -> Self {
        Self::EMPTY
    }

    /// The entire catalog. Owners hold this implicitly.
    #[must_use]
    pub fn full() -> Self {
        Permission::ALL.into_iter().collect()
    }

    /// Add a permission to the set.
    pub fn insert(&mut self, permission: Permission) {
        self.bits |= permission.bit();
    }

    /// Remove a permission from the set.
    pub fn remove(&mut self, permission: Permission) {
        self.bits &= !permission.bit();
    }

    /// Check whether the set contains a permission.
    #[must_use]
    pub fn contains(self, permission: Permission) -> bool {
        self.bits & permission.bit() != 0
    }

    /// Check whether the set is empty.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Number of permissions in the set.
    #[must_use]
    pub fn len(self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Iterate the contained permissions in catalog order.
    pub fn iter(self) -> impl Iterator<Item = Permission> {
        Permission::ALL.into_iter().filter(move |p| self.contains(*p))
    }

    /// Parse a list of string identifiers into a set.
    ///
    /// Fails on the first identifier outside the catalog, returning it.
    /// This is the validation point for role payloads coming in over the
    /// wire: unknown identifiers never reach storage.
    pub fn from_names<I, S>(names: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for name in names {
            let name = name.as_ref();
            match Permission::parse(name) {
                Some(p) => set.insert(p),
                None => return Err(name.to_owned()),
            }
        }
        Ok(set)
    }

    /// The contained identifiers, in catalog order.
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        self.iter().map(Permission::as_str).collect()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        let mut set = Self::new();
        for p in iter {
            set.insert(p);
        }
        set
    }
}

impl fmt::Debug for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Serialize for PermissionSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for p in self.iter() {
            seq.serialize_element(p.as_str())?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for PermissionSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let names = Vec::<String>::deserialize(deserializer)?;
        PermissionSet::from_names(names)
            .map_err(|unknown| de::Error::custom(format!("unknown permission: {unknown}")))
    }
}

//! The closed role set and the fine-grained permissions derived from it.
//!
//! Roles are stored as strings in the database and round-tripped through
//! [`Role::as_str`] / [`Role::from_str`]. Permissions pair a [`Resource`]
//! with a [`Verb`]; the [`crate::PermissionTable`] maps each role to its
//! explicit permission set.

use serde::{Deserialize, Serialize};

/// The privilege level a membership carries within a workspace.
///
/// The four roles form a descending order of capability
/// (Owner ⊇ Admin ⊇ Member ⊇ Viewer), though each is defined by the
/// explicit permission set in [`crate::PermissionTable::standard`] rather
/// than by nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Member,
    Viewer,
}

impl Role {
    /// Convert to the string stored in the database.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Viewer => "viewer",
        }
    }

    /// Parse from the stored string.
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(Self::Owner),
            "admin" => Some(Self::Admin),
            "member" => Some(Self::Member),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }

    /// True for the roles allowed to manage members and invites.
    #[must_use]
    pub fn is_managerial(self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }
}

/// A protected thing permissions apply to.
///
/// The non-membership resources (proposals, templates, billing) belong to
/// host-application modules; they appear here only so the role table can
/// express the full capability matrix the host checks against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Workspace,
    Member,
    Invite,
    Proposal,
    Template,
    Billing,
}

impl Resource {
    /// Convert to the string used in permission names and JSON storage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
            Self::Member => "member",
            Self::Invite => "invite",
            Self::Proposal => "proposal",
            Self::Template => "template",
            Self::Billing => "billing",
        }
    }

    /// Parse from the stored string.
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "workspace" => Some(Self::Workspace),
            "member" => Some(Self::Member),
            "invite" => Some(Self::Invite),
            "proposal" => Some(Self::Proposal),
            "template" => Some(Self::Template),
            "billing" => Some(Self::Billing),
            _ => None,
        }
    }
}

/// An operation on a resource. [`Verb::All`] grants every verb on the
/// resource it is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Create,
    Read,
    Update,
    Delete,
    All,
}

impl Verb {
    /// Convert to the string used in permission names and JSON storage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::All => "all",
        }
    }

    /// Parse from the stored string.
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "create" => Some(Self::Create),
            "read" => Some(Self::Read),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    /// Returns true if this verb grants all verbs on its resource.
    #[must_use]
    pub fn is_all(self) -> bool {
        matches!(self, Self::All)
    }
}

/// A fine-grained capability: one verb on one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub resource: Resource,
    pub verb: Verb,
}

impl Permission {
    #[must_use]
    pub const fn new(resource: Resource, verb: Verb) -> Self {
        Self { resource, verb }
    }

    /// The `resource:verb` name used in error messages and logs.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}:{}", self.resource.as_str(), self.verb.as_str())
    }

    /// Check if this permission grants access for a specific request.
    ///
    /// Returns true if the resource matches and either the verb matches
    /// exactly or this permission's verb is `all`.
    #[must_use]
    pub fn grants(&self, resource: Resource, verb: Verb) -> bool {
        self.resource == resource && (self.verb.is_all() || self.verb == verb)
    }
}

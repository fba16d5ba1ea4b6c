//! Permission sets and the role → permission table.
//!
//! `PermissionSet` stores the capabilities of one role as a map of
//! resources to their allowed verbs, with JSON round-tripping for
//! configuration storage. `PermissionTable` is the immutable role table
//! the [`crate::AuthorizationGuard`] resolves against; it is constructed
//! explicitly at startup and injected, never read from a global.

use std::collections::HashMap;

use crate::roles::{Permission, Resource, Role, Verb};

/// The set of permissions one role carries.
///
/// # Example
///
/// ```rust
/// use palisade::permissions::PermissionSetBuilder;
/// use palisade::roles::{Resource, Verb};
///
/// let perms = PermissionSetBuilder::new()
///     .grant(Resource::Proposal, Verb::Create)
///     .grant(Resource::Member, Verb::All)
///     .build();
///
/// assert!(perms.can(Resource::Proposal, Verb::Create));
/// assert!(perms.can(Resource::Member, Verb::Delete)); // `all` grants everything
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PermissionSet {
    /// Map of resource -> allowed verbs.
    permissions: HashMap<Resource, Vec<Verb>>,
}

impl PermissionSet {
    /// Create an empty permission set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            permissions: HashMap::new(),
        }
    }

    /// Grant a verb on a resource.
    pub fn grant(&mut self, resource: Resource, verb: Verb) {
        self.permissions.entry(resource).or_default().push(verb);
    }

    /// Check if the set allows a verb on a resource.
    ///
    /// Returns true if the exact pair is granted or the resource carries
    /// [`Verb::All`].
    #[must_use]
    pub fn can(&self, resource: Resource, verb: Verb) -> bool {
        self.permissions
            .get(&resource)
            .is_some_and(|verbs| verbs.iter().any(|v| v.is_all() || *v == verb))
    }

    /// Check if the set satisfies a specific [`Permission`].
    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.can(permission.resource, permission.verb)
    }

    /// Every permission in `required` that this set does not satisfy,
    /// as `resource:verb` names. Empty means the whole set is satisfied.
    #[must_use]
    pub fn missing_from(&self, required: &[Permission]) -> Vec<String> {
        required
            .iter()
            .filter(|p| !self.has_permission(**p))
            .map(Permission::name)
            .collect()
    }

    /// Get all resources that have permissions.
    pub fn resources(&self) -> impl Iterator<Item = Resource> + '_ {
        self.permissions.keys().copied()
    }

    /// Get all verbs granted on a resource.
    #[must_use]
    pub fn verbs_for(&self, resource: Resource) -> Option<&[Verb]> {
        self.permissions.get(&resource).map(Vec::as_slice)
    }

    /// Check if the permission set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Serialize to JSON for configuration storage.
    ///
    /// Format: `{"proposal": ["create", "read"], "member": ["all"]}`
    #[must_use]
    pub fn to_json(&self) -> String {
        let map: HashMap<&str, Vec<&str>> = self
            .permissions
            .iter()
            .map(|(r, verbs)| (r.as_str(), verbs.iter().map(|v| v.as_str()).collect()))
            .collect();

        serde_json::to_string(&map).unwrap_or_else(|_| "{}".to_owned())
    }

    /// Deserialize from JSON.
    ///
    /// Returns None if parsing fails or any resource/verb is unrecognized.
    #[must_use]
    pub fn from_json(json: &str) -> Option<Self> {
        let map: HashMap<String, Vec<String>> = serde_json::from_str(json).ok()?;

        let mut permissions = HashMap::new();
        for (resource_str, verb_strs) in map {
            let resource = Resource::from_str(&resource_str)?;
            let mut verbs = Vec::new();
            for verb_str in verb_strs {
                verbs.push(Verb::from_str(&verb_str)?);
            }
            permissions.insert(resource, verbs);
        }

        Some(Self { permissions })
    }
}

/// Builder for creating permission sets with a fluent API.
#[must_use]
#[derive(Default)]
pub struct PermissionSetBuilder {
    set: PermissionSet,
}

impl PermissionSetBuilder {
    /// Start building a new permission set.
    pub fn new() -> Self {
        Self {
            set: PermissionSet::new(),
        }
    }

    /// Grant a verb on a resource.
    pub fn grant(mut self, resource: Resource, verb: Verb) -> Self {
        self.set.grant(resource, verb);
        self
    }

    /// Build the permission set.
    pub fn build(self) -> PermissionSet {
        self.set
    }
}

/// The immutable mapping from each role to its permission set.
///
/// Construct once at startup — [`PermissionTable::standard`] for the
/// stock matrix, or [`PermissionTable::with_role`] chains for a custom
/// one — and hand it to the [`crate::AuthorizationGuard`].
#[derive(Debug, Clone)]
pub struct PermissionTable {
    sets: HashMap<Role, PermissionSet>,
}

impl PermissionTable {
    /// An empty table. Roles without an entry resolve to no permissions.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            sets: HashMap::new(),
        }
    }

    /// Replace the permission set for one role.
    #[must_use]
    pub fn with_role(mut self, role: Role, set: PermissionSet) -> Self {
        self.sets.insert(role, set);
        self
    }

    /// The stock capability matrix:
    ///
    /// - **Owner** — `all` on every resource.
    /// - **Admin** — full member/invite/proposal/template management,
    ///   read-only workspace settings and billing.
    /// - **Member** — proposal create/read/update, template read,
    ///   read-only workspace and member list.
    /// - **Viewer** — read-only everywhere content is readable.
    #[must_use]
    pub fn standard() -> Self {
        let owner = PermissionSetBuilder::new()
            .grant(Resource::Workspace, Verb::All)
            .grant(Resource::Member, Verb::All)
            .grant(Resource::Invite, Verb::All)
            .grant(Resource::Proposal, Verb::All)
            .grant(Resource::Template, Verb::All)
            .grant(Resource::Billing, Verb::All)
            .build();

        let admin = PermissionSetBuilder::new()
            .grant(Resource::Workspace, Verb::Read)
            .grant(Resource::Member, Verb::All)
            .grant(Resource::Invite, Verb::All)
            .grant(Resource::Proposal, Verb::All)
            .grant(Resource::Template, Verb::All)
            .grant(Resource::Billing, Verb::Read)
            .build();

        let member = PermissionSetBuilder::new()
            .grant(Resource::Workspace, Verb::Read)
            .grant(Resource::Member, Verb::Read)
            .grant(Resource::Proposal, Verb::Create)
            .grant(Resource::Proposal, Verb::Read)
            .grant(Resource::Proposal, Verb::Update)
            .grant(Resource::Template, Verb::Read)
            .build();

        let viewer = PermissionSetBuilder::new()
            .grant(Resource::Workspace, Verb::Read)
            .grant(Resource::Member, Verb::Read)
            .grant(Resource::Proposal, Verb::Read)
            .grant(Resource::Template, Verb::Read)
            .build();

        Self::empty()
            .with_role(Role::Owner, owner)
            .with_role(Role::Admin, admin)
            .with_role(Role::Member, member)
            .with_role(Role::Viewer, viewer)
    }

    /// The permission set a role resolves to.
    #[must_use]
    pub fn permissions_of(&self, role: Role) -> &PermissionSet {
        static EMPTY: std::sync::OnceLock<PermissionSet> = std::sync::OnceLock::new();
        self.sets
            .get(&role)
            .unwrap_or_else(|| EMPTY.get_or_init(PermissionSet::new))
    }
}

impl Default for PermissionTable {
    fn default() -> Self {
        Self::standard()
    }
}

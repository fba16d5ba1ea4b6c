use std::collections::HashSet;

use crate::audit::{AuditEvent, AuditSink};
use crate::config::SlugConfig;
use crate::repository::{CreateWorkspace, MembershipRepository, WorkspaceRepository};
use crate::slug::{candidates, slugify};
use crate::types::{Membership, Workspace};
use crate::validators::validate_workspace_name;
use crate::AccessError;

/// A freshly created workspace with its initial membership list.
#[derive(Debug, Clone)]
pub struct CreatedWorkspace {
    pub workspace: Workspace,
    pub members: Vec<Membership>,
}

/// Action to create a workspace.
///
/// This action:
/// 1. Validates the display name
/// 2. Derives a URL-safe slug, retrying with `-2`, `-3`, … suffixes on
///    write-time collisions
/// 3. Creates the workspace, its Owner membership for the actor, and the
///    actor's active-workspace pointer in one atomic store call
///
/// A read-time probe of existing slugs only seeds the retry loop; the
/// store's unique constraint decides, so concurrent creations with the
/// same name cannot share a slug.
pub struct CreateWorkspaceAction<W, M, A>
where
    W: WorkspaceRepository,
    M: MembershipRepository,
    A: AuditSink,
{
    workspaces: W,
    memberships: M,
    audit: A,
    config: SlugConfig,
}

impl<W, M, A> CreateWorkspaceAction<W, M, A>
where
    W: WorkspaceRepository,
    M: MembershipRepository,
    A: AuditSink,
{
    /// Creates a new `CreateWorkspaceAction` with default slug settings.
    pub fn new(workspaces: W, memberships: M, audit: A) -> Self {
        Self {
            workspaces,
            memberships,
            audit,
            config: SlugConfig::default(),
        }
    }

    /// Creates a new `CreateWorkspaceAction` with custom slug settings.
    pub fn with_config(workspaces: W, memberships: M, audit: A, config: SlugConfig) -> Self {
        Self {
            workspaces,
            memberships,
            audit,
            config,
        }
    }

    /// Creates a workspace named `name` owned by `actor_id`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "create_workspace", skip_all, err)
    )]
    pub async fn execute(
        &self,
        actor_id: i64,
        name: &str,
    ) -> Result<CreatedWorkspace, AccessError> {
        validate_workspace_name(name)?;

        let base = slugify(name);
        let taken: HashSet<String> = self
            .workspaces
            .slugs_with_prefix(&base)
            .await?
            .into_iter()
            .collect();

        let mut attempts = 0;
        let mut created = None;
        for slug in candidates(&base).filter(|c| !taken.contains(c)) {
            attempts += 1;
            if attempts > self.config.max_attempts {
                break;
            }

            match self
                .workspaces
                .create(CreateWorkspace {
                    name: name.to_owned(),
                    slug,
                    owner_id: actor_id,
                })
                .await
            {
                Ok(workspace) => {
                    created = Some(workspace);
                    break;
                }
                // lost a concurrent race for this slug, try the next suffix
                Err(AccessError::SlugTaken) => continue,
                Err(other) => return Err(other),
            }
        }

        let Some(workspace) = created else {
            return Err(AccessError::Internal(format!(
                "no free slug found for \"{base}\" after {attempts} attempts"
            )));
        };

        let members = self.memberships.find_by_workspace(workspace.id).await?;

        log::info!(
            target: "palisade",
            "msg=\"workspace created\", workspace_id={}, slug=\"{}\", owner_id={}",
            workspace.id,
            workspace.slug,
            actor_id
        );

        self.audit
            .record(
                AuditEvent::new(actor_id, "workspace.created", "workspace")
                    .workspace(workspace.id)
                    .entity_id(workspace.id),
            )
            .await;

        Ok(CreatedWorkspace { workspace, members })
    }
}

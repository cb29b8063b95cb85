//! Manifest generation from a secure data share
//!
//! The pipeline runs once per share: collect the share's grants, follow the
//! database roles granted to it, assemble the object tree, and hand back a
//! [`Manifest`] ready for the YAML formatter.

mod document;
mod grants;
mod hierarchy;
mod roles;

pub use document::{
    DatabaseEntry, Manifest, ObjectEntry, RoleEntry, SchemaEntry, SharedContent, MANIFEST_VERSION,
};
pub use grants::{collect_share_grants, GrantRecord, GrantedOn, RoleAttribution, SELECT, USAGE};
pub use hierarchy::assemble;
pub use roles::{resolve_database_roles, role_comment, RoleInfo};

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::error::ManifestError;

/// Generates application manifests using one catalog handle.
pub struct ShareManifestGenerator<C: Catalog> {
    catalog: C,
}

impl<C: Catalog> ShareManifestGenerator<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    /// Build the manifest for `share_name`.
    pub fn analyze_share(&mut self, share_name: &str) -> Result<Manifest, ManifestError> {
        info!("Starting manifest generation from data share: {}", share_name);

        let share_grants = collect_share_grants(&mut self.catalog, share_name)?;
        let (role_grants, role_info) = resolve_database_roles(&mut self.catalog, &share_grants)?;
        if role_info.is_empty() {
            debug!("Share {} grants no database roles", share_name);
        } else {
            info!("Resolved {} database roles", role_info.len());
        }

        let all_grants: Vec<RoleAttribution> = share_grants
            .into_iter()
            .map(RoleAttribution::direct)
            .chain(role_grants)
            .collect();

        let manifest = Manifest {
            manifest_version: MANIFEST_VERSION,
            roles: build_roles_section(&role_info),
            shared_content: SharedContent {
                databases: assemble(&all_grants),
            },
        };

        info!("Completed manifest generation from data share: {}", share_name);
        Ok(manifest)
    }
}

fn build_roles_section(role_info: &RoleInfo) -> Vec<RoleEntry> {
    role_info
        .iter()
        .map(|(name, comment)| RoleEntry {
            name: name.to_string(),
            comment: comment.map(str::to_string),
        })
        .collect()
}

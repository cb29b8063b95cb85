//! Database role discovery: role comments and the grants each role holds

use tracing::{error, info};

use super::grants::{GrantRecord, GrantedOn, RoleAttribution, USAGE};
use crate::catalog::Catalog;
use crate::error::ManifestError;
use crate::identifier::validate_identifier;

/// Roles granted to the share, in discovery order, with their comments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleInfo {
    roles: Vec<(String, Option<String>)>,
}

impl RoleInfo {
    /// Record a role; a role seen again keeps its position and takes the new comment.
    pub fn insert(&mut self, name: &str, comment: Option<String>) {
        match self.roles.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = comment,
            None => self.roles.push((name.to_string(), comment)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.roles.iter().map(|(n, c)| (n.as_str(), c.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Split `DB.ROLE` into `(Some("DB"), "ROLE")`; an undotted name has no database.
pub(crate) fn split_role_name(role_name: &str) -> (Option<&str>, &str) {
    match role_name.split_once('.') {
        Some((db, role)) => (Some(db), role),
        None => (None, role_name),
    }
}

/// Follow every database role granted to the share.
///
/// Returns the role-sourced grants, each tagged with the role's short name,
/// and the comment of every role found. Catalog failures for one role are
/// logged and skipped; malformed names abort.
pub fn resolve_database_roles(
    catalog: &mut dyn Catalog,
    share_grants: &[GrantRecord],
) -> Result<(Vec<RoleAttribution>, RoleInfo), ManifestError> {
    let mut role_grants = Vec::new();
    let mut role_info = RoleInfo::default();

    let database_roles = share_grants
        .iter()
        .filter(|g| g.is(USAGE, &GrantedOn::DatabaseRole))
        .map(|g| g.name.as_str());

    for role_name in database_roles {
        let (_, short_name) = split_role_name(role_name);

        let comment = role_comment(catalog, role_name)?;
        role_info.insert(short_name, comment);

        let role_name = validate_identifier(role_name, "database role name")?;
        let query = format!("SHOW GRANTS TO DATABASE ROLE {}", role_name);

        info!("Getting grants for database role: {}", role_name);
        match catalog.query(&query) {
            Ok(rows) => role_grants.extend(
                rows.iter()
                    .map(|row| RoleAttribution::via_role(GrantRecord::from_row(row), short_name)),
            ),
            Err(e) => {
                error!("Error getting grants for database role {}: {}", role_name, e);
            }
        }
    }

    Ok((role_grants, role_info))
}

/// Look up the comment of `DB.ROLE` in `SHOW DATABASE ROLES IN DATABASE DB`.
///
/// Blank comments, unknown roles and failed lookups all yield `None`.
pub fn role_comment(
    catalog: &mut dyn Catalog,
    role_name: &str,
) -> Result<Option<String>, ManifestError> {
    let (Some(db_name), short_name) = split_role_name(role_name) else {
        return Ok(None);
    };

    let db_name = validate_identifier(db_name, "database name")?;
    let query = format!("SHOW DATABASE ROLES IN DATABASE {}", db_name);

    let rows = match catalog.query(&query) {
        Ok(rows) => rows,
        Err(e) => {
            error!("Error getting role info for {}: {}", role_name, e);
            return Ok(None);
        }
    };

    let comment = rows
        .iter()
        .find(|row| row.get("name") == Some(short_name))
        .and_then(|row| row.get("comment"))
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    Ok(comment)
}

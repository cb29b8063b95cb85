//! Grant records and the share grant collector

use tracing::{debug, error};

use crate::catalog::{Catalog, Row};
use crate::error::ManifestError;
use crate::identifier::validate_identifier;

pub const USAGE: &str = "USAGE";
pub const SELECT: &str = "SELECT";

/// Kind of object a privilege was granted on (`granted_on` column)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantedOn {
    Database,
    Schema,
    Table,
    View,
    DatabaseRole,
    /// Any other kind (functions, stages, ...), carried but never placed in the tree
    Other(String),
}

impl GrantedOn {
    pub fn parse(value: &str) -> Self {
        match value {
            "DATABASE" => GrantedOn::Database,
            "SCHEMA" => GrantedOn::Schema,
            "TABLE" => GrantedOn::Table,
            "VIEW" => GrantedOn::View,
            "DATABASE_ROLE" => GrantedOn::DatabaseRole,
            other => GrantedOn::Other(other.to_string()),
        }
    }
}

/// One `(privilege, granted_on, name)` row of a `SHOW GRANTS` result.
///
/// Missing columns read as empty strings; the assembler ignores grants
/// with an empty name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantRecord {
    pub privilege: String,
    pub granted_on: GrantedOn,
    pub name: String,
}

impl GrantRecord {
    pub fn new(privilege: &str, granted_on: GrantedOn, name: &str) -> Self {
        Self {
            privilege: privilege.to_string(),
            granted_on,
            name: name.to_string(),
        }
    }

    pub fn from_row(row: &Row) -> Self {
        Self {
            privilege: row.get("privilege").unwrap_or_default().to_string(),
            granted_on: GrantedOn::parse(row.get("granted_on").unwrap_or_default()),
            name: row.get("name").unwrap_or_default().to_string(),
        }
    }

    /// True when this grant is `privilege` on an object of kind `kind` and names an object.
    pub fn is(&self, privilege: &str, kind: &GrantedOn) -> bool {
        self.privilege == privilege && &self.granted_on == kind && !self.name.is_empty()
    }
}

/// A grant together with the database role it was reached through.
///
/// `role` is `None` for grants made directly to the share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAttribution {
    pub grant: GrantRecord,
    pub role: Option<String>,
}

impl RoleAttribution {
    pub fn direct(grant: GrantRecord) -> Self {
        Self { grant, role: None }
    }

    pub fn via_role(grant: GrantRecord, role: &str) -> Self {
        Self {
            grant,
            role: Some(role.to_string()),
        }
    }
}

/// Collect the grants made directly to `share_name`.
///
/// A malformed share name is rejected before anything is sent. A failing
/// `SHOW GRANTS` is logged and treated as a share with no grants.
pub fn collect_share_grants(
    catalog: &mut dyn Catalog,
    share_name: &str,
) -> Result<Vec<GrantRecord>, ManifestError> {
    let share_name = validate_identifier(share_name, "share name")?;
    let query = format!("SHOW GRANTS TO SHARE {}", share_name);

    match catalog.query(&query) {
        Ok(rows) => {
            debug!("Share {} has {} direct grants", share_name, rows.len());
            Ok(rows.iter().map(GrantRecord::from_row).collect())
        }
        Err(e) => {
            error!("Error getting share grants: {}", e);
            Ok(Vec::new())
        }
    }
}

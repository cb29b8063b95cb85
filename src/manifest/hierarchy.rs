//! Assemble the database -> schema -> table/view tree from attributed grants
//!
//! The grant list is folded in four passes. Each pass only attaches objects to
//! containers created by an earlier pass, so a schema grant whose database was
//! never granted USAGE (or a table whose schema is unknown) is dropped.
//!
//! Role attribution is recorded per level from the grants themselves and is
//! not inherited: a role on a database says nothing about its schemas. At the
//! database level a database role granted straight to the share also counts
//! as an attributed role; schema, table and view levels only record roles the
//! grant was reached through.

use std::collections::BTreeSet;

use tracing::debug;

use super::document::{DatabaseEntry, ObjectEntry, SchemaEntry};
use super::grants::{GrantedOn, RoleAttribution, SELECT, USAGE};
use super::roles::split_role_name;

type RoleSet = BTreeSet<String>;

#[derive(Debug, Default)]
struct SchemaNode {
    roles: RoleSet,
    tables: Vec<(String, RoleSet)>,
    views: Vec<(String, RoleSet)>,
}

#[derive(Debug, Default)]
struct DatabaseNode {
    roles: RoleSet,
    schemas: Vec<(String, SchemaNode)>,
}

/// Find `name` in an insertion-ordered list, appending a default entry when absent.
fn entry<'a, T: Default>(items: &'a mut Vec<(String, T)>, name: &str) -> &'a mut T {
    let index = match items.iter().position(|(n, _)| n == name) {
        Some(index) => index,
        None => {
            items.push((name.to_string(), T::default()));
            items.len() - 1
        }
    };
    &mut items[index].1
}

fn find_mut<'a, T>(items: &'a mut [(String, T)], name: &str) -> Option<&'a mut T> {
    items.iter_mut().find(|(n, _)| n == name).map(|(_, v)| v)
}

/// Build the ordered database entries for a share.
pub fn assemble(grants: &[RoleAttribution]) -> Vec<DatabaseEntry> {
    let mut databases: Vec<(String, DatabaseNode)> = Vec::new();

    // Pass 1: databases
    for RoleAttribution { grant, role } in grants {
        if grant.is(USAGE, &GrantedOn::Database) {
            let database = entry(&mut databases, &grant.name);
            if let Some(role) = role {
                database.roles.insert(role.clone());
            }
        } else if grant.is(USAGE, &GrantedOn::DatabaseRole) {
            let (Some(db_name), role_name) = split_role_name(&grant.name) else {
                continue;
            };
            let database = entry(&mut databases, db_name);
            if role.is_none() {
                database.roles.insert(role_name.to_string());
            }
        }
    }

    // Pass 2: schemas
    for RoleAttribution { grant, role } in grants {
        if !grant.is(USAGE, &GrantedOn::Schema) {
            continue;
        }
        let Some((db_name, schema_name)) = grant.name.split_once('.') else {
            continue;
        };
        let Some(database) = find_mut(&mut databases, db_name) else {
            debug!("Dropping schema grant {}: database not shared", grant.name);
            continue;
        };
        let schema = entry(&mut database.schemas, schema_name);
        if let Some(role) = role {
            schema.roles.insert(role.clone());
        }
    }

    // Pass 3: tables and views
    for RoleAttribution { grant, role } in grants {
        let is_table = grant.is(SELECT, &GrantedOn::Table);
        if !is_table && !grant.is(SELECT, &GrantedOn::View) {
            continue;
        }
        let parts: Vec<&str> = grant.name.split('.').collect();
        if parts.len() < 3 {
            continue;
        }
        let (db_name, schema_name) = (parts[0], parts[1]);
        let object_name = parts[2..].join(".");

        let Some(schema) = find_mut(&mut databases, db_name)
            .and_then(|database| find_mut(&mut database.schemas, schema_name))
        else {
            debug!("Dropping object grant {}: schema not shared", grant.name);
            continue;
        };

        let objects = if is_table {
            &mut schema.tables
        } else {
            &mut schema.views
        };
        let roles = entry(objects, &object_name);
        if let Some(role) = role {
            roles.insert(role.clone());
        }
    }

    // Pass 4: ordered entry lists
    databases
        .into_iter()
        .map(|(name, database)| DatabaseEntry {
            name,
            roles: database.roles.into_iter().collect(),
            schemas: database
                .schemas
                .into_iter()
                .map(|(name, schema)| SchemaEntry {
                    name,
                    roles: schema.roles.into_iter().collect(),
                    tables: into_objects(schema.tables),
                    views: into_objects(schema.views),
                })
                .collect(),
        })
        .collect()
}

fn into_objects(objects: Vec<(String, RoleSet)>) -> Vec<ObjectEntry> {
    objects
        .into_iter()
        .map(|(name, roles)| ObjectEntry {
            name,
            roles: roles.into_iter().collect(),
        })
        .collect()
}

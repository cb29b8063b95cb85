//! The manifest document and its shaping into a YAML node tree

use crate::yaml::Node;

pub const MANIFEST_VERSION: i64 = 2;

/// An application manifest built from one share
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub manifest_version: i64,
    pub roles: Vec<RoleEntry>,
    pub shared_content: SharedContent,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            manifest_version: MANIFEST_VERSION,
            roles: Vec::new(),
            shared_content: SharedContent::default(),
        }
    }
}

/// A database role exposed by the share
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleEntry {
    pub name: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedContent {
    pub databases: Vec<DatabaseEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseEntry {
    pub name: String,
    pub roles: Vec<String>,
    pub schemas: Vec<SchemaEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEntry {
    pub name: String,
    pub roles: Vec<String>,
    pub tables: Vec<ObjectEntry>,
    pub views: Vec<ObjectEntry>,
}

/// A table or view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub name: String,
    pub roles: Vec<String>,
}

fn single(key: &str, value: Node) -> Node {
    Node::Mapping(vec![(key.to_string(), value)])
}

fn push_roles(fields: &mut Vec<(String, Node)>, roles: &[String]) {
    if !roles.is_empty() {
        fields.push(("roles".to_string(), Node::FlowList(roles.to_vec())));
    }
}

impl RoleEntry {
    fn to_node(&self) -> Node {
        let value = match &self.comment {
            Some(comment) => single("comment", Node::String(comment.clone())),
            None => Node::Empty,
        };
        single(&self.name, value)
    }
}

impl ObjectEntry {
    fn to_node(&self) -> Node {
        let value = if self.roles.is_empty() {
            Node::Empty
        } else {
            single("roles", Node::FlowList(self.roles.clone()))
        };
        single(&self.name, value)
    }
}

impl SchemaEntry {
    fn to_node(&self) -> Node {
        let mut fields = Vec::new();
        push_roles(&mut fields, &self.roles);
        if !self.tables.is_empty() {
            fields.push((
                "tables".to_string(),
                Node::Sequence(self.tables.iter().map(ObjectEntry::to_node).collect()),
            ));
        }
        if !self.views.is_empty() {
            fields.push((
                "views".to_string(),
                Node::Sequence(self.views.iter().map(ObjectEntry::to_node).collect()),
            ));
        }
        single(&self.name, Node::Mapping(fields))
    }
}

impl DatabaseEntry {
    fn to_node(&self) -> Node {
        let mut fields = Vec::new();
        push_roles(&mut fields, &self.roles);
        fields.push((
            "schemas".to_string(),
            Node::Sequence(self.schemas.iter().map(SchemaEntry::to_node).collect()),
        ));
        single(&self.name, Node::Mapping(fields))
    }
}

impl Manifest {
    /// Shape the manifest for rendering.
    ///
    /// Containers without roles omit the `roles` key; tables, views and roles
    /// with nothing to say become bare keys.
    pub fn to_node(&self) -> Node {
        Node::Mapping(vec![
            (
                "manifest_version".to_string(),
                Node::Integer(self.manifest_version),
            ),
            (
                "roles".to_string(),
                Node::Sequence(self.roles.iter().map(RoleEntry::to_node).collect()),
            ),
            (
                "shared_content".to_string(),
                single(
                    "databases",
                    Node::Sequence(
                        self.shared_content
                            .databases
                            .iter()
                            .map(DatabaseEntry::to_node)
                            .collect(),
                    ),
                ),
            ),
        ])
    }
}

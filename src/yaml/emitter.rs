//! Block-style YAML emitter for [`Node`] trees.
//!
//! Layout follows the shape application manifests are usually written in:
//!
//! ```yaml
//! roles:
//! - DR1:
//!     comment: Reader role
//! - DR2:
//! shared_content:
//!   databases:
//!   - DEMO_DB:
//!       roles: [DR1]
//! ```
//!
//! Sequences under a mapping key start at the key's column. A mapping that is
//! a sequence item starts on the dash line, padded so its keys sit one indent
//! step past the dash (`-   DR1:` at width 4). Nested blocks are indented by
//! the configured width relative to their parent key.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ManifestError;

use super::Node;

/// Characters that end a plain scalar inside `[...]`.
const FLOW_INDICATORS: &[char] = &[',', '[', ']', '{', '}'];

/// Plain scalars a YAML 1.1 reader resolves to something other than a string:
/// booleans, null, ints, floats, timestamps, and the merge and value keys.
static YAML11_IMPLICIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:",
        r"y|Y|yes|Yes|YES|n|N|no|No|NO|true|True|TRUE|false|False|FALSE|on|On|ON|off|Off|OFF",
        r"|~|null|Null|NULL",
        r"|[-+]?0b[0-1_]+|[-+]?0[0-7_]+|[-+]?(?:0|[1-9][0-9_]*)|[-+]?0x[0-9a-fA-F_]+",
        r"|[-+]?[1-9][0-9_]*(?::[0-5]?[0-9])+",
        r"|[-+]?[0-9][0-9_]*\.[0-9_]*(?:[eE][-+][0-9]+)?|\.[0-9][0-9_]*(?:[eE][-+][0-9]+)?",
        r"|[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+\.[0-9_]*|[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN)",
        r"|[0-9]{4}-[0-9]{2}-[0-9]{2}",
        r"|[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}(?:[Tt]|[ \t]+)[0-9]{1,2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]*)?(?:[ \t]*(?:Z|[-+][0-9]{1,2}(?::[0-9]{2})?))?",
        r"|<<|=",
        r")$"
    ))
    .unwrap()
});

pub(crate) struct Emitter {
    indent: usize,
    sort_keys: bool,
    out: String,
}

impl Emitter {
    pub(crate) fn new(indent: usize, sort_keys: bool) -> Self {
        Self {
            indent,
            sort_keys,
            out: String::with_capacity(4096),
        }
    }

    pub(crate) fn emit(mut self, node: &Node) -> Result<String, ManifestError> {
        match node {
            Node::Mapping(entries) if !entries.is_empty() => self.write_mapping(entries, 0, false)?,
            Node::Sequence(items) if !items.is_empty() => self.write_sequence(items, 0)?,
            Node::Empty => self.out.push_str("null\n"),
            other => {
                // write_value prefixes a separator space meant for `key: value`
                self.write_value(other, 0)?;
                self.out.remove(0);
            }
        }
        Ok(self.out)
    }

    fn ordered<'a>(&self, entries: &'a [(String, Node)]) -> Vec<&'a (String, Node)> {
        let mut ordered: Vec<&(String, Node)> = entries.iter().collect();
        if self.sort_keys {
            ordered.sort_by(|a, b| a.0.cmp(&b.0));
        }
        ordered
    }

    fn pad(&mut self, column: usize) {
        self.out.extend(std::iter::repeat(' ').take(column));
    }

    /// Write mapping entries with keys at `column`. With `inline_first` the
    /// caller has already positioned the cursor for the first key.
    fn write_mapping(
        &mut self,
        entries: &[(String, Node)],
        column: usize,
        inline_first: bool,
    ) -> Result<(), ManifestError> {
        for (i, (key, value)) in self.ordered(entries).into_iter().enumerate() {
            if i > 0 || !inline_first {
                self.pad(column);
            }
            let key = render_scalar(key, false)?;
            self.out.push_str(&key);
            self.out.push(':');
            self.write_value(value, column)?;
        }
        Ok(())
    }

    fn write_sequence(&mut self, items: &[Node], column: usize) -> Result<(), ManifestError> {
        for item in items {
            self.pad(column);
            self.out.push('-');
            match item {
                Node::Mapping(entries) if !entries.is_empty() => {
                    self.pad(self.indent - 1);
                    self.write_mapping(entries, column + self.indent, true)?;
                }
                Node::Sequence(nested) if !nested.is_empty() => {
                    self.out.push('\n');
                    self.write_sequence(nested, column + self.indent)?;
                }
                other => self.write_value(other, column)?,
            }
        }
        Ok(())
    }

    /// Write whatever follows `key:` (or `-`) for a value owned by `column`.
    fn write_value(&mut self, value: &Node, column: usize) -> Result<(), ManifestError> {
        match value {
            Node::Integer(i) => {
                self.out.push(' ');
                self.out.push_str(&i.to_string());
                self.out.push('\n');
            }
            Node::String(s) => {
                let s = render_scalar(s, false)?;
                self.out.push(' ');
                self.out.push_str(&s);
                self.out.push('\n');
            }
            Node::Empty => self.out.push('\n'),
            Node::FlowList(items) => {
                let rendered = items
                    .iter()
                    .map(|item| render_scalar(item, true))
                    .collect::<Result<Vec<_>, _>>()?;
                self.out.push_str(" [");
                self.out.push_str(&rendered.join(", "));
                self.out.push_str("]\n");
            }
            Node::Mapping(entries) if entries.is_empty() => self.out.push_str(" {}\n"),
            Node::Mapping(entries) => {
                self.out.push('\n');
                self.write_mapping(entries, column + self.indent, false)?;
            }
            Node::Sequence(items) if items.is_empty() => self.out.push_str(" []\n"),
            Node::Sequence(items) => {
                self.out.push('\n');
                self.write_sequence(items, column)?;
            }
        }
        Ok(())
    }
}

/// Render a string scalar so that a YAML reader gets the same string back.
///
/// serde_yaml decides between plain and single-quoted style. It resolves
/// plain scalars by YAML 1.2 rules, so strings such as `NO` or `0o17` that a
/// YAML 1.1 reader would take for a boolean or number are single-quoted here.
/// Strings it would spread over several lines, and plain scalars that would
/// break a flow sequence, are written double-quoted instead.
pub(crate) fn render_scalar(value: &str, in_flow: bool) -> Result<String, ManifestError> {
    let rendered = serde_yaml::to_string(value)?;
    let rendered = rendered.strip_prefix("--- ").unwrap_or(&rendered);
    let rendered = rendered.strip_suffix('\n').unwrap_or(rendered);

    let is_quoted = rendered.starts_with('\'') || rendered.starts_with('"');
    if rendered.contains('\n') || (in_flow && !is_quoted && rendered.contains(FLOW_INDICATORS)) {
        return double_quoted(value);
    }
    if !is_quoted && YAML11_IMPLICIT_RE.is_match(value) {
        return Ok(single_quoted(value));
    }

    Ok(rendered.to_string())
}

fn single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn double_quoted(value: &str) -> Result<String, ManifestError> {
    serde_json::to_string(value).map_err(|e| ManifestError::Serialization {
        message: e.to_string(),
    })
}

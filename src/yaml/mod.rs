//! YAML rendering of application manifests

mod emitter;
mod node;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

pub use node::Node;

use crate::error::ManifestError;
use crate::manifest::Manifest;
use emitter::Emitter;

/// Indentation widths the emitter accepts.
pub const INDENT_RANGE: std::ops::RangeInclusive<usize> = 2..=9;

/// Width used when none is given, or when the given one is out of range.
pub const DEFAULT_INDENT: usize = 2;

/// Formats manifests into YAML text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YamlFormatter {
    pub indent: usize,
    pub sort_keys: bool,
}

impl Default for YamlFormatter {
    fn default() -> Self {
        Self {
            indent: DEFAULT_INDENT,
            sort_keys: true,
        }
    }
}

impl YamlFormatter {
    pub fn new(indent: usize, sort_keys: bool) -> Self {
        Self { indent, sort_keys }
    }

    /// Render any document tree.
    ///
    /// An indent outside [`INDENT_RANGE`] falls back to [`DEFAULT_INDENT`].
    pub fn format_node(&self, node: &Node) -> Result<String, ManifestError> {
        Emitter::new(self.effective_indent(), self.sort_keys).emit(node)
    }

    fn effective_indent(&self) -> usize {
        if INDENT_RANGE.contains(&self.indent) {
            return self.indent;
        }
        warn!(
            "Indent {} is outside {}..={}, using {}",
            self.indent,
            INDENT_RANGE.start(),
            INDENT_RANGE.end(),
            DEFAULT_INDENT
        );
        DEFAULT_INDENT
    }

    pub fn format_manifest(&self, manifest: &Manifest) -> Result<String, ManifestError> {
        self.format_node(&manifest.to_node())
    }

    /// Render the manifest and write it to `path`.
    pub fn save_to_file(&self, manifest: &Manifest, path: &Path) -> Result<(), ManifestError> {
        let yaml = self.format_manifest(manifest)?;
        fs::write(path, yaml).map_err(|e| ManifestError::OutputWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
        info!("Application manifest saved to: {}", path.display());
        Ok(())
    }

    /// Render the manifest into `writer` (standard output in the CLI).
    pub fn write_to<W: Write>(&self, manifest: &Manifest, mut writer: W) -> Result<(), ManifestError> {
        let yaml = self.format_manifest(manifest)?;
        writer
            .write_all(yaml.as_bytes())
            .and_then(|_| writer.flush())
            .map_err(|e| ManifestError::OutputWrite {
                path: PathBuf::from("<stdout>"),
                source: e,
            })
    }
}

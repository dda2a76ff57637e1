//! Export record: the persisted form of an expanded tree.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use scitree_core::{Result, ScitreeError};

use crate::mode::Mode;

/// `{text, papers, children}`; `children` is omitted when empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeRecord {
    pub text: String,
    #[serde(default)]
    pub papers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeRecord>,
}

impl TreeRecord {
    /// Levels in this record, counting `self` as one.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(TreeRecord::depth).max().unwrap_or(0)
    }

    /// # Errors
    ///
    /// Returns [`ScitreeError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ScitreeError::Serialization(e.to_string()))
    }

    /// Parse a record of any depth.
    ///
    /// # Errors
    ///
    /// Returns [`ScitreeError::Serialization`] for malformed JSON.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| ScitreeError::Serialization(e.to_string()))
    }

    /// # Errors
    ///
    /// Returns [`ScitreeError::Serialization`] or [`ScitreeError::Io`].
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ScitreeError::Io`] if the file cannot be read and
    /// [`ScitreeError::Serialization`] if it is not a valid record.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Indented outline, one node per line, labelled by level.
    #[must_use]
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(0, &mut out);
        out
    }

    fn write_outline(&self, level: usize, out: &mut String) {
        let indent = "  ".repeat(level);
        let label = Mode::from_index(level).map_or("Node", Mode::label);
        let _ = writeln!(out, "{indent}{label}: {}", self.text);
        for paper in &self.papers {
            let _ = writeln!(out, "{indent}  - {paper}");
        }
        for child in &self.children {
            child.write_outline(level + 1, out);
        }
    }
}

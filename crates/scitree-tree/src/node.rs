use serde::{Deserialize, Serialize};

use scitree_core::paper_url;

use crate::export::TreeRecord;
use crate::mode::Mode;

/// A node of an expanded science tree. The root owns its whole subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub text: String,
    pub mode: Mode,
    pub year_cutoff: i32,
    /// Ids of the documents retrieved to ground this node's children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    #[must_use]
    pub fn new(text: impl Into<String>, mode: Mode, year_cutoff: i32) -> Self {
        Self {
            text: text.into(),
            mode,
            year_cutoff,
            documents: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Nodes in this subtree, including `self`.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
    }

    /// Levels in this subtree, counting `self` as one.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(TreeNode::depth).max().unwrap_or(0)
    }

    /// Pre-order traversal.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a TreeNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Export form with document ids rendered as paper URLs.
    #[must_use]
    pub fn to_record(&self) -> TreeRecord {
        TreeRecord {
            text: self.text.clone(),
            papers: self.documents.iter().map(|id| paper_url(id)).collect(),
            children: self.children.iter().map(TreeNode::to_record).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TreeNode {
        let mut root = TreeNode::new("goal", Mode::ScienceGoal, 2024);
        root.documents = vec!["2301.00001".into(), "astro-ph0001_sec2.txt".into()];
        let mut objective = TreeNode::new("objective", Mode::ScienceObjective, 2024);
        objective
            .children
            .push(TreeNode::new("parameter", Mode::PhysicalParameter, 2024));
        root.children.push(objective);
        root.children
            .push(TreeNode::new("second objective", Mode::ScienceObjective, 2024));
        root
    }

    #[test]
    fn counts_and_depth() {
        let root = sample();
        assert_eq!(root.node_count(), 4);
        assert_eq!(root.depth(), 3);

        let mut texts = Vec::new();
        root.walk(&mut |n| texts.push(n.text.as_str()));
        assert_eq!(texts, vec!["goal", "objective", "parameter", "second objective"]);
    }

    #[test]
    fn record_uses_paper_urls() {
        let record = sample().to_record();
        assert_eq!(
            record.papers,
            vec![
                "https://arxiv.org/abs/2301.00001",
                "https://arxiv.org/abs/astro-ph/0001"
            ]
        );
        assert_eq!(record.children.len(), 2);
        assert!(record.children[1].children.is_empty());
    }
}

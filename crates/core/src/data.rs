//! Data structures for commit history and the annotated file hierarchy

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One commit-file-change event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommitRecord {
    /// Commit time, carried as epoch seconds on the wire
    #[serde(with = "chrono::serde::ts_seconds")]
    pub date: DateTime<Utc>,
    /// Author name
    pub author: String,
    /// Lines inserted by this record
    #[serde(default)]
    pub insertions: u64,
    /// Lines deleted by this record
    #[serde(default)]
    pub deletions: u64,
    /// Running total of insertions over the whole history, as of this commit
    #[serde(default)]
    pub total_insertions: u64,
    /// Running total of deletions over the whole history, as of this commit
    #[serde(default)]
    pub total_deletions: u64,
    /// Whether the commit was classified as a bug fix
    #[serde(default)]
    pub bug: bool,
}

impl CommitRecord {
    /// Insertions plus deletions for this record
    pub fn churn(&self) -> u64 {
        self.insertions + self.deletions
    }

    /// Net line change for this record
    pub fn net_change(&self) -> i64 {
        self.insertions as i64 - self.deletions as i64
    }
}

/// High level file information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FileInfo {
    /// Lines of code
    #[serde(default)]
    pub loc: u64,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_revisions: u64,
}

/// Precomputed bug density for a file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BugInfo {
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub count: u64,
    /// Score normalized against the highest score in the tree
    #[serde(default)]
    pub opacity: f64,
}

/// Precomputed temporal coupling for a file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TcInfo {
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub num_revisions: u64,
    #[serde(default)]
    pub coupled_module: Option<String>,
    #[serde(default)]
    pub num_mutual_revisions: u64,
    #[serde(default)]
    pub percent: f64,
    /// Clique color, absent for files outside the top couples
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub opacity: f64,
}

/// Per-file authorship
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct KnowledgeInfo {
    /// Author name to number of changed lines
    #[serde(default)]
    pub top_authors: BTreeMap<String, u64>,
    /// Dominant author
    #[serde(default)]
    pub author: Option<String>,
    /// Color assigned to the dominant author
    #[serde(default)]
    pub color: Option<String>,
}

impl KnowledgeInfo {
    /// Contributors ordered by descending change count, ties by name
    pub fn ranked_authors(&self) -> Vec<(&str, u64)> {
        let mut authors: Vec<(&str, u64)> = self
            .top_authors
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        authors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        authors
    }
}

/// The four annotation records a node may carry.
///
/// Leaves always carry all four so the annotation mode can change without
/// another fetch; directories usually carry none.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NodeMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_info: Option<FileInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bug_info: Option<BugInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tc_info: Option<TcInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_info: Option<KnowledgeInfo>,
}

impl NodeMetrics {
    /// Name of the first missing annotation record, if any
    pub fn first_missing(&self) -> Option<&'static str> {
        if self.file_info.is_none() {
            Some("file_info")
        } else if self.bug_info.is_none() {
            Some("bug_info")
        } else if self.tc_info.is_none() {
            Some("tc_info")
        } else if self.knowledge_info.is_none() {
            Some("knowledge_info")
        } else {
            None
        }
    }
}

/// A directory or file in the source tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HierarchyNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<HierarchyNode>>,
    #[serde(flatten)]
    pub metrics: NodeMetrics,
}

impl HierarchyNode {
    /// Create a directory node
    pub fn directory(name: impl Into<String>, children: Vec<HierarchyNode>) -> Self {
        Self {
            name: name.into(),
            children: Some(children),
            metrics: NodeMetrics::default(),
        }
    }

    /// Create a file node carrying only a line count, other records defaulted
    pub fn file(name: impl Into<String>, loc: u64) -> Self {
        Self {
            name: name.into(),
            children: None,
            metrics: NodeMetrics {
                file_info: Some(FileInfo {
                    loc,
                    ..Default::default()
                }),
                bug_info: Some(BugInfo::default()),
                tc_info: Some(TcInfo::default()),
                knowledge_info: Some(KnowledgeInfo::default()),
            },
        }
    }

    /// Files have no `children` at all
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Lines of code carried by this node itself
    pub fn loc(&self) -> u64 {
        self.metrics.file_info.as_ref().map_or(0, |f| f.loc)
    }

    /// Sum of leaf line counts below (and including) this node
    pub fn total_loc(&self) -> u64 {
        match &self.children {
            Some(children) => children.iter().map(HierarchyNode::total_loc).sum(),
            None => self.loc(),
        }
    }

    /// Number of nodes in the subtree, this node included
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .flatten()
            .map(HierarchyNode::node_count)
            .sum::<usize>()
    }
}

//! Loading of commit-list and hierarchy payloads
//!
//! Commit lists arrive as a JSON array of records with epoch-second dates.
//! Hierarchies arrive as a JSON object, or in one server variant as a JSON
//! string whose contents are the JSON object (double-encoded).

use crate::data::{CommitRecord, HierarchyNode};
use crate::error::{Error, Result};
use chrono::{DateTime, Datelike, Duration, Utc};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

/// Above this many records the dashboards bin by week instead of by day
pub const ROW_LIMIT: usize = 7000;

/// Time bucket used by date dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Binning {
    Day,
    Week,
}

impl Binning {
    /// Pick the binning for a dataset of `count` records
    pub fn for_record_count(count: usize) -> Self {
        Self::with_limit(count, ROW_LIMIT)
    }

    /// Same as [`Binning::for_record_count`] with a custom row limit
    pub fn with_limit(count: usize, limit: usize) -> Self {
        if count < limit {
            Binning::Day
        } else {
            Binning::Week
        }
    }

    /// Truncate a timestamp to the start of its bucket (weeks start on Sunday)
    pub fn floor(self, date: DateTime<Utc>) -> DateTime<Utc> {
        let day = date
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|d| d.and_utc())
            .unwrap_or(date);
        match self {
            Binning::Day => day,
            Binning::Week => {
                let offset = day.weekday().num_days_from_sunday() as i64;
                day - Duration::days(offset)
            }
        }
    }

    /// Length of one bucket
    pub fn step(self) -> Duration {
        match self {
            Binning::Day => Duration::days(1),
            Binning::Week => Duration::weeks(1),
        }
    }
}

/// Parse a commit-list payload
pub fn parse_commits(json: &str) -> Result<Vec<CommitRecord>> {
    let value: Value = serde_json::from_str(json)?;
    let value = unwrap_string_payload(value)?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(Error::malformed(
                "commits",
                format!("expected an array of commit records, found {}", kind_of(&other)),
            ))
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let record: CommitRecord = serde_json::from_value(item)
            .map_err(|e| Error::malformed(format!("commits[{}]", i), e.to_string()))?;
        records.push(record);
    }

    debug!(target: "loader", count = records.len(), "parsed commit records");
    Ok(records)
}

/// Parse a hierarchy payload, accepting the double-encoded variant
pub fn parse_hierarchy(json: &str) -> Result<HierarchyNode> {
    let value: Value = serde_json::from_str(json)?;
    let value = unwrap_string_payload(value)?;

    if !value.is_object() {
        return Err(Error::malformed(
            "hierarchy",
            format!("expected a node object, found {}", kind_of(&value)),
        ));
    }

    let root: HierarchyNode = serde_json::from_value(value)
        .map_err(|e| Error::malformed("hierarchy", e.to_string()))?;
    validate_hierarchy(&root)?;

    debug!(target: "loader", nodes = root.node_count(), "parsed hierarchy");
    Ok(root)
}

/// Check that every leaf carries all four annotation records
pub fn validate_hierarchy(root: &HierarchyNode) -> Result<()> {
    fn walk(node: &HierarchyNode, path: &mut Vec<String>) -> Result<()> {
        path.push(node.name.clone());
        match &node.children {
            Some(children) => {
                for child in children {
                    walk(child, path)?;
                }
            }
            None => {
                if let Some(field) = node.metrics.first_missing() {
                    return Err(Error::malformed(
                        path.join("/"),
                        format!("leaf is missing '{}'", field),
                    ));
                }
            }
        }
        path.pop();
        Ok(())
    }

    walk(root, &mut Vec::new())
}

/// Load commit records from a JSON file
pub fn load_commits_from_file(path: &Path) -> Result<Vec<CommitRecord>> {
    let content = read_file(path)?;
    let records = parse_commits(&content)?;
    info!(target: "loader", path = %path.display(), count = records.len(), "loaded commits");
    Ok(records)
}

/// Load a hierarchy from a JSON file
pub fn load_hierarchy_from_file(path: &Path) -> Result<HierarchyNode> {
    let content = read_file(path)?;
    let root = parse_hierarchy(&content)?;
    info!(target: "loader", path = %path.display(), "loaded hierarchy");
    Ok(root)
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::FileReadError {
        path: path.display().to_string(),
        source: e,
    })
}

/// Undo one level of string encoding, if present
fn unwrap_string_payload(value: Value) -> Result<Value> {
    match value {
        Value::String(inner) => {
            debug!(target: "loader", "payload is double-encoded, parsing inner string");
            Ok(serde_json::from_str(&inner)?)
        }
        other => Ok(other),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

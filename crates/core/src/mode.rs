//! Annotation modes of the hierarchy view: circle colours, the author
//! legend and per-mode tooltips

use crate::error::{Error, Result};
use crate::pack::{NodeId, PackedHierarchy, PackedNode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Leaf fill when a mode has nothing to show
pub const NEUTRAL_FILL: &str = "#f5f5f5";
/// Leaf fill of files with a positive bug score
pub const BUG_FILL: &str = "#8b0000";
/// Legend label shared by colliding authors
pub const OTHER_AUTHOR: &str = "Other";

/// Which precomputed metric colours the leaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnotationMode {
    /// Size, revisions and age of each file
    FileInfo,
    Bugs,
    TemporalCoupling,
    #[default]
    KnowledgeMap,
}

impl AnnotationMode {
    pub const ALL: [AnnotationMode; 4] = [
        AnnotationMode::FileInfo,
        AnnotationMode::Bugs,
        AnnotationMode::TemporalCoupling,
        AnnotationMode::KnowledgeMap,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AnnotationMode::FileInfo => "File Info",
            AnnotationMode::Bugs => "Bugs",
            AnnotationMode::TemporalCoupling => "Temporal Coupling",
            AnnotationMode::KnowledgeMap => "Knowledge Map",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            AnnotationMode::FileInfo => "file-info",
            AnnotationMode::Bugs => "bugs",
            AnnotationMode::TemporalCoupling => "temporal-coupling",
            AnnotationMode::KnowledgeMap => "knowledge-map",
        }
    }
}

impl fmt::Display for AnnotationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for AnnotationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "file-info" | "code-age" => Ok(AnnotationMode::FileInfo),
            "bugs" => Ok(AnnotationMode::Bugs),
            "temporal-coupling" | "tc" => Ok(AnnotationMode::TemporalCoupling),
            "knowledge-map" | "knowledge" => Ok(AnnotationMode::KnowledgeMap),
            other => Err(Error::ConfigError(format!("unknown annotation mode '{}'", other))),
        }
    }
}

/// Fill of one circle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircleStyle {
    pub fill: String,
    pub fill_opacity: f64,
}

impl CircleStyle {
    fn solid(fill: impl Into<String>) -> Self {
        Self {
            fill: fill.into(),
            fill_opacity: 1.0,
        }
    }

    fn neutral() -> Self {
        Self::solid(NEUTRAL_FILL)
    }
}

/// Directory colour for `depth`, from `hsl(185,60%,99%)` at -1 to
/// `hsl(187,40%,70%)` at 5
pub fn depth_color(depth: usize) -> String {
    let t = ((depth as f64 + 1.0) / 6.0).clamp(0.0, 1.0);
    let h = 185.0 + 2.0 * t;
    let s = 0.60 + (0.40 - 0.60) * t;
    let l = 0.99 + (0.70 - 0.99) * t;
    let (r, g, b) = hsl_to_rgb(h, s, l);
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = (h % 360.0) / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (channel(r1), channel(g1), channel(b1))
}

/// Style of one node under `mode`
pub fn circle_style(node: &PackedNode, mode: AnnotationMode) -> CircleStyle {
    if !node.is_leaf() {
        return CircleStyle::solid(depth_color(node.depth));
    }

    let metrics = &node.metrics;
    match mode {
        AnnotationMode::FileInfo => CircleStyle::neutral(),
        AnnotationMode::Bugs => match &metrics.bug_info {
            Some(bugs) if bugs.score > 0.0 => CircleStyle {
                fill: BUG_FILL.to_string(),
                fill_opacity: bugs.opacity,
            },
            _ => CircleStyle::neutral(),
        },
        AnnotationMode::TemporalCoupling => {
            match metrics.tc_info.as_ref().and_then(|tc| tc.color.as_ref().map(|c| (c, tc.opacity))) {
                Some((color, opacity)) => CircleStyle {
                    fill: color.clone(),
                    fill_opacity: opacity,
                },
                None => CircleStyle::neutral(),
            }
        }
        AnnotationMode::KnowledgeMap => {
            match metrics.knowledge_info.as_ref().and_then(|k| k.color.as_ref()) {
                Some(color) => CircleStyle::solid(color.clone()),
                None => CircleStyle::neutral(),
            }
        }
    }
}

/// Styles of every node, in pre-order
pub fn recolor(tree: &PackedHierarchy, mode: AnnotationMode) -> Vec<CircleStyle> {
    tree.nodes().iter().map(|n| circle_style(n, mode)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
}

/// Colour key of the knowledge map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthorLegend {
    entries: Vec<LegendEntry>,
}

impl AuthorLegend {
    /// Collect dominant-author colours from the leaves in pre-order.
    ///
    /// The first author seen for a colour names it; a different author with
    /// the same colour turns the entry into [`OTHER_AUTHOR`]. Colours that
    /// end up under the same label share one entry with the later colour.
    pub fn build(tree: &PackedHierarchy) -> Self {
        let mut by_color: Vec<(String, String)> = Vec::new();
        let mut slots: HashMap<String, usize> = HashMap::new();

        for id in tree.leaves() {
            let Some(knowledge) = &tree.node(id).metrics.knowledge_info else {
                continue;
            };
            let Some(color) = &knowledge.color else {
                continue;
            };
            let author = knowledge.author.as_deref().unwrap_or(OTHER_AUTHOR);

            match slots.get(color) {
                Some(&slot) => {
                    if by_color[slot].1 != author {
                        by_color[slot].1 = OTHER_AUTHOR.to_string();
                    }
                }
                None => {
                    slots.insert(color.clone(), by_color.len());
                    by_color.push((color.clone(), author.to_string()));
                }
            }
        }

        // One entry per label, carrying the last colour seen for it
        let mut entries: Vec<LegendEntry> = Vec::new();
        for (color, label) in by_color {
            match entries.iter_mut().find(|e| e.label == label) {
                Some(entry) => entry.color = color,
                None => entries.push(LegendEntry { label, color }),
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[LegendEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Legend colour of `author`, if it has an entry of its own
    pub fn color_of(&self, author: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.label == author)
            .map(|e| e.color.as_str())
    }
}

/// Geometry of the legend grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    pub rect_size: f64,
    pub spacing: f64,
    pub text_width: f64,
    pub offset: f64,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            rect_size: 18.0,
            spacing: 4.0,
            text_width: 160.0,
            offset: 5.0,
        }
    }
}

impl LegendConfig {
    pub fn key_width(&self) -> f64 {
        self.text_width + self.rect_size
    }

    pub fn key_height(&self) -> f64 {
        self.rect_size + self.spacing
    }
}

/// Position of one legend entry, relative to the offset origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LegendSlot {
    pub x: f64,
    pub y: f64,
}

/// Column layout of a legend inside a container
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendLayout {
    pub columns: usize,
    pub keys_per_column: usize,
    pub width: f64,
    pub height: f64,
    pub slots: Vec<LegendSlot>,
}

impl LegendLayout {
    pub fn compute(entries: usize, container_width: f64, config: &LegendConfig) -> Self {
        if entries == 0 {
            return Self {
                columns: 0,
                keys_per_column: 0,
                width: 0.0,
                height: 0.0,
                slots: Vec::new(),
            };
        }

        let key_width = config.key_width();
        let key_height = config.key_height();
        let max_columns = ((container_width / key_width).floor() as usize).max(1);
        let keys_per_column = entries.div_ceil(max_columns);
        let columns = entries.div_ceil(keys_per_column);

        let slots = (0..entries)
            .map(|i| LegendSlot {
                x: (i / keys_per_column) as f64 * key_width,
                y: (i % keys_per_column) as f64 * key_height,
            })
            .collect();

        Self {
            columns,
            keys_per_column,
            width: columns as f64 * key_width + config.offset,
            height: keys_per_column as f64 * key_height + config.offset,
            slots,
        }
    }
}

/// One line of a tooltip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TooltipLine {
    pub label: String,
    pub value: String,
    pub label_color: Option<String>,
    pub value_color: Option<String>,
}

impl TooltipLine {
    fn plain(label: &str, value: impl ToString) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
            label_color: None,
            value_color: None,
        }
    }

    fn alert(label: &str, value: impl ToString) -> Self {
        Self {
            value_color: Some("red".to_string()),
            ..Self::plain(label, value)
        }
    }
}

/// Structured tooltip, rendered to markup by the front-ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tooltip {
    pub title: String,
    pub heading: Option<String>,
    pub lines: Vec<TooltipLine>,
}

fn short_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%-m/%-d/%y").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Tooltip of a leaf under `mode`; directories have none
pub fn tooltip(tree: &PackedHierarchy, id: NodeId, mode: AnnotationMode, legend: &AuthorLegend) -> Option<Tooltip> {
    let node = tree.get(id)?;
    if !node.is_leaf() {
        return None;
    }
    let metrics = &node.metrics;
    let mut heading = None;

    let lines = match mode {
        AnnotationMode::FileInfo => {
            let info = metrics.file_info.as_ref()?;
            vec![
                TooltipLine::plain("Lines of Code", info.loc),
                TooltipLine::plain("Total Revisions", info.total_revisions),
                TooltipLine::plain("Creation Date", short_date(info.creation_date)),
                TooltipLine::plain("Last Modified", short_date(info.last_modified)),
            ]
        }
        AnnotationMode::Bugs => {
            let bugs = metrics.bug_info.as_ref()?;
            vec![
                TooltipLine::alert("Bug Score", round2(bugs.score)),
                TooltipLine::plain("Number of Bugs", bugs.count),
            ]
        }
        AnnotationMode::TemporalCoupling => {
            let tc = metrics.tc_info.as_ref()?;
            if tc.score > 0.0 {
                vec![
                    TooltipLine::alert("Temporal Coupling Score", round2(tc.score)),
                    TooltipLine::plain("Number of Revisions", tc.num_revisions),
                    TooltipLine::alert(
                        "Coupled File",
                        tc.coupled_module.as_deref().unwrap_or("none"),
                    ),
                    TooltipLine::plain("Number of Mutual Revisions", tc.num_mutual_revisions),
                    TooltipLine::alert("Percent Coupled", format!("{}%", (tc.percent * 100.0).round())),
                ]
            } else {
                vec![TooltipLine::plain("Temporal Coupling Score", tc.score)]
            }
        }
        AnnotationMode::KnowledgeMap => {
            let knowledge = metrics.knowledge_info.as_ref()?;
            heading = Some("Top Contributors".to_string());
            knowledge
                .ranked_authors()
                .into_iter()
                .map(|(author, changes)| TooltipLine {
                    label: author.to_string(),
                    value: format!("with {} changes", changes),
                    label_color: legend.color_of(author).map(str::to_string),
                    value_color: None,
                })
                .collect()
        }
    };

    Some(Tooltip {
        title: node.name.clone(),
        heading,
        lines,
    })
}

//! codemd-core - Shared engine for the codemd front-ends
//!
//! This crate contains WASM-compatible code that is shared between the
//! CLI and the browser dashboard.
//!
//! # Features
//!
//! - Load commit records and the annotated file hierarchy
//! - Dimensional index with filters and incrementally maintained groups
//! - Linked time-series views and the churn ratio
//! - Circle-packing layout with an animated zoom controller
//! - Annotation modes, author legend and tooltips for the hierarchy view

pub mod churn;
pub mod dashboard;
pub mod data;
pub mod debounce;
pub mod error;
pub mod hotspots;
pub mod index;
pub mod labels;
pub mod loader;
pub mod mode;
pub mod pack;
pub mod packing;
pub mod views;
pub mod zoom;

pub use churn::{churn_ratio, churn_series, Baseline};
pub use dashboard::{Dashboard, DashboardConfig, MountPoints, Totals, Transition};
pub use data::{BugInfo, CommitRecord, FileInfo, HierarchyNode, KnowledgeInfo, NodeMetrics, TcInfo};
pub use debounce::Debouncer;
pub use error::{Error, Result};
pub use hotspots::hotspots_url;
pub use index::{CommitIndex, DimensionId, Filter, GroupId, Key, Reducer};
pub use labels::{MonospaceMeasure, TextMeasure};
pub use loader::{
    load_commits_from_file, load_hierarchy_from_file, parse_commits, parse_hierarchy, Binning,
};
pub use mode::{AnnotationMode, AuthorLegend, LegendLayout, Tooltip};
pub use pack::{pack, pack_by_loc, NodeId, PackConfig, PackedHierarchy, PackedNode};
pub use packing::{CircleClass, PackingView, ScreenCircle, ScreenLabel};
pub use views::{ChartId, ChartSeries, ChartView, Frame, LinkedViewSet, TimeRange, ViewRenderer};
pub use zoom::{Viewport, ZoomConfig, ZoomController, ZoomEvent};

//! codemd - Linked code-analytics views from the command line
//!
//! This library drives the `codemd-core` engine headlessly: it loads the
//! commit and hierarchy payloads from disk, applies selections, and renders
//! the dashboards and the circle-packing view as static SVG/HTML.
//!
//! # Example
//!
//! ```no_run
//! use codemd::{html, svg};
//! use codemd_core::{Dashboard, DashboardConfig, PackingView};
//!
//! let commits = codemd_core::load_commits_from_file("commits.json".as_ref()).unwrap();
//! let tree = codemd_core::load_hierarchy_from_file("hierarchy.json".as_ref()).unwrap();
//!
//! let dashboard = Dashboard::build(commits, DashboardConfig::default()).unwrap();
//! println!("{:?}", dashboard.totals());
//!
//! let packing = PackingView::for_container(&tree, 960.0, 960.0);
//! std::fs::write("hotspots.svg", svg::render_packing(&packing)).unwrap();
//!
//! html::write_report(&dashboard, &packing, &tree, &html::ReportConfig::default()).unwrap();
//! ```

pub mod error;
pub mod html;
pub mod svg;

pub use error::{Error, Result};

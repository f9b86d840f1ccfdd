//! The hierarchy view: packed layout, zoom state and annotation mode
//! behind one handle the front-ends drive.

use crate::data::HierarchyNode;
use crate::labels::{LabelState, MonospaceMeasure, TextMeasure};
use crate::mode::{recolor, tooltip, AnnotationMode, AuthorLegend, CircleStyle, LegendConfig, LegendLayout, Tooltip};
use crate::pack::{inner_diameter, pack_by_loc, NodeId, PackConfig, PackedHierarchy};
use crate::zoom::{Viewport, ZoomConfig, ZoomController, ZoomEvent};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// Role of a circle in the drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircleClass {
    Root,
    Node,
    Leaf,
}

impl CircleClass {
    pub fn css(self) -> &'static str {
        match self {
            CircleClass::Root => "node node--root",
            CircleClass::Node => "node",
            CircleClass::Leaf => "node node--leaf",
        }
    }
}

/// A circle in screen space, relative to the margin origin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenCircle {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub class: CircleClass,
    pub style: CircleStyle,
}

/// A label in screen space
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenLabel {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub opacity: f64,
    pub fill_opacity: f64,
}

pub struct PackingView<M = MonospaceMeasure> {
    tree: PackedHierarchy,
    config: PackConfig,
    zoom: ZoomController,
    mode: AnnotationMode,
    styles: Vec<CircleStyle>,
    legend: AuthorLegend,
    measure: M,
}

impl PackingView<MonospaceMeasure> {
    /// Lay out `root` to fit a `width` x `height` container
    pub fn for_container(root: &HierarchyNode, width: f64, height: f64) -> Self {
        Self::new(
            root,
            PackConfig::for_container(width, height),
            ZoomConfig::default(),
            MonospaceMeasure::default(),
        )
    }
}

impl<M: TextMeasure> PackingView<M> {
    pub fn new(root: &HierarchyNode, config: PackConfig, zoom: ZoomConfig, measure: M) -> Self {
        let tree = pack_by_loc(root, &config);
        let mut zoom = ZoomController::new(&tree, zoom);
        zoom.refit(&tree, &measure);

        let mode = AnnotationMode::default();
        let legend = AuthorLegend::build(&tree);
        info!(
            target: "packing",
            nodes = tree.len(),
            diameter = config.diameter,
            authors = legend.len(),
            "hierarchy view ready"
        );

        Self {
            styles: recolor(&tree, mode),
            tree,
            config,
            zoom,
            mode,
            legend,
            measure,
        }
    }

    pub fn tree(&self) -> &PackedHierarchy {
        &self.tree
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    pub fn mode(&self) -> AnnotationMode {
        self.mode
    }

    pub fn focus(&self) -> NodeId {
        self.zoom.focus()
    }

    pub fn viewport(&self) -> Viewport {
        self.zoom.viewport()
    }

    pub fn is_transitioning(&self) -> bool {
        self.zoom.is_transitioning()
    }

    /// Recolour every circle; layout and focus are untouched
    pub fn set_mode(&mut self, mode: AnnotationMode) {
        if mode == self.mode {
            return;
        }
        debug!(target: "packing", from = %self.mode, to = %mode, "annotation mode changed");
        self.mode = mode;
        self.styles = recolor(&self.tree, mode);
    }

    /// The author legend, shown in the knowledge map only
    pub fn legend(&self) -> Option<&AuthorLegend> {
        (self.mode == AnnotationMode::KnowledgeMap).then_some(&self.legend)
    }

    pub fn legend_layout(&self, container_width: f64) -> Option<LegendLayout> {
        self.legend()
            .map(|legend| LegendLayout::compute(legend.len(), container_width, &LegendConfig::default()))
    }

    /// Handle a click on `node` at time `now`, returning the new focus
    pub fn click(&mut self, node: NodeId, modifier: bool, now: Duration) -> NodeId {
        if self.tree.get(node).is_none() {
            return self.zoom.focus();
        }
        self.zoom.click(&self.tree, node, modifier, now)
    }

    /// Background click: back to the root
    pub fn zoom_out(&mut self, modifier: bool, now: Duration) -> NodeId {
        let root = self.tree.root();
        self.zoom.zoom_to(&self.tree, root, modifier, now)
    }

    /// Focus `node` (its parent for a leaf) without animating
    pub fn jump_to(&mut self, node: NodeId) -> NodeId {
        if self.tree.get(node).is_none() {
            return self.zoom.focus();
        }
        let focus = self.zoom.zoom_to(&self.tree, node, false, Duration::ZERO);
        self.zoom.complete(&self.tree, &self.measure);
        focus
    }

    pub fn tick(&mut self, now: Duration) -> ZoomEvent {
        self.zoom.tick(&self.tree, now, &self.measure)
    }

    /// Re-layout for a new container, keeping the focus
    pub fn resize(&mut self, width: f64, height: f64) {
        let config = PackConfig {
            diameter: inner_diameter(width, height, self.config.margin),
            ..self.config
        };
        if config.diameter == self.config.diameter {
            return;
        }
        info!(target: "packing", width, height, diameter = config.diameter, "resizing hierarchy view");
        self.tree.resize(config.diameter);
        self.zoom.resize(&self.tree, config.diameter, &self.measure);
        self.config = config;
    }

    /// Circles in drawing order, projected through the current viewport
    pub fn circles(&self) -> Vec<ScreenCircle> {
        let viewport = self.zoom.viewport();
        self.tree
            .ids()
            .zip(&self.styles)
            .map(|(id, style)| {
                let node = self.tree.node(id);
                let (x, y) = viewport.project(node.x, node.y);
                let class = if node.parent.is_none() {
                    CircleClass::Root
                } else if node.is_leaf() {
                    CircleClass::Leaf
                } else {
                    CircleClass::Node
                };
                ScreenCircle {
                    id,
                    x,
                    y,
                    r: viewport.scale(node.r),
                    class,
                    style: style.clone(),
                }
            })
            .collect()
    }

    /// Labels currently drawn
    pub fn labels(&self) -> Vec<ScreenLabel> {
        let viewport = self.zoom.viewport();
        self.tree
            .ids()
            .zip(self.zoom.labels())
            .filter(|(_, label)| label.display)
            .map(|(id, label)| {
                let node = self.tree.node(id);
                let (x, y) = viewport.project(node.x, node.y);
                ScreenLabel {
                    id,
                    x,
                    y,
                    text: label.text.clone(),
                    opacity: label.opacity,
                    fill_opacity: label.fill_opacity,
                }
            })
            .collect()
    }

    pub fn label_state(&self, id: NodeId) -> Option<&LabelState> {
        self.zoom.labels().get(id.0)
    }

    pub fn tooltip(&self, id: NodeId) -> Option<Tooltip> {
        tooltip(&self.tree, id, self.mode, &self.legend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::KnowledgeInfo;
    use pretty_assertions::assert_eq;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn owned(name: &str, loc: u64, author: &str, color: &str) -> HierarchyNode {
        let mut node = HierarchyNode::file(name, loc);
        node.metrics.knowledge_info = Some(KnowledgeInfo {
            top_authors: [(author.to_string(), 5)].into_iter().collect(),
            author: Some(author.to_string()),
            color: Some(color.to_string()),
        });
        node
    }

    fn view() -> PackingView {
        let root = HierarchyNode::directory(
            "repo",
            vec![
                HierarchyNode::directory(
                    "src",
                    vec![owned("lib.rs", 900, "ann", "#BE0032"), owned("main.rs", 300, "bob", "#F3C300")],
                ),
                owned("README.md", 200, "ann", "#BE0032"),
            ],
        );
        PackingView::for_container(&root, 600.0, 500.0)
    }

    #[test]
    fn test_initial_view() {
        let view = view();
        assert_eq!(view.config().diameter, 490.0);
        assert_eq!(view.mode(), AnnotationMode::KnowledgeMap);
        assert_eq!(view.focus(), view.tree().root());

        let circles = view.circles();
        assert_eq!(circles.len(), 5);
        assert_eq!(circles[0].class, CircleClass::Root);
        assert_eq!(circles[1].class, CircleClass::Node);
        assert_eq!(circles[2].class, CircleClass::Leaf);
        assert!((circles[0].r - 245.0).abs() < 1e-9);

        let names: Vec<String> = view.labels().into_iter().map(|l| l.text).collect();
        assert_eq!(names, vec!["src".to_string(), "README.md".to_string()]);
    }

    #[test]
    fn test_mode_switch_recolors_only() {
        let mut view = view();
        let before = view.circles();
        assert_eq!(before[2].style.fill, "#BE0032");
        assert_eq!(view.legend().map(|l| l.len()), Some(2));

        view.set_mode(AnnotationMode::Bugs);
        let after = view.circles();
        assert_eq!(after[2].style.fill, crate::mode::NEUTRAL_FILL);
        assert_eq!(after[2].r, before[2].r);
        assert!(view.legend().is_none());
        assert!(view.legend_layout(600.0).is_none());
    }

    #[test]
    fn test_click_zooms_and_settles() {
        let mut view = view();
        let src = view.tree().find_path("src").unwrap();

        assert_eq!(view.click(src, false, ms(0)), src);
        assert!(matches!(view.tick(ms(300)), ZoomEvent::Animating { .. }));
        assert!(matches!(view.tick(ms(750)), ZoomEvent::Settled { .. }));

        let circles = view.circles();
        assert!((circles[src.0].r - 245.0).abs() < 1e-6);
        let labels: Vec<String> = view.labels().into_iter().map(|l| l.text).collect();
        assert_eq!(labels, vec!["lib.rs".to_string(), "main.rs".to_string()]);

        // Clicking the focus again goes back to the root
        assert_eq!(view.click(src, false, ms(1000)), view.tree().root());
    }

    #[test]
    fn test_resize_keeps_focus() {
        let mut view = view();
        let src = view.tree().find_path("src").unwrap();
        view.click(src, false, ms(0));
        view.resize(300.0, 300.0);

        assert!(!view.is_transitioning());
        assert_eq!(view.focus(), src);
        assert_eq!(view.config().diameter, 290.0);
        assert!((view.circles()[src.0].r - 145.0).abs() < 1e-6);
    }

    #[test]
    fn test_jump_to_leaf_focuses_parent() {
        let mut view = view();
        let main = view.tree().find_path("src/main.rs").unwrap();
        let src = view.tree().find_path("src").unwrap();

        assert_eq!(view.jump_to(main), src);
        assert!(!view.is_transitioning());
        assert_eq!(view.viewport().k, view.config().diameter / (2.0 * view.tree().node(src).r));
    }

    #[test]
    fn test_tooltip_follows_mode() {
        let mut view = view();
        let lib = view.tree().find_path("src/lib.rs").unwrap();
        assert_eq!(view.tooltip(lib).unwrap().lines[0].label, "ann");

        view.set_mode(AnnotationMode::FileInfo);
        assert_eq!(view.tooltip(lib).unwrap().lines[0].value, "900");
        assert_eq!(view.tooltip(view.tree().root()), None);
    }
}

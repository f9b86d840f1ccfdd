//! Zoom and focus transitions over a packed hierarchy
//!
//! The controller is either idle on a focus node or transitioning towards
//! one. Time is injected as the elapsed [`Duration`] since an arbitrary
//! origin, so the same code runs under `requestAnimationFrame` and in tests.

use crate::labels::{fit_labels, initial_labels, LabelState, TextMeasure};
use crate::pack::{NodeId, PackedHierarchy};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Zoom timing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    #[serde(with = "millis")]
    pub duration: Duration,
    /// Used while a modifier key is held
    #[serde(with = "millis")]
    pub slow_duration: Duration,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(750),
            slow_duration: Duration::from_millis(7500),
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Cubic in-out easing
pub fn ease_cubic_in_out(t: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let t2 = t * t;
    let t3 = t2 * t;
    4.0 * if t < 0.5 { t3 } else { 3.0 * (t - t2) + t3 - 0.75 }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Affine map from layout to screen: `screen = k * layout + t`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub k: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            k: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }
}

impl Viewport {
    /// Map `[x - r, x + r]` onto `[0, diameter]`
    pub fn focused_on(x: f64, y: f64, r: f64, diameter: f64) -> Self {
        if r <= 0.0 {
            return Self::default();
        }
        let k = diameter / (2.0 * r);
        Self {
            k,
            tx: -(x - r) * k,
            ty: -(y - r) * k,
        }
    }

    pub fn project(&self, x: f64, y: f64) -> (f64, f64) {
        (self.k * x + self.tx, self.k * y + self.ty)
    }

    pub fn scale(&self, r: f64) -> f64 {
        self.k * r
    }

    pub fn lerp(&self, other: &Viewport, t: f64) -> Viewport {
        Viewport {
            k: lerp(self.k, other.k, t),
            tx: lerp(self.tx, other.tx, t),
            ty: lerp(self.ty, other.ty, t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LabelTween {
    from_opacity: f64,
    from_fill: f64,
    /// Fill target, participants only
    to_fill: Option<f64>,
}

#[derive(Debug, Clone)]
struct ZoomTransition {
    from: Viewport,
    to: Viewport,
    start: Duration,
    duration: Duration,
    tweens: Vec<LabelTween>,
    /// Participating labels not yet ended
    pending: usize,
}

impl ZoomTransition {
    fn progress(&self, now: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.start).as_secs_f64();
        (elapsed / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }
}

/// What a tick produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomEvent {
    Idle,
    Animating { progress: f64 },
    /// The transition ended and labels were refit at scale `k`
    Settled { focus: NodeId, k: f64 },
}

/// Focus and label state of the hierarchy view
#[derive(Debug, Clone)]
pub struct ZoomController {
    config: ZoomConfig,
    diameter: f64,
    focus: NodeId,
    viewport: Viewport,
    labels: Vec<LabelState>,
    transition: Option<ZoomTransition>,
}

impl ZoomController {
    pub fn new(tree: &PackedHierarchy, config: ZoomConfig) -> Self {
        Self {
            config,
            diameter: tree.diameter(),
            focus: tree.root(),
            viewport: Viewport::default(),
            labels: initial_labels(tree),
            transition: None,
        }
    }

    pub fn focus(&self) -> NodeId {
        self.focus
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn labels(&self) -> &[LabelState] {
        &self.labels
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Scale at which the current focus fills the view
    pub fn focus_scale(&self, tree: &PackedHierarchy) -> f64 {
        let node = tree.node(self.focus);
        if node.r > 0.0 {
            self.diameter / (2.0 * node.r)
        } else {
            1.0
        }
    }

    /// Refit labels at the focus scale without animating
    pub fn refit(&mut self, tree: &PackedHierarchy, measure: &dyn TextMeasure) {
        let k = self.focus_scale(tree);
        fit_labels(tree, &mut self.labels, k, measure);
    }

    /// Zoom to the root when `node` is the focus, to `node` otherwise
    pub fn click(&mut self, tree: &PackedHierarchy, node: NodeId, modifier: bool, now: Duration) -> NodeId {
        let target = if node == self.focus { tree.root() } else { node };
        self.zoom_to(tree, target, modifier, now)
    }

    /// Start a transition towards `target`, or its parent when it is a leaf.
    ///
    /// A transition already in flight is replaced and the new one starts from
    /// the interpolated state of the old one.
    pub fn zoom_to(&mut self, tree: &PackedHierarchy, target: NodeId, modifier: bool, now: Duration) -> NodeId {
        let target = if tree.node(target).is_leaf() {
            tree.parent(target).unwrap_or(target)
        } else {
            target
        };

        // Freeze whatever is in flight at its current interpolated values
        if self.transition.is_some() {
            self.advance(now);
        }
        self.transition = None;

        let previous = self.focus;
        self.focus = target;

        let node = tree.node(target);
        let to = Viewport::focused_on(node.x, node.y, node.r, self.diameter);
        let duration = if modifier {
            self.config.slow_duration
        } else {
            self.config.duration
        };

        let mut pending = 0;
        let mut tweens = Vec::with_capacity(self.labels.len());
        for (id, label) in tree.ids().zip(self.labels.iter_mut()) {
            let parent = tree.node(id).parent;
            let into_focus = parent == Some(target);
            let participant = into_focus || parent == Some(previous);

            if participant {
                if into_focus {
                    label.display = true;
                }
                label.opacity = 0.0;
                pending += 1;
            }

            tweens.push(LabelTween {
                from_opacity: label.opacity,
                from_fill: label.fill_opacity,
                to_fill: participant.then_some(if into_focus { 1.0 } else { 0.0 }),
            });
        }

        debug!(
            target: "zoom",
            from = previous.0,
            to = target.0,
            participants = pending,
            duration_ms = duration.as_millis() as u64,
            "zoom transition started"
        );

        self.transition = Some(ZoomTransition {
            from: self.viewport,
            to,
            start: now,
            duration,
            tweens,
            pending,
        });
        target
    }

    /// Advance the animation to `now`
    pub fn tick(&mut self, tree: &PackedHierarchy, now: Duration, measure: &dyn TextMeasure) -> ZoomEvent {
        let Some(progress) = self.advance(now) else {
            return ZoomEvent::Idle;
        };
        if progress < 1.0 {
            return ZoomEvent::Animating { progress };
        }

        self.finish(tree, measure)
    }

    /// Jump to the end of the running transition, if any
    pub fn complete(&mut self, tree: &PackedHierarchy, measure: &dyn TextMeasure) -> ZoomEvent {
        if let Some(transition) = &self.transition {
            let end = transition.start + transition.duration;
            self.advance(end);
            return self.finish(tree, measure);
        }
        ZoomEvent::Idle
    }

    /// Rescale to a new diameter, keeping the focus
    pub fn resize(&mut self, tree: &PackedHierarchy, diameter: f64, measure: &dyn TextMeasure) {
        self.complete(tree, measure);
        self.diameter = diameter;
        let node = tree.node(self.focus);
        self.viewport = Viewport::focused_on(node.x, node.y, node.r, diameter);
        self.refit(tree, measure);
    }

    /// Interpolate viewport and labels, returning the linear progress
    fn advance(&mut self, now: Duration) -> Option<f64> {
        let transition = self.transition.as_ref()?;
        let progress = transition.progress(now);
        let eased = ease_cubic_in_out(progress);

        self.viewport = transition.from.lerp(&transition.to, eased);
        for (label, tween) in self.labels.iter_mut().zip(&transition.tweens) {
            label.opacity = lerp(tween.from_opacity, 0.0, eased);
            if let Some(to_fill) = tween.to_fill {
                label.fill_opacity = lerp(tween.from_fill, to_fill, eased);
            }
        }
        Some(progress)
    }

    fn finish(&mut self, tree: &PackedHierarchy, measure: &dyn TextMeasure) -> ZoomEvent {
        let Some(mut transition) = self.transition.take() else {
            return ZoomEvent::Idle;
        };
        self.viewport = transition.to;

        for (id, label) in tree.ids().zip(self.labels.iter_mut()) {
            if tree.node(id).parent != Some(self.focus) {
                label.display = false;
            }
        }

        let mut settled = transition.pending == 0;
        for tween in &transition.tweens {
            if tween.to_fill.is_some() {
                transition.pending -= 1;
                if transition.pending == 0 {
                    settled = true;
                }
            }
        }

        let k = self.focus_scale(tree);
        if settled {
            fit_labels(tree, &mut self.labels, k, measure);
        }
        debug!(target: "zoom", focus = self.focus.0, k, "zoom transition settled");
        ZoomEvent::Settled {
            focus: self.focus,
            k,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::HierarchyNode;
    use crate::labels::MonospaceMeasure;
    use crate::pack::{pack_by_loc, PackConfig};
    use pretty_assertions::assert_eq;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn tree() -> PackedHierarchy {
        let root = HierarchyNode::directory(
            "root",
            vec![
                HierarchyNode::directory(
                    "src",
                    vec![
                        HierarchyNode::file("lib.rs", 400),
                        HierarchyNode::file("main.rs", 100),
                    ],
                ),
                HierarchyNode::directory("docs", vec![HierarchyNode::file("guide.md", 200)]),
                HierarchyNode::file("README.md", 50),
            ],
        );
        pack_by_loc(&root, &PackConfig::default())
    }

    fn id(tree: &PackedHierarchy, path: &str) -> NodeId {
        tree.find_path(path).unwrap()
    }

    #[test]
    fn test_easing_endpoints() {
        assert_eq!(ease_cubic_in_out(0.0), 0.0);
        assert_eq!(ease_cubic_in_out(0.5), 0.5);
        assert_eq!(ease_cubic_in_out(1.0), 1.0);
        assert!(ease_cubic_in_out(0.25) < 0.25);
    }

    #[test]
    fn test_initial_labels() {
        let tree = tree();
        let zoom = ZoomController::new(&tree, ZoomConfig::default());
        let src = &zoom.labels()[id(&tree, "src").0];
        let lib = &zoom.labels()[id(&tree, "src/lib.rs").0];

        assert!(src.display);
        assert_eq!(src.fill_opacity, 1.0);
        assert!(!lib.display);
        assert_eq!(lib.fill_opacity, 0.0);
        assert!(!zoom.labels()[0].display);
    }

    #[test]
    fn test_zoom_to_leaf_focuses_parent() {
        let tree = tree();
        let mut zoom = ZoomController::new(&tree, ZoomConfig::default());
        let focus = zoom.zoom_to(&tree, id(&tree, "src/lib.rs"), false, ms(0));
        assert_eq!(focus, id(&tree, "src"));
        assert_eq!(zoom.focus(), focus);
    }

    #[test]
    fn test_transition_settles_once() {
        let tree = tree();
        let measure = MonospaceMeasure::default();
        let mut zoom = ZoomController::new(&tree, ZoomConfig::default());
        let src = id(&tree, "src");

        zoom.zoom_to(&tree, src, false, ms(1000));
        assert!(matches!(zoom.tick(&tree, ms(1375), &measure), ZoomEvent::Animating { .. }));

        let event = zoom.tick(&tree, ms(1750), &measure);
        let node = tree.node(src);
        let k = tree.diameter() / (2.0 * node.r);
        assert_eq!(event, ZoomEvent::Settled { focus: src, k });
        assert_eq!(zoom.tick(&tree, ms(1800), &measure), ZoomEvent::Idle);

        // Focus fills the view
        let (x, y) = zoom.viewport().project(node.x - node.r, node.y - node.r);
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6);

        // Only the focus's children keep their labels
        let labels = zoom.labels();
        assert!(labels[id(&tree, "src/lib.rs").0].display);
        assert!(!labels[id(&tree, "docs").0].display);
        assert_eq!(labels[id(&tree, "src/lib.rs").0].opacity, 1.0);
    }

    #[test]
    fn test_modifier_slows_transition() {
        let tree = tree();
        let measure = MonospaceMeasure::default();
        let mut zoom = ZoomController::new(&tree, ZoomConfig::default());

        zoom.zoom_to(&tree, id(&tree, "docs"), true, ms(0));
        assert!(matches!(zoom.tick(&tree, ms(750), &measure), ZoomEvent::Animating { .. }));
        assert!(matches!(zoom.tick(&tree, ms(7500), &measure), ZoomEvent::Settled { .. }));
    }

    #[test]
    fn test_override_continues_from_interpolated_viewport() {
        let tree = tree();
        let measure = MonospaceMeasure::default();
        let mut zoom = ZoomController::new(&tree, ZoomConfig::default());

        zoom.zoom_to(&tree, id(&tree, "src"), false, ms(0));
        zoom.tick(&tree, ms(375), &measure);
        let midway = zoom.viewport();
        assert!(midway.k > 1.0);

        zoom.zoom_to(&tree, id(&tree, "docs"), false, ms(375));
        // No jump at the start of the new transition
        assert_eq!(zoom.tick(&tree, ms(375), &measure), ZoomEvent::Animating { progress: 0.0 });
        assert_eq!(zoom.viewport(), midway);

        // The interrupted transition never settles; the new one settles once
        let settled: Vec<ZoomEvent> = (0..=20)
            .map(|i| zoom.tick(&tree, ms(375 + i * 50), &measure))
            .filter(|e| matches!(e, ZoomEvent::Settled { .. }))
            .collect();
        assert_eq!(settled.len(), 1);
        assert_eq!(zoom.focus(), id(&tree, "docs"));
    }

    #[test]
    fn test_click_focus_returns_to_root() {
        let tree = tree();
        let measure = MonospaceMeasure::default();
        let mut zoom = ZoomController::new(&tree, ZoomConfig::default());
        let src = id(&tree, "src");

        zoom.click(&tree, src, false, ms(0));
        zoom.complete(&tree, &measure);
        assert_eq!(zoom.click(&tree, src, false, ms(1000)), tree.root());
        zoom.complete(&tree, &measure);
        assert_eq!(zoom.viewport(), Viewport::focused_on(480.0, 480.0, tree.node(tree.root()).r, 960.0));
    }

    #[test]
    fn test_resize_keeps_focus() {
        let mut tree = tree();
        let measure = MonospaceMeasure::default();
        let mut zoom = ZoomController::new(&tree, ZoomConfig::default());
        let docs = id(&tree, "docs");
        zoom.zoom_to(&tree, docs, false, ms(0));

        tree.resize(480.0);
        zoom.resize(&tree, 480.0, &measure);
        assert!(!zoom.is_transitioning());
        assert_eq!(zoom.focus(), docs);
        let node = tree.node(docs);
        let (x, _) = zoom.viewport().project(node.x + node.r, node.y);
        assert!((x - 480.0).abs() < 1e-6);
    }
}

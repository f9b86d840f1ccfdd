//! Circle labels: visibility and truncation at a zoom scale

use crate::pack::{NodeId, PackedHierarchy};
use std::f64::consts::PI;

/// Labels on circles at most this many screen pixels wide are hidden
pub const MIN_LABEL_RADIUS: f64 = 20.0;

const ELLIPSIS: &str = "...";
const TRUNCATE_STEP: usize = 3;

/// Measures rendered text width in pixels
pub trait TextMeasure {
    fn width(&self, text: &str) -> f64;
}

impl<F> TextMeasure for F
where
    F: Fn(&str) -> f64,
{
    fn width(&self, text: &str) -> f64 {
        self(text)
    }
}

/// Fixed advance per character
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasure {
    pub char_width: f64,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self { char_width: 7.0 }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn width(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.char_width
    }
}

/// Result of fitting one label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FittedLabel {
    pub visible: bool,
    pub text: String,
    /// Truncation rounds performed
    pub steps: usize,
}

/// Fit `name` on a circle of layout radius `r` drawn at scale `k`.
///
/// Leaf labels wider than a quarter of the circumference lose three
/// characters per round and gain an ellipsis, until they fit or run out.
/// Directory labels are never shortened.
pub fn fit_label(name: &str, r: f64, k: f64, is_leaf: bool, measure: &dyn TextMeasure) -> FittedLabel {
    let radius = k * r;
    if radius <= MIN_LABEL_RADIUS {
        return FittedLabel {
            visible: false,
            text: name.to_string(),
            steps: 0,
        };
    }

    let limit = PI * radius / 2.0;
    let mut text = name.to_string();
    let mut width = measure.width(&text);
    let mut steps = 0;

    if is_leaf {
        let mut chars: Vec<char> = name.chars().collect();
        while width > limit && !chars.is_empty() {
            let keep = chars.len().saturating_sub(TRUNCATE_STEP);
            chars.truncate(keep);
            text = if chars.is_empty() {
                String::new()
            } else {
                chars.iter().collect::<String>() + ELLIPSIS
            };
            width = measure.width(&text);
            steps += 1;
        }
    }

    FittedLabel {
        visible: true,
        text,
        steps,
    }
}

/// Presentation state of one label
#[derive(Debug, Clone, PartialEq)]
pub struct LabelState {
    pub text: String,
    pub display: bool,
    pub opacity: f64,
    pub fill_opacity: f64,
}

impl LabelState {
    /// Initial state: only the root's children show, and only when large enough
    pub fn initial(tree: &PackedHierarchy, id: NodeId) -> Self {
        let node = tree.node(id);
        let top_level = node.parent == Some(tree.root());
        Self {
            text: node.name.clone(),
            display: top_level,
            opacity: if node.r > MIN_LABEL_RADIUS { 1.0 } else { 0.0 },
            fill_opacity: if top_level { 1.0 } else { 0.0 },
        }
    }

    /// Whether the label ends up drawn at all
    pub fn is_visible(&self) -> bool {
        self.display && self.opacity > 0.0 && self.fill_opacity > 0.0 && !self.text.is_empty()
    }
}

/// Initial label states of every node, in pre-order
pub fn initial_labels(tree: &PackedHierarchy) -> Vec<LabelState> {
    tree.ids().map(|id| LabelState::initial(tree, id)).collect()
}

/// Refit every label at scale `k`
pub fn fit_labels(tree: &PackedHierarchy, labels: &mut [LabelState], k: f64, measure: &dyn TextMeasure) {
    for (id, label) in tree.ids().zip(labels.iter_mut()) {
        let node = tree.node(id);
        let fitted = fit_label(&node.name, node.r, k, node.is_leaf(), measure);
        label.opacity = if fitted.visible { 1.0 } else { 0.0 };
        label.text = fitted.text;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_small_circle_hidden() {
        let fitted = fit_label("main.rs", 10.0, 2.0, true, &MonospaceMeasure::default());
        assert!(!fitted.visible);
        assert_eq!(fitted.text, "main.rs");
    }

    #[test]
    fn test_fits_without_truncation() {
        // Limit is PI * 40 / 2 ~ 62.8px, 7 chars * 7px = 49px
        let fitted = fit_label("main.rs", 20.0, 2.0, true, &MonospaceMeasure::default());
        assert_eq!(
            fitted,
            FittedLabel {
                visible: true,
                text: "main.rs".to_string(),
                steps: 0
            }
        );
    }

    #[test]
    fn test_leaf_truncated_three_at_a_time() {
        // Limit ~ 33px with 1px per char
        let measure = |text: &str| text.chars().count() as f64;
        let name = "a_really_long_file_name_for_testing.rs";
        let fitted = fit_label(name, 21.0, 1.0, true, &measure);

        assert!(fitted.visible);
        assert!(fitted.text.ends_with("..."));
        assert!(measure(&fitted.text) <= PI * 21.0 / 2.0);
        let kept = fitted.text.chars().count() - 3;
        assert_eq!(name.chars().count() - kept, 3 * fitted.steps);
    }

    #[test]
    fn test_truncation_may_empty_label() {
        let wide = |text: &str| if text.is_empty() { 0.0 } else { 1000.0 };
        let fitted = fit_label("abcdefg", 30.0, 1.0, true, &wide);
        assert_eq!(fitted.text, "");
        assert_eq!(fitted.steps, 3);
    }

    #[test]
    fn test_directory_never_truncated() {
        let fitted = fit_label("a_very_long_directory_name", 21.0, 1.0, false, &MonospaceMeasure::default());
        assert!(fitted.visible);
        assert_eq!(fitted.text, "a_very_long_directory_name");
        assert_eq!(fitted.steps, 0);
    }

    #[test]
    fn test_multibyte_names() {
        let fitted = fit_label("ファイル名前テスト.rs", 21.0, 1.0, true, &MonospaceMeasure { char_width: 4.0 });
        assert!(fitted.visible);
        assert!(fitted.text.ends_with("..."));
    }
}

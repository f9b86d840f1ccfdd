//! Circle-packing layout for the file hierarchy
//!
//! Leaves get a radius from their size, siblings are packed around a front
//! chain (largest first) and each directory becomes the smallest circle
//! around its children's bounding-box centre. Padding is applied as a second
//! pass in layout units; the result is scaled to the requested diameter.

use crate::data::{HierarchyNode, NodeMetrics};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Two circles closer than this still count as touching
const TOUCH_EPSILON: f64 = 1e-6;

/// Layout configuration, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Gap between sibling circles
    pub padding: f64,
    /// Space around the root circle
    pub margin: f64,
    /// Diameter of the root circle
    pub diameter: f64,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            padding: 2.0,
            margin: 5.0,
            diameter: 960.0,
        }
    }
}

impl PackConfig {
    /// Fit the root inside a `width` x `height` container, minus margins
    pub fn for_container(width: f64, height: f64) -> Self {
        let mut config = Self::default();
        config.diameter = inner_diameter(width, height, config.margin);
        config
    }

    /// Container side length, margins included
    pub fn outer_diameter(&self) -> f64 {
        self.diameter + 2.0 * self.margin
    }
}

/// Largest root diameter fitting a container
pub fn inner_diameter(width: f64, height: f64, margin: f64) -> f64 {
    (width.min(height) - 2.0 * margin).max(0.0)
}

/// Index of a node in a [`PackedHierarchy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// A laid-out node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackedNode {
    pub name: String,
    pub depth: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Size of the node, summed over descendants for directories
    pub value: f64,
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub metrics: NodeMetrics,
}

impl PackedNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Packed nodes in pre-order, root first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackedHierarchy {
    nodes: Vec<PackedNode>,
    diameter: f64,
}

impl PackedHierarchy {
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn diameter(&self) -> f64 {
        self.diameter
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// # Panics
    ///
    /// Panics when `id` does not belong to this hierarchy.
    pub fn node(&self, id: NodeId) -> &PackedNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&PackedNode> {
        self.nodes.get(id.0)
    }

    pub fn nodes(&self) -> &[PackedNode] {
        &self.nodes
    }

    /// Node ids in pre-order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids().filter(|id| self.node(*id).is_leaf())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Slash-joined names from the root
    pub fn path(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current.and_then(|i| self.get(i)) {
            names.push(node.name.as_str());
            current = node.parent;
        }
        names.reverse();
        names.join("/")
    }

    /// Find a node by a path of names below the root (`"src/lib.rs"`)
    pub fn find_path(&self, path: &str) -> Option<NodeId> {
        let mut current = self.root();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current = *self
                .node(current)
                .children
                .iter()
                .find(|c| self.node(**c).name == part)?;
        }
        Some(current)
    }

    /// Rescale the whole layout to a new root diameter
    pub fn resize(&mut self, diameter: f64) {
        if self.diameter <= 0.0 {
            return;
        }
        let factor = diameter / self.diameter;
        for node in &mut self.nodes {
            node.x *= factor;
            node.y *= factor;
            node.r *= factor;
        }
        self.diameter = diameter;
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Circle {
    x: f64,
    y: f64,
    r: f64,
}

/// Lay out `tree`, sizing leaves with `size_fn`
pub fn pack<F>(tree: &HierarchyNode, size_fn: F, config: &PackConfig) -> PackedHierarchy
where
    F: Fn(&HierarchyNode) -> f64,
{
    let mut nodes = Vec::with_capacity(tree.node_count());
    flatten(tree, None, 0, &size_fn, &mut nodes);

    // Positions are relative to the parent centre until the final pass
    let mut circles: Vec<Circle> = nodes
        .iter()
        .map(|n| Circle {
            r: n.value.max(1.0).sqrt(),
            ..Default::default()
        })
        .collect();

    pack_all(&nodes, &mut circles);

    if config.padding > 0.0 && config.diameter > 0.0 {
        let dr = config.padding * circles[0].r / config.diameter;
        for (node, circle) in nodes.iter().zip(circles.iter_mut()) {
            if node.is_leaf() {
                circle.r += dr;
            }
        }
        pack_all(&nodes, &mut circles);
        for circle in circles.iter_mut() {
            circle.r -= dr;
        }
    }

    let k = if circles[0].r > 0.0 {
        config.diameter / (2.0 * circles[0].r)
    } else {
        0.0
    };
    let centre = config.diameter / 2.0;
    for i in 0..nodes.len() {
        let (px, py) = match nodes[i].parent {
            Some(p) => (nodes[p.0].x, nodes[p.0].y),
            None => (centre, centre),
        };
        nodes[i].x = px + k * circles[i].x;
        nodes[i].y = py + k * circles[i].y;
        nodes[i].r = k * circles[i].r;
    }

    debug!(nodes = nodes.len(), diameter = config.diameter, "packed hierarchy");
    PackedHierarchy {
        nodes,
        diameter: config.diameter,
    }
}

/// Lay out `tree` by lines of code
pub fn pack_by_loc(tree: &HierarchyNode, config: &PackConfig) -> PackedHierarchy {
    pack(tree, |n| n.loc() as f64, config)
}

/// Push `node` and its subtree in pre-order, returning its value
fn flatten<F>(
    node: &HierarchyNode,
    parent: Option<NodeId>,
    depth: usize,
    size_fn: &F,
    out: &mut Vec<PackedNode>,
) -> f64
where
    F: Fn(&HierarchyNode) -> f64,
{
    let id = NodeId(out.len());
    out.push(PackedNode {
        name: node.name.clone(),
        depth,
        parent,
        children: Vec::new(),
        value: 0.0,
        x: 0.0,
        y: 0.0,
        r: 0.0,
        metrics: node.metrics.clone(),
    });

    let value = match node.children.as_deref() {
        Some(children) if !children.is_empty() => {
            let mut total = 0.0;
            for child in children {
                let child_id = NodeId(out.len());
                total += flatten(child, Some(id), depth + 1, size_fn, out);
                out[id.0].children.push(child_id);
            }
            total
        }
        Some(_) => 0.0,
        None => {
            let size = size_fn(node);
            if size.is_finite() && size > 0.0 {
                size
            } else {
                0.0
            }
        }
    };

    out[id.0].value = value;
    value
}

/// Pack every directory bottom-up, setting its radius
fn pack_all(nodes: &[PackedNode], circles: &mut [Circle]) {
    // Children come after their parent in pre-order
    for i in (0..nodes.len()).rev() {
        let node = &nodes[i];
        if node.is_leaf() {
            continue;
        }

        let mut order = node.children.clone();
        order.sort_by(|a, b| nodes[b.0].value.total_cmp(&nodes[a.0].value));

        let mut siblings: Vec<Circle> = order.iter().map(|c| circles[c.0]).collect();
        let r = pack_siblings(&mut siblings);
        for (child, circle) in order.iter().zip(siblings) {
            circles[child.0] = circle;
        }
        circles[i].r = r;
    }
}

/// Place `circles` tangentially in order, centre them on the bounding box
/// and return the enclosing radius
fn pack_siblings(circles: &mut [Circle]) -> f64 {
    let n = circles.len();
    if n == 0 {
        return 0.0;
    }

    circles[0].x = 0.0;
    circles[0].y = 0.0;
    if n > 1 {
        circles[0].x = -circles[1].r;
        circles[1].x = circles[0].r;
        circles[1].y = 0.0;
    }
    if n > 2 {
        front_chain(circles);
    }

    enclose(circles)
}

fn front_chain(circles: &mut [Circle]) {
    let n = circles.len();
    let (x, y) = place(circles[1], circles[0], circles[2].r);
    circles[2].x = x;
    circles[2].y = y;

    let mut next = vec![0usize; n];
    let mut prev = vec![0usize; n];
    next[0] = 1;
    prev[2] = 1;
    next[1] = 2;
    prev[0] = 2;
    next[2] = 0;
    prev[1] = 0;

    let (mut a, mut b) = (0usize, 1usize);
    let mut i = 3;

    'pack: while i < n {
        let (x, y) = place(circles[a], circles[b], circles[i].r);
        circles[i].x = x;
        circles[i].y = y;
        let c = i;

        // Walk the chain from both ends looking for an overlap
        let mut j = next[b];
        let mut k = prev[a];
        let mut sj = circles[b].r;
        let mut sk = circles[a].r;
        loop {
            if sj <= sk {
                if intersects(circles[j], circles[c]) {
                    b = j;
                    next[a] = b;
                    prev[b] = a;
                    continue 'pack;
                }
                sj += circles[j].r;
                j = next[j];
            } else {
                if intersects(circles[k], circles[c]) {
                    a = k;
                    next[a] = b;
                    prev[b] = a;
                    continue 'pack;
                }
                sk += circles[k].r;
                k = prev[k];
            }
            if j == next[k] {
                break;
            }
        }

        prev[c] = a;
        next[c] = b;
        next[a] = c;
        prev[b] = c;
        b = c;

        // Continue from the chain pair closest to the origin
        let mut best = a;
        let mut best_score = score(circles, &next, a);
        let mut cursor = next[b];
        while cursor != b {
            let s = score(circles, &next, cursor);
            if s < best_score {
                best = cursor;
                best_score = s;
            }
            cursor = next[cursor];
        }
        a = best;
        b = next[a];
        i += 1;
    }
}

/// Position a circle of radius `r` tangent to both `b` and `a`
fn place(b: Circle, a: Circle, r: f64) -> (f64, f64) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let d2 = dx * dx + dy * dy;
    if d2 <= 0.0 {
        return (a.x + r, a.y);
    }

    let a2 = (a.r + r) * (a.r + r);
    let b2 = (b.r + r) * (b.r + r);
    if a2 > b2 {
        let x = (d2 + b2 - a2) / (2.0 * d2);
        let y = (b2 / d2 - x * x).max(0.0).sqrt();
        (b.x - x * dx - y * dy, b.y - x * dy + y * dx)
    } else {
        let x = (d2 + a2 - b2) / (2.0 * d2);
        let y = (a2 / d2 - x * x).max(0.0).sqrt();
        (a.x + x * dx - y * dy, a.y + x * dy + y * dx)
    }
}

fn intersects(a: Circle, b: Circle) -> bool {
    let dr = a.r + b.r - TOUCH_EPSILON;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

/// Squared distance from the origin of the weighted midpoint of a chain link
fn score(circles: &[Circle], next: &[usize], node: usize) -> f64 {
    let a = circles[node];
    let b = circles[next[node]];
    let ab = a.r + b.r;
    let dx = (a.x * b.r + b.x * a.r) / ab;
    let dy = (a.y * b.r + b.y * a.r) / ab;
    dx * dx + dy * dy
}

/// Move the bounding-box centre to the origin and return the radius
/// reaching the farthest circle edge
fn enclose(circles: &mut [Circle]) -> f64 {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for c in circles.iter() {
        min_x = min_x.min(c.x - c.r);
        max_x = max_x.max(c.x + c.r);
        min_y = min_y.min(c.y - c.r);
        max_y = max_y.max(c.y + c.r);
    }

    let cx = (min_x + max_x) / 2.0;
    let cy = (min_y + max_y) / 2.0;
    let mut radius: f64 = 0.0;
    for c in circles.iter_mut() {
        c.x -= cx;
        c.y -= cy;
        radius = radius.max(c.r + c.x.hypot(c.y));
    }
    radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_tree() -> HierarchyNode {
        HierarchyNode::directory(
            "root",
            vec![
                HierarchyNode::directory(
                    "src",
                    vec![
                        HierarchyNode::file("lib.rs", 120),
                        HierarchyNode::file("main.rs", 40),
                        HierarchyNode::file("util.rs", 15),
                        HierarchyNode::file("empty.rs", 0),
                        HierarchyNode::directory(
                            "nested",
                            vec![HierarchyNode::file("a.rs", 9), HierarchyNode::file("b.rs", 30)],
                        ),
                    ],
                ),
                HierarchyNode::file("README.md", 60),
                HierarchyNode::file("build.rs", 5),
                HierarchyNode::directory("docs", Vec::new()),
            ],
        )
    }

    fn assert_contained(packed: &PackedHierarchy) {
        for id in packed.ids() {
            let node = packed.node(id);
            if let Some(parent) = node.parent {
                let p = packed.node(parent);
                let dist = (node.x - p.x).hypot(node.y - p.y);
                assert!(
                    dist + node.r <= p.r + 1e-6 * p.r.max(1.0),
                    "{} escapes {}",
                    packed.path(id),
                    packed.path(parent)
                );
            }
        }
    }

    fn assert_disjoint(packed: &PackedHierarchy) {
        for id in packed.ids() {
            let children = &packed.node(id).children;
            for (i, a) in children.iter().enumerate() {
                for b in &children[i + 1..] {
                    let (a, b) = (packed.node(*a), packed.node(*b));
                    let dist = (a.x - b.x).hypot(a.y - b.y);
                    assert!(dist >= a.r + b.r - 1e-6 * packed.diameter(), "{} overlaps {}", a.name, b.name);
                }
            }
        }
    }

    #[test]
    fn test_three_node_tree() {
        let tree = HierarchyNode::directory(
            "root",
            vec![HierarchyNode::file("fileA", 10), HierarchyNode::file("fileB", 30)],
        );
        let packed = pack_by_loc(&tree, &PackConfig::default());

        let root = packed.node(packed.root());
        let a = packed.node(packed.find_path("fileA").unwrap());
        let b = packed.node(packed.find_path("fileB").unwrap());
        assert!(b.r > a.r);
        assert_eq!(root.value, 40.0);
        assert!((root.r - 480.0).abs() < 1e-9);
        assert_eq!((root.x, root.y), (480.0, 480.0));
        assert_contained(&packed);
        assert_disjoint(&packed);
    }

    #[test]
    fn test_nested_containment_and_padding() {
        let config = PackConfig::default();
        let packed = pack_by_loc(&sample_tree(), &config);
        assert_eq!(packed.len(), 12);
        assert_contained(&packed);
        assert_disjoint(&packed);

        // Leaf siblings keep close to the padding between them
        let src = packed.node(packed.find_path("src").unwrap());
        let leaves: Vec<&PackedNode> = src
            .children
            .iter()
            .map(|c| packed.node(*c))
            .filter(|n| n.is_leaf())
            .collect();
        let min_gap = leaves
            .iter()
            .enumerate()
            .flat_map(|(i, a)| leaves[i + 1..].iter().map(move |b| (*a, *b)))
            .map(|(a, b)| (a.x - b.x).hypot(a.y - b.y) - a.r - b.r)
            .fold(f64::INFINITY, f64::min);
        assert!(min_gap >= config.padding * 0.9, "gap {}", min_gap);
    }

    #[test]
    fn test_radius_monotonic_in_size() {
        let packed = pack_by_loc(&sample_tree(), &PackConfig::default());
        let r = |path: &str| packed.node(packed.find_path(path).unwrap()).r;
        assert!(r("src/lib.rs") >= r("src/main.rs"));
        assert!(r("src/main.rs") >= r("src/util.rs"));
        // Zero-size leaves keep the minimum radius
        assert!(r("src/empty.rs") > 0.0);
        assert!((r("src/empty.rs") - r("docs")).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_inputs() {
        let single = pack_by_loc(&HierarchyNode::file("alone", 0), &PackConfig::default());
        assert_eq!(single.len(), 1);
        assert!((single.node(NodeId(0)).r - 480.0).abs() < 1e-9);

        let zeros = HierarchyNode::directory(
            "root",
            (0..7).map(|i| HierarchyNode::file(format!("f{}", i), 0)).collect(),
        );
        let packed = pack_by_loc(&zeros, &PackConfig::default());
        assert_contained(&packed);
        assert_disjoint(&packed);

        let empty = pack_by_loc(&HierarchyNode::directory("root", Vec::new()), &PackConfig::default());
        assert!(empty.node(NodeId(0)).is_leaf());
        assert!(empty.node(NodeId(0)).r.is_finite());
    }

    #[test]
    fn test_pre_order_and_paths() {
        let packed = pack_by_loc(&sample_tree(), &PackConfig::default());
        let names: Vec<&str> = packed.nodes().iter().map(|n| n.name.as_str()).take(4).collect();
        assert_eq!(names, vec!["root", "src", "lib.rs", "main.rs"]);

        let b = packed.find_path("src/nested/b.rs").unwrap();
        assert_eq!(packed.node(b).depth, 3);
        assert_eq!(packed.path(b), "root/src/nested/b.rs");
        assert!(packed.is_ancestor_or_self(packed.root(), b));
        assert!(!packed.is_ancestor_or_self(packed.find_path("docs").unwrap(), b));
        assert_eq!(packed.find_path("src/missing.rs"), None);
    }

    #[test]
    fn test_resize_scales_layout() {
        let mut packed = pack_by_loc(&sample_tree(), &PackConfig::default());
        let before = packed.node(NodeId(2)).clone();
        packed.resize(480.0);
        let after = packed.node(NodeId(2));
        assert!((after.r - before.r / 2.0).abs() < 1e-9);
        assert!((after.x - before.x / 2.0).abs() < 1e-9);
        assert_eq!(packed.diameter(), 480.0);
    }

    #[test]
    fn test_container_diameter() {
        let config = PackConfig::for_container(800.0, 600.0);
        assert_eq!(config.diameter, 590.0);
        assert_eq!(config.outer_diameter(), 600.0);
        assert_eq!(inner_diameter(4.0, 4.0, 5.0), 0.0);
    }
}

//! Retained scene tree.
//!
//! Nodes live in a [`Scene`] arena and link to each other by [`NodeId`]:
//! parent, first and last child, previous and next sibling. A node is drawn
//! relative to its parent; its optional transform applies to itself and all
//! of its descendants.
//!
//! ```
//! use sprite2d::affine::Affine;
//! use sprite2d::scene::{Node, Scene};
//!
//! let mut scene = Scene::new();
//! let root = scene.add_node(Node::new());
//! let child = scene.add_node(Node::new().with_transform(Affine::new_translation(10.0, 0.0)));
//! scene.append_child(root, child);
//! assert_eq!(scene.children(root).collect::<Vec<_>>(), vec![child]);
//! ```

use std::fmt;

use crate::affine::Affine;
use crate::cache::CurveId;
use crate::clock::Time;
use crate::engine::SubTex;

/// Index of a node in its [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Per-frame callback run just before a node is drawn.
///
/// Arrangers animate a node by rewriting its transform, texture or curve.
/// Tree links are not reachable from here; restructure the tree between
/// frames instead.
pub trait Arranger {
    fn arrange(&mut self, node: &mut Node, t: Time);
}

impl<F: FnMut(&mut Node, Time)> Arranger for F {
    fn arrange(&mut self, node: &mut Node, t: Time) {
        self(node, t)
    }
}

/// A drawable element of the tree.
#[derive(Default)]
pub struct Node {
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,

    /// Applied to this node and its descendants, after the parent's.
    pub transform: Option<Affine>,
    /// Region of a texture drawn into the unit square.
    pub sub_tex: Option<SubTex>,
    /// Curve drawn into the unit square scaled to its bounds.
    pub curve: Option<CurveId>,
    arranger: Option<Box<dyn Arranger>>,
}

impl Node {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transform(mut self, m: Affine) -> Self {
        self.transform = Some(m);
        self
    }

    pub fn with_sub_tex(mut self, sub_tex: SubTex) -> Self {
        self.sub_tex = Some(sub_tex);
        self
    }

    pub fn with_curve(mut self, curve: CurveId) -> Self {
        self.curve = Some(curve);
        self
    }

    pub fn with_arranger(mut self, a: impl Arranger + 'static) -> Self {
        self.set_arranger(a);
        self
    }

    pub fn set_arranger(&mut self, a: impl Arranger + 'static) {
        self.arranger = Some(Box::new(a));
    }

    pub fn clear_arranger(&mut self) {
        self.arranger = None;
    }

    pub fn has_arranger(&self) -> bool {
        self.arranger.is_some()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    pub fn last_child(&self) -> Option<NodeId> {
        self.last_child
    }

    pub fn prev_sibling(&self) -> Option<NodeId> {
        self.prev_sibling
    }

    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }

    fn is_attached(&self) -> bool {
        self.parent.is_some() || self.prev_sibling.is_some() || self.next_sibling.is_some()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("parent", &self.parent)
            .field("first_child", &self.first_child)
            .field("last_child", &self.last_child)
            .field("prev_sibling", &self.prev_sibling)
            .field("next_sibling", &self.next_sibling)
            .field("transform", &self.transform)
            .field("sub_tex", &self.sub_tex)
            .field("curve", &self.curve)
            .field("arranger", &self.arranger.is_some())
            .finish()
    }
}

// ============================================================================
// Scene arena
// ============================================================================

/// Owner of every node.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<Node>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a detached node. Any links already set on `node` are discarded.
    pub fn add_node(&mut self, mut node: Node) -> NodeId {
        node.parent = None;
        node.first_child = None;
        node.last_child = None;
        node.prev_sibling = None;
        node.next_sibling = None;
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// # Panics
    ///
    /// If `id` belongs to another scene.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Make `child` the last child of `parent`.
    ///
    /// # Panics
    ///
    /// If `child` already has a parent or siblings, or if `child` is
    /// `parent` or one of its ancestors.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.nodes[child.0].is_attached() {
            panic!("append_child called for an attached child node");
        }
        let mut up = Some(parent);
        while let Some(n) = up {
            if n == child {
                panic!("append_child would make a node its own ancestor");
            }
            up = self.nodes[n.0].parent;
        }
        let last = self.nodes[parent.0].last_child;
        match last {
            Some(l) => self.nodes[l.0].next_sibling = Some(child),
            None => self.nodes[parent.0].first_child = Some(child),
        }
        self.nodes[parent.0].last_child = Some(child);
        let c = &mut self.nodes[child.0];
        c.parent = Some(parent);
        c.prev_sibling = last;
    }

    /// Detach `child` from `parent`. Afterwards it has no parent and no
    /// siblings; its own children stay attached to it.
    ///
    /// # Panics
    ///
    /// If `child`'s parent is not `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.nodes[child.0].parent != Some(parent) {
            panic!("remove_child called for a non-child node");
        }
        let (prev, next) = {
            let c = &self.nodes[child.0];
            (c.prev_sibling, c.next_sibling)
        };
        match prev {
            Some(p) => self.nodes[p.0].next_sibling = next,
            None => self.nodes[parent.0].first_child = next,
        }
        match next {
            Some(n) => self.nodes[n.0].prev_sibling = prev,
            None => self.nodes[parent.0].last_child = prev,
        }
        let c = &mut self.nodes[child.0];
        c.parent = None;
        c.prev_sibling = None;
        c.next_sibling = None;
    }

    /// Direct children of `id`, first to last.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            scene: self,
            next: self.nodes[id.0].first_child,
        }
    }

    /// Run the node's arranger, if it has one.
    pub fn arrange(&mut self, id: NodeId, t: Time) {
        let node = &mut self.nodes[id.0];
        if let Some(mut a) = node.arranger.take() {
            a.arrange(node, t);
            // The arranger may have installed a replacement.
            if node.arranger.is_none() {
                node.arranger = Some(a);
            }
        }
    }
}

/// Iterator over a node's children.
pub struct Children<'a> {
    scene: &'a Scene,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.scene.nodes[id.0].next_sibling;
        Some(id)
    }
}

// ============================================================================
// Tests
// ============================================================================

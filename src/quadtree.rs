//! Point quadtree over spike-pair points
//!
//! Each neuron gets one tree over its spike pairs, built once during the
//! pipeline's first phase and only read afterwards. Storage is an index
//! arena: nodes live in one `Vec`, the pairs themselves in another, and
//! leaves hold small index lists. A leaf splits when it would exceed
//! [`QT_MAX_CAP`] points, which bounds the per-leaf scan of every query.
//!
//! Range queries prune whole subtrees by box intersection and hand every
//! surviving pair to the visitor. No pair-level containment is applied
//! during the traversal, so the visitor sees a superset of the pairs that
//! are strictly inside the region and is the filter of record.

use std::ops::ControlFlow;

use crate::geometry::{BoundingBox, Quadrant};
use crate::spike::SpikePair;

/// Points a leaf holds before it subdivides
pub const QT_MAX_CAP: usize = 4;

/// Index of the root node in the arena
const ROOT: u32 = 0;

#[derive(Debug)]
enum Node {
    /// Up to [`QT_MAX_CAP`] indices into the tree's pair vector
    Leaf { bdry: BoundingBox, items: Vec<u32> },
    /// Four children in NW/SW/NE/SE order. `pinned` holds the rare points
    /// that sit exactly on a split line; strict containment puts those in
    /// no child, so they stay with this node and traversal visits them.
    Internal {
        bdry: BoundingBox,
        children: [u32; 4],
        pinned: Vec<u32>,
    },
}

impl Node {
    fn bdry(&self) -> &BoundingBox {
        match self {
            Node::Leaf { bdry, .. } => bdry,
            Node::Internal { bdry, .. } => bdry,
        }
    }
}

/// Point quadtree storing spike pairs
#[derive(Debug)]
pub struct QuadTree {
    nodes: Vec<Node>,
    pairs: Vec<SpikePair>,
}

impl QuadTree {
    /// Empty tree with the given root boundary
    pub fn new(bdry: BoundingBox) -> Self {
        Self {
            nodes: vec![Node::Leaf {
                bdry,
                items: Vec::new(),
            }],
            pairs: Vec::new(),
        }
    }

    /// Number of stored pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Boundary of the whole tree
    pub fn boundary(&self) -> &BoundingBox {
        self.nodes[ROOT as usize].bdry()
    }

    /// Insert a pair. Returns false iff its point lies outside the root
    /// boundary; the pair is not stored in that case and the caller decides
    /// whether that is an error.
    pub fn insert(&mut self, pair: SpikePair) -> bool {
        let idx = self.pairs.len() as u32;
        self.pairs.push(pair);
        if self.insert_at(ROOT, idx) {
            true
        } else {
            self.pairs.pop();
            false
        }
    }

    fn insert_at(&mut self, node: u32, pair_idx: u32) -> bool {
        let (x, y) = self.pairs[pair_idx as usize].point();
        if !self.nodes[node as usize].bdry().contains_point(x, y) {
            return false;
        }

        let full_leaf = match &mut self.nodes[node as usize] {
            Node::Leaf { items, .. } if items.len() < QT_MAX_CAP => {
                items.push(pair_idx);
                return true;
            }
            Node::Leaf { .. } => true,
            Node::Internal { .. } => false,
        };
        if full_leaf {
            self.subdivide(node);
        }
        self.insert_into_children(node, pair_idx)
    }

    /// Replace a full leaf with an internal node and push its points down.
    /// Children are allocated in NW/SW/NE/SE order and each drained point is
    /// retried against them in that same order.
    fn subdivide(&mut self, node: u32) {
        let bdry = *self.nodes[node as usize].bdry();
        let mut children = [0u32; 4];
        for (slot, q) in Quadrant::ORDER.iter().enumerate() {
            children[slot] = self.nodes.len() as u32;
            self.nodes.push(Node::Leaf {
                bdry: bdry.quadrant(*q),
                items: Vec::new(),
            });
        }

        let replaced = std::mem::replace(
            &mut self.nodes[node as usize],
            Node::Internal {
                bdry,
                children,
                pinned: Vec::new(),
            },
        );
        if let Node::Leaf { items, .. } = replaced {
            for pair_idx in items {
                self.place_in_children(node, children, pair_idx);
            }
        }
    }

    fn insert_into_children(&mut self, node: u32, pair_idx: u32) -> bool {
        let children = match &self.nodes[node as usize] {
            Node::Internal { children, .. } => *children,
            Node::Leaf { .. } => return false,
        };
        self.place_in_children(node, children, pair_idx);
        true
    }

    /// Hand a point already known to be inside `node` to the first child
    /// that takes it, pinning it at `node` when it sits on a split line.
    fn place_in_children(&mut self, node: u32, children: [u32; 4], pair_idx: u32) {
        for child in children {
            if self.insert_at(child, pair_idx) {
                return;
            }
        }
        if let Node::Internal { pinned, .. } = &mut self.nodes[node as usize] {
            pinned.push(pair_idx);
        }
    }

    /// Visit every pair stored in a subtree whose boundary intersects
    /// `region`. Subtrees whose boxes miss the region are pruned; everything
    /// else is handed to the visitor, which returns `Continue` to keep going
    /// or `Break` to stop the whole traversal.
    pub fn query_map<F>(&self, region: &BoundingBox, visitor: &mut F)
    where
        F: FnMut(&SpikePair) -> ControlFlow<()>,
    {
        self.query_node(ROOT, region, visitor);
    }

    fn query_node<F>(&self, node: u32, region: &BoundingBox, visitor: &mut F) -> ControlFlow<()>
    where
        F: FnMut(&SpikePair) -> ControlFlow<()>,
    {
        match &self.nodes[node as usize] {
            Node::Leaf { bdry, items } => {
                if !bdry.intersects(region) {
                    return ControlFlow::Continue(());
                }
                self.visit_items(items, visitor)
            }
            Node::Internal {
                bdry,
                children,
                pinned,
            } => {
                if !bdry.intersects(region) {
                    return ControlFlow::Continue(());
                }
                if self.visit_items(pinned, visitor).is_break() {
                    return ControlFlow::Break(());
                }
                for &child in children {
                    if self.query_node(child, region, visitor).is_break() {
                        return ControlFlow::Break(());
                    }
                }
                ControlFlow::Continue(())
            }
        }
    }

    fn visit_items<F>(&self, items: &[u32], visitor: &mut F) -> ControlFlow<()>
    where
        F: FnMut(&SpikePair) -> ControlFlow<()>,
    {
        for &idx in items {
            if visitor(&self.pairs[idx as usize]).is_break() {
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }
}

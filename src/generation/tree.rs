// src/generation/tree.rs

use std::collections::HashMap;

use rayon::prelude::*;
use serde::Serialize;

use crate::generation::planned_room::{PlannedRoom, RoomKey};

/// Handle to a node of a [`GenerationTree`]. Handles of removed nodes may be
/// reused by later insertions.
pub type NodeId = usize;

#[derive(Debug, Clone)]
struct TreeNode {
    value: PlannedRoom,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Rooted tree of placed rooms with O(1) lookup by room identity.
#[derive(Debug, Clone, Default)]
pub struct GenerationTree {
    nodes: Vec<Option<TreeNode>>,
    free: Vec<NodeId>,
    lookup: HashMap<RoomKey, NodeId>,
    root: Option<NodeId>,
    len: usize,
}

impl GenerationTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `parent`, or as the root when `parent` is `None`.
    ///
    /// # Panics
    /// If a root already exists and `parent` is `None`, if `parent` is not a
    /// live node, or if an equal room is already in the tree.
    pub fn add_node(&mut self, parent: Option<NodeId>, value: PlannedRoom) -> NodeId {
        let key = value.key();
        assert!(!self.lookup.contains_key(&key), "room {:?} is already in the tree", key);
        match parent {
            None => assert!(self.root.is_none(), "tree already has a root"),
            Some(p) => assert!(self.contains(p), "parent node {} does not exist", p),
        }

        let node = TreeNode { value, parent, children: Vec::new() };
        let id = match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        match parent {
            None => self.root = Some(id),
            Some(p) => {
                if let Some(parent) = self.nodes[p].as_mut() {
                    parent.children.push(id);
                }
            }
        }
        self.lookup.insert(key, id);
        self.len += 1;
        id
    }

    /// Detaches `id` from its parent and removes it with its whole subtree.
    /// Removed rooms are returned children first, `id`'s room last.
    pub fn remove_node(&mut self, id: NodeId) -> Vec<PlannedRoom> {
        let Some(parent) = self.nodes.get(id).and_then(Option::as_ref).map(|n| n.parent) else {
            return Vec::new();
        };
        match parent {
            Some(p) => {
                if let Some(parent) = self.nodes[p].as_mut() {
                    parent.children.retain(|&c| c != id);
                }
            }
            None => self.root = None,
        }

        // Preorder collection, then release in reverse so children go first.
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes[next].as_ref() {
                stack.extend(node.children.iter().rev().copied());
                order.push(next);
            }
        }
        let mut removed = Vec::with_capacity(order.len());
        for next in order.into_iter().rev() {
            if let Some(node) = self.nodes[next].take() {
                self.lookup.remove(&node.value.key());
                self.free.push(next);
                self.len -= 1;
                removed.push(node.value);
            }
        }
        removed
    }

    /// Node holding a room equal to `room`.
    pub fn get_node(&self, room: &PlannedRoom) -> Option<NodeId> {
        self.lookup.get(&room.key()).copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id), Some(Some(_)))
    }

    pub fn get(&self, id: NodeId) -> Option<&PlannedRoom> {
        self.nodes.get(id).and_then(Option::as_ref).map(|n| &n.value)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut PlannedRoom> {
        self.nodes.get_mut(id).and_then(Option::as_mut).map(|n| &mut n.value)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(Option::as_ref).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .and_then(Option::as_ref)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Edges between `id` and the root.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(p) = current {
            depth += 1;
            current = self.parent(p);
        }
        depth
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Live nodes in preorder from the root.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.len);
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        order
    }

    /// Rooms in preorder.
    pub fn iter(&self) -> impl Iterator<Item = &PlannedRoom> + '_ {
        self.preorder().into_iter().filter_map(move |id| self.get(id))
    }

    /// Structure-preserving copy with every room passed through `f`.
    pub fn map<U, F>(&self, f: F) -> MappedTree<U>
    where
        F: Fn(&PlannedRoom) -> U,
    {
        let order = self.preorder();
        let values = order.iter().filter_map(|&id| self.get(id)).map(f).collect();
        self.assemble(&order, values)
    }

    /// Like [`map`](Self::map), with `f` applied on the rayon pool.
    pub fn par_map<U, F>(&self, f: F) -> MappedTree<U>
    where
        U: Send,
        F: Fn(&PlannedRoom) -> U + Sync + Send,
    {
        let order = self.preorder();
        let rooms: Vec<&PlannedRoom> = order.iter().filter_map(|&id| self.get(id)).collect();
        let values = rooms.par_iter().map(|room| f(room)).collect();
        self.assemble(&order, values)
    }

    fn assemble<U>(&self, order: &[NodeId], values: Vec<U>) -> MappedTree<U> {
        let position: HashMap<NodeId, usize> = order.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        let nodes = order
            .iter()
            .zip(values)
            .map(|(&id, value)| MappedNode {
                value,
                parent: self.parent(id).and_then(|p| position.get(&p).copied()),
                children: self.children(id).iter().filter_map(|c| position.get(c).copied()).collect(),
            })
            .collect();
        MappedTree { nodes }
    }
}

/// Node of a [`MappedTree`]; links are indices into [`MappedTree::nodes`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedNode<U> {
    pub value: U,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// Detached, preorder-flattened tree; the root, if any, is at index 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedTree<U> {
    pub nodes: Vec<MappedNode<U>>,
}

impl<U> MappedTree<U> {
    pub fn root(&self) -> Option<&MappedNode<U>> {
        self.nodes.first()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &U> + '_ {
        self.nodes.iter().map(|n| &n.value)
    }

    pub fn leaves(&self) -> impl Iterator<Item = &U> + '_ {
        self.nodes.iter().filter(|n| n.children.is_empty()).map(|n| &n.value)
    }
}

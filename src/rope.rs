//! Arena-backed rope of byte fragments
//!
//! A rope is a binary tree whose leaves hold [`ByteStr`] views and whose
//! internal nodes cache the byte length of their left subtree. Nodes live in
//! a dense [`Ropes`] store and refer to each other by [`NodeId`]; parent
//! links are plain indices, so the back-pointers carry no ownership.
//!
//! Nodes are never freed. Splitting and rebalancing build fresh nodes and
//! leave the old ones detached until the arena is cleared.

use std::mem;

use tracing::{debug, trace};

use crate::arena::Arena;
use crate::bytes::ByteStr;
use crate::error::{Result, RopeError};

/// Handle to a node in a [`Ropes`] store
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Holds a contiguous fragment of the text
    Leaf { text: ByteStr },
    /// Joins two subtrees. `count` is the byte length of the left subtree only.
    Internal {
        left: Option<NodeId>,
        right: Option<NodeId>,
        count: usize,
    },
}

#[derive(Clone, Copy, Debug)]
pub struct RopeNode {
    parent: Option<NodeId>,
    kind: NodeKind,
}

impl RopeNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Node store for any number of ropes sharing one arena
pub struct Ropes {
    nodes: Vec<RopeNode>,
    /// Arena generation the stored nodes belong to
    generation: u32,
}

impl Ropes {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generation: 0,
        }
    }

    /// Number of nodes allocated in the current generation, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every node from an older arena generation
    fn sync(&mut self, arena: &Arena) {
        if arena.generation() != self.generation {
            debug!(
                stale = self.nodes.len(),
                generation = arena.generation(),
                "arena was cleared, dropping rope nodes"
            );
            self.nodes.clear();
            self.generation = arena.generation();
        }
    }

    fn alloc(&mut self, arena: &mut Arena, kind: NodeKind) -> Result<NodeId> {
        self.sync(arena);
        arena.reserve::<RopeNode>()?;
        let index = u32::try_from(self.nodes.len()).map_err(|_| RopeError::OutOfCapacity {
            requested: mem::size_of::<RopeNode>(),
            remaining: 0,
        })?;
        self.nodes.push(RopeNode { parent: None, kind });
        Ok(NodeId {
            index,
            generation: self.generation,
        })
    }

    /// Look up a node, rejecting handles from another generation of this store
    fn get(&self, id: NodeId) -> Result<&RopeNode> {
        if id.generation != self.generation {
            return Err(RopeError::StaleHandle {
                handle: id.generation,
                current: self.generation,
            });
        }
        self.nodes
            .get(id.index as usize)
            .ok_or_else(|| RopeError::invariant(format!("unknown rope node {}", id.index)))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut RopeNode> {
        if id.generation != self.generation {
            return Err(RopeError::StaleHandle {
                handle: id.generation,
                current: self.generation,
            });
        }
        self.nodes
            .get_mut(id.index as usize)
            .ok_or_else(|| RopeError::invariant(format!("unknown rope node {}", id.index)))
    }

    /// Check a handle against the arena it is about to be read through
    ///
    /// Every node of a tree shares its root's generation, so checking the
    /// root covers the whole walk.
    fn check_arena(&self, arena: &Arena, root: Option<NodeId>) -> Result<()> {
        match root {
            Some(id) => arena.check_generation(id.generation),
            None => Ok(()),
        }
    }

    /// Look up a node, rejecting handles from before the arena's last clear
    pub fn node(&self, arena: &Arena, id: NodeId) -> Result<&RopeNode> {
        self.check_arena(arena, Some(id))?;
        self.get(id)
    }

    pub fn parent(&self, arena: &Arena, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(arena, id)?.parent)
    }

    pub fn is_leaf(&self, arena: &Arena, id: NodeId) -> Result<bool> {
        Ok(matches!(self.node(arena, id)?.kind, NodeKind::Leaf { .. }))
    }

    /// Create a leaf owning `text`
    pub fn new_leaf(&mut self, arena: &mut Arena, text: ByteStr) -> Result<NodeId> {
        self.alloc(arena, NodeKind::Leaf { text })
    }

    /// Copy `bytes` into the arena and wrap them in a leaf
    pub fn new_leaf_from_bytes(&mut self, arena: &mut Arena, bytes: &[u8]) -> Result<NodeId> {
        let text = arena.alloc_bytes(bytes)?;
        self.new_leaf(arena, text)
    }

    /// Nodes are reclaimed only when the whole arena is cleared; this does nothing.
    pub fn free(&mut self, _id: NodeId) {}

    /// Join two ropes under a new internal node
    ///
    /// Either side may be absent. Both children must be detached roots.
    pub fn concat(
        &mut self,
        arena: &mut Arena,
        left: Option<NodeId>,
        right: Option<NodeId>,
    ) -> Result<NodeId> {
        self.sync(arena);
        if left.is_some() && left == right {
            return Err(RopeError::invariant("cannot concatenate a rope with itself"));
        }
        for child in [left, right].into_iter().flatten() {
            if let Some(parent) = self.get(child)?.parent {
                return Err(RopeError::invariant(format!(
                    "node {} is already a child of node {}",
                    child.index, parent.index
                )));
            }
        }

        let count = self.measure(left)?;
        let id = self.alloc(arena, NodeKind::Internal { left, right, count })?;
        for child in [left, right].into_iter().flatten() {
            self.get_mut(child)?.parent = Some(id);
        }
        trace!(node = id.index, count, "concat");
        Ok(id)
    }

    /// Walk the leaves under `root` from left to right
    fn for_each_leaf<F>(&self, root: Option<NodeId>, mut f: F) -> Result<()>
    where
        F: FnMut(NodeId, ByteStr) -> Result<()>,
    {
        let mut stack: Vec<NodeId> = root.into_iter().collect();
        while let Some(id) = stack.pop() {
            match self.get(id)?.kind {
                NodeKind::Leaf { text } => f(id, text)?,
                NodeKind::Internal { left, right, .. } => {
                    stack.extend(right);
                    stack.extend(left);
                }
            }
        }
        Ok(())
    }

    /// Total byte length, summed over the leaves
    pub fn count(&self, arena: &Arena, root: Option<NodeId>) -> Result<usize> {
        self.check_arena(arena, root)?;
        self.measure(root)
    }

    fn measure(&self, root: Option<NodeId>) -> Result<usize> {
        let mut total = 0;
        self.for_each_leaf(root, |_, text| {
            total += text.len();
            Ok(())
        })?;
        Ok(total)
    }

    pub fn leaf_count(&self, arena: &Arena, root: Option<NodeId>) -> Result<usize> {
        self.check_arena(arena, root)?;
        let mut leaves = 0;
        self.for_each_leaf(root, |_, _| {
            leaves += 1;
            Ok(())
        })?;
        Ok(leaves)
    }

    /// Leaf handles in text order
    pub fn leaves(&self, arena: &Arena, root: Option<NodeId>) -> Result<Vec<NodeId>> {
        self.check_arena(arena, root)?;
        let mut leaves = Vec::new();
        self.for_each_leaf(root, |id, _| {
            leaves.push(id);
            Ok(())
        })?;
        Ok(leaves)
    }

    /// Flatten the rope into a contiguous byte vector
    pub fn text(&self, arena: &Arena, root: Option<NodeId>) -> Result<Vec<u8>> {
        self.check_arena(arena, root)?;
        let mut out = Vec::new();
        self.for_each_leaf(root, |_, text| {
            out.extend_from_slice(arena.get(text)?);
            Ok(())
        })?;
        Ok(out)
    }

    /// Byte at offset `index`, found by descending on the cached counts
    pub fn index(&self, arena: &Arena, root: NodeId, index: usize) -> Result<u8> {
        self.check_arena(arena, Some(root))?;
        let mut id = root;
        let mut offset = index;
        loop {
            match self.get(id)?.kind {
                NodeKind::Internal { left, right, count } => {
                    let next = if offset < count {
                        left
                    } else {
                        offset -= count;
                        right
                    };
                    id = match next {
                        Some(next) => next,
                        None => return Err(self.out_of_range(root, index)),
                    };
                }
                NodeKind::Leaf { text } => {
                    return arena
                        .get(text)?
                        .get(offset)
                        .copied()
                        .ok_or_else(|| self.out_of_range(root, index));
                }
            }
        }
    }

    fn out_of_range(&self, root: NodeId, index: usize) -> RopeError {
        RopeError::IndexOutOfRange {
            index,
            len: self.measure(Some(root)).unwrap_or_default(),
        }
    }

    /// Which child slot of its parent `child` occupies
    fn side_in(&self, parent: NodeId, child: NodeId) -> Result<Side> {
        match self.get(parent)?.kind {
            NodeKind::Internal { left, .. } if left == Some(child) => Ok(Side::Left),
            NodeKind::Internal { right, .. } if right == Some(child) => Ok(Side::Right),
            _ => Err(RopeError::invariant(format!(
                "node {} names {} as parent, which does not hold it",
                child.index, parent.index
            ))),
        }
    }

    /// Store `child` in one slot of `parent`, returning what was there
    fn set_child(
        &mut self,
        parent: NodeId,
        side: Side,
        child: Option<NodeId>,
    ) -> Result<Option<NodeId>> {
        let old = match &mut self.get_mut(parent)?.kind {
            NodeKind::Internal { left, right, .. } => match side {
                Side::Left => mem::replace(left, child),
                Side::Right => mem::replace(right, child),
            },
            NodeKind::Leaf { .. } => {
                return Err(RopeError::invariant(format!(
                    "expected internal node at {}, found leaf",
                    parent.index
                )));
            }
        };
        if let Some(old) = old {
            self.get_mut(old)?.parent = None;
        }
        if let Some(child) = child {
            self.get_mut(child)?.parent = Some(parent);
        }
        Ok(old)
    }

    fn shrink_count(&mut self, id: NodeId, removed: usize) -> Result<()> {
        match &mut self.get_mut(id)?.kind {
            NodeKind::Internal { count, .. } => {
                let cached = *count;
                *count = cached.checked_sub(removed).ok_or_else(|| {
                    RopeError::invariant(format!(
                        "node {} caches {} bytes on the left but {} were removed",
                        id.index, cached, removed
                    ))
                })?;
                Ok(())
            }
            NodeKind::Leaf { .. } => Err(RopeError::invariant(format!(
                "expected internal node at {}, found leaf",
                id.index
            ))),
        }
    }

    /// Split the rope at byte offset `index` into `[0, index)` and `[index, len)`
    ///
    /// Splitting at 0 returns `(None, Some(root))` untouched. Splitting at the
    /// full length returns `(Some(rebalanced), None)`. Otherwise both halves
    /// are rebuilt by [`rebalance`](Self::rebalance); the nodes of the
    /// original tree are left behind in the arena.
    ///
    /// The input tree is rewired in place. If the arena runs out part way
    /// through, it is left in an unspecified shape.
    pub fn split(
        &mut self,
        arena: &mut Arena,
        root: NodeId,
        index: usize,
    ) -> Result<(Option<NodeId>, Option<NodeId>)> {
        self.sync(arena);
        if let Some(parent) = self.get(root)?.parent {
            return Err(RopeError::invariant(format!(
                "cannot split node {} while it is a child of node {}",
                root.index, parent.index
            )));
        }

        let total = self.measure(Some(root))?;
        if index > total {
            return Err(RopeError::IndexOutOfRange { index, len: total });
        }
        if index == 0 {
            return Ok((None, Some(root)));
        }
        if index == total {
            return Ok((Some(self.rebalance(arena, root)?), None));
        }
        debug!(index, total, "splitting rope");

        // Descend to the leaf holding `index`
        let mut id = root;
        let mut offset = index;
        let (leaf, text) = loop {
            match self.get(id)?.kind {
                NodeKind::Internal { left, right, count } => {
                    let next = if offset < count {
                        left
                    } else {
                        offset -= count;
                        right
                    };
                    id = next.ok_or_else(|| {
                        RopeError::invariant(format!(
                            "node {} is missing a child on the split path",
                            id.index
                        ))
                    })?;
                }
                NodeKind::Leaf { text } => break (id, text),
            }
        };
        if offset >= text.len() {
            return Err(RopeError::invariant(format!(
                "split path ended at offset {} of a {}-byte leaf",
                offset,
                text.len()
            )));
        }

        // An interior offset replaces the leaf with a joint of its two halves.
        // The first leaf of the second half is the pivot.
        let mut root = root;
        let pivot = if offset > 0 {
            let (prefix, suffix) = text.split_view(offset)?;
            let head = self.new_leaf(arena, prefix)?;
            let tail = self.new_leaf(arena, suffix)?;
            let joint = self.concat(arena, Some(head), Some(tail))?;

            match self.get(leaf)?.parent {
                Some(parent) => {
                    let side = self.side_in(parent, leaf)?;
                    self.set_child(parent, side, Some(joint))?;
                }
                None => root = joint,
            }
            self.free(leaf);
            trace!(leaf = leaf.index, offset, "split leaf");
            tail
        } else {
            leaf
        };

        // Walk up from the pivot. Wherever the path arrives from a left child,
        // everything to the right of it moves to the second half and the
        // cached left count shrinks by what has been carried off so far.
        let mut second = pivot;
        let mut removed = self.measure(Some(pivot))?;
        let mut child = pivot;
        while child != root {
            let parent = self.get(child)?.parent.ok_or_else(|| {
                RopeError::invariant(format!(
                    "node {} lost its parent before reaching the root",
                    child.index
                ))
            })?;
            let side = self.side_in(parent, child)?;
            if child == pivot {
                self.set_child(parent, side, None)?;
            }
            if side == Side::Left {
                self.shrink_count(parent, removed)?;
                if let Some(sibling) = self.set_child(parent, Side::Right, None)? {
                    removed += self.measure(Some(sibling))?;
                    second = self.concat(arena, Some(second), Some(sibling))?;
                }
            }
            child = parent;
        }

        let first = self.rebalance(arena, root)?;
        let second = self.rebalance(arena, second)?;
        Ok((Some(first), Some(second)))
    }

    /// Flatten the leaves under `root` into a fresh left-folded chain
    ///
    /// This normalises the shape left behind by [`split`](Self::split); it
    /// does not bound the height. Every leaf is re-allocated, so the result
    /// shares no nodes with the input. A height-balanced index over the leaf
    /// sequence (see [`crate::rbtree`]) would replace this fold.
    pub fn rebalance(&mut self, arena: &mut Arena, root: NodeId) -> Result<NodeId> {
        self.sync(arena);
        let mut texts = Vec::new();
        self.for_each_leaf(Some(root), |_, text| {
            texts.push(text);
            Ok(())
        })?;
        debug!(leaves = texts.len(), "rebalancing rope");

        let mut texts = texts.into_iter();
        let first = texts
            .next()
            .ok_or_else(|| RopeError::invariant("cannot rebalance a rope without leaves"))?;
        let mut acc = self.new_leaf(arena, first)?;
        for text in texts {
            let leaf = self.new_leaf(arena, text)?;
            acc = self.concat(arena, Some(acc), Some(leaf))?;
        }
        Ok(acc)
    }

    /// Check cached counts and parent links under `root`
    ///
    /// Returns the total byte length.
    pub fn validate(&self, arena: &Arena, root: NodeId) -> Result<usize> {
        self.check_arena(arena, Some(root))?;
        let mut total = 0;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            match self.get(id)?.kind {
                NodeKind::Leaf { text } => total += text.len(),
                NodeKind::Internal { left, right, count } => {
                    if left.is_some() && left == right {
                        return Err(RopeError::invariant(format!(
                            "node {} holds the same child twice",
                            id.index
                        )));
                    }
                    for child in [left, right].into_iter().flatten() {
                        let parent = self.get(child)?.parent;
                        if parent != Some(id) {
                            return Err(RopeError::invariant(format!(
                                "node {} is held by {} but names {:?} as parent",
                                child.index,
                                id.index,
                                parent.map(|p| p.index)
                            )));
                        }
                    }
                    let actual = self.measure(left)?;
                    if actual != count {
                        return Err(RopeError::invariant(format!(
                            "node {} caches {} but its left subtree holds {}",
                            id.index, count, actual
                        )));
                    }
                    stack.extend(right);
                    stack.extend(left);
                }
            }
        }
        Ok(total)
    }
}

impl Default for Ropes {
    fn default() -> Self {
        Self::new()
    }
}

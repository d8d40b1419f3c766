//! Red-black tree keyed by integer index
//!
//! Nodes are allocated through the shared [`Arena`] and stored densely in an
//! [`RbTree`], linked by [`RbId`] handles. Operations that may move the root
//! take the current root and return the new one instead of mutating it
//! behind a reference.
//!
//! Only insertion is supported. [`RbTree::remove`] reports
//! [`RopeError::NotImplemented`].

use std::mem;

use tracing::trace;

use crate::arena::Arena;
use crate::error::{Result, RopeError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// Handle to a node in an [`RbTree`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RbId {
    index: u32,
    generation: u32,
}

impl RbId {
    pub fn index(&self) -> u32 {
        self.index
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RbNode {
    key: u32,
    color: Color,
    parent: Option<RbId>,
    left: Option<RbId>,
    right: Option<RbId>,
}

impl RbNode {
    pub fn key(&self) -> u32 {
        self.key
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn parent(&self) -> Option<RbId> {
        self.parent
    }

    pub fn left(&self) -> Option<RbId> {
        self.left
    }

    pub fn right(&self) -> Option<RbId> {
        self.right
    }
}

/// Node store for red-black trees sharing one arena
pub struct RbTree {
    nodes: Vec<RbNode>,
    generation: u32,
}

impl RbTree {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generation: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a detached red node holding `key`
    pub fn alloc(&mut self, arena: &mut Arena, key: u32) -> Result<RbId> {
        if arena.generation() != self.generation {
            self.nodes.clear();
            self.generation = arena.generation();
        }
        arena.reserve::<RbNode>()?;
        let index = u32::try_from(self.nodes.len()).map_err(|_| RopeError::OutOfCapacity {
            requested: mem::size_of::<RbNode>(),
            remaining: 0,
        })?;
        self.nodes.push(RbNode {
            key,
            color: Color::Red,
            parent: None,
            left: None,
            right: None,
        });
        Ok(RbId {
            index,
            generation: self.generation,
        })
    }

    fn get(&self, id: RbId) -> Result<&RbNode> {
        if id.generation != self.generation {
            return Err(RopeError::StaleHandle {
                handle: id.generation,
                current: self.generation,
            });
        }
        self.nodes
            .get(id.index as usize)
            .ok_or_else(|| RopeError::invariant(format!("unknown red-black node {}", id.index)))
    }

    fn get_mut(&mut self, id: RbId) -> Result<&mut RbNode> {
        if id.generation != self.generation {
            return Err(RopeError::StaleHandle {
                handle: id.generation,
                current: self.generation,
            });
        }
        self.nodes
            .get_mut(id.index as usize)
            .ok_or_else(|| RopeError::invariant(format!("unknown red-black node {}", id.index)))
    }

    /// Look up a node, rejecting handles from before the arena's last clear
    pub fn node(&self, arena: &Arena, id: RbId) -> Result<&RbNode> {
        arena.check_generation(id.generation)?;
        self.get(id)
    }

    pub fn key(&self, arena: &Arena, id: RbId) -> Result<u32> {
        Ok(self.node(arena, id)?.key)
    }

    pub fn color(&self, arena: &Arena, id: RbId) -> Result<Color> {
        Ok(self.node(arena, id)?.color)
    }

    /// Reject a root from an earlier arena generation; all its nodes share it
    fn check_root(&self, arena: &Arena, root: Option<RbId>) -> Result<()> {
        match root {
            Some(root) => arena.check_generation(root.generation),
            None => Ok(()),
        }
    }

    /// Absent nodes count as black
    fn is_red(&self, id: Option<RbId>) -> Result<bool> {
        match id {
            Some(id) => Ok(self.get(id)?.color == Color::Red),
            None => Ok(false),
        }
    }

    fn set_color(&mut self, id: RbId, color: Color) -> Result<()> {
        self.get_mut(id)?.color = color;
        Ok(())
    }

    fn parent_of(&self, id: RbId) -> Result<RbId> {
        self.get(id)?
            .parent
            .ok_or_else(|| RopeError::invariant(format!("red-black node {} has no parent", id.index)))
    }

    /// Link `node` into the tree rooted at `root` and restore the colouring
    ///
    /// Equal keys go right. Returns the new root.
    pub fn insert(&mut self, arena: &Arena, root: Option<RbId>, node: RbId) -> Result<RbId> {
        self.check_root(arena, root)?;
        let n = self.node(arena, node)?;
        if root == Some(node) || n.parent.is_some() || n.left.is_some() || n.right.is_some() {
            return Err(RopeError::invariant(format!(
                "red-black node {} is already linked into a tree",
                node.index
            )));
        }
        let key = n.key;

        let mut parent = None;
        let mut cursor = root;
        while let Some(x) = cursor {
            parent = Some(x);
            let x = self.get(x)?;
            cursor = if key < x.key { x.left } else { x.right };
        }

        {
            let n = self.get_mut(node)?;
            n.parent = parent;
            n.color = Color::Red;
        }
        let root = match parent {
            None => node,
            Some(p) => {
                let p = self.get_mut(p)?;
                if key < p.key {
                    p.left = Some(node);
                } else {
                    p.right = Some(node);
                }
                root.ok_or_else(|| RopeError::invariant("descent found a parent in an empty tree"))?
            }
        };
        trace!(key, node = node.index, "red-black insert");

        self.fix_up(arena, root, node)
    }

    /// Restore the red-black properties after `node` was inserted red
    ///
    /// Returns the new root.
    pub fn fix_up(&mut self, arena: &Arena, root: RbId, node: RbId) -> Result<RbId> {
        self.check_root(arena, Some(root))?;
        self.check_root(arena, Some(node))?;
        let mut root = root;
        let mut z = node;
        loop {
            let Some(p) = self.get(z)?.parent else {
                break;
            };
            if !self.is_red(Some(p))? {
                break;
            }
            // A red parent is never the root, so the grandparent exists
            let g = self.parent_of(p)?;
            let parent_is_left = self.get(g)?.left == Some(p);
            let uncle = if parent_is_left {
                self.get(g)?.right
            } else {
                self.get(g)?.left
            };

            if self.is_red(uncle)? {
                self.set_color(p, Color::Black)?;
                if let Some(u) = uncle {
                    self.set_color(u, Color::Black)?;
                }
                self.set_color(g, Color::Red)?;
                z = g;
                continue;
            }

            if parent_is_left {
                if self.get(p)?.right == Some(z) {
                    z = p;
                    root = self.rotate_left(arena, root, z)?;
                }
                let p = self.parent_of(z)?;
                let g = self.parent_of(p)?;
                self.set_color(p, Color::Black)?;
                self.set_color(g, Color::Red)?;
                root = self.rotate_right(arena, root, g)?;
            } else {
                if self.get(p)?.left == Some(z) {
                    z = p;
                    root = self.rotate_right(arena, root, z)?;
                }
                let p = self.parent_of(z)?;
                let g = self.parent_of(p)?;
                self.set_color(p, Color::Black)?;
                self.set_color(g, Color::Red)?;
                root = self.rotate_left(arena, root, g)?;
            }
        }
        self.set_color(root, Color::Black)?;
        Ok(root)
    }

    /// Point whichever slot of `x`'s parent held `x` at `y`
    fn replace_in_parent(&mut self, root: RbId, x: RbId, y: RbId) -> Result<RbId> {
        let parent = self.get(x)?.parent;
        self.get_mut(y)?.parent = parent;
        match parent {
            None => Ok(y),
            Some(p) => {
                let p = self.get_mut(p)?;
                if p.left == Some(x) {
                    p.left = Some(y);
                } else {
                    p.right = Some(y);
                }
                Ok(root)
            }
        }
    }

    /// Rotate `x` down to the left of its right child. Returns the new root.
    pub fn rotate_left(&mut self, arena: &Arena, root: RbId, x: RbId) -> Result<RbId> {
        self.check_root(arena, Some(root))?;
        self.check_root(arena, Some(x))?;
        let y = self.get(x)?.right.ok_or_else(|| {
            RopeError::invariant(format!("cannot rotate node {} left without a right child", x.index))
        })?;
        let inner = self.get(y)?.left;
        self.get_mut(x)?.right = inner;
        if let Some(inner) = inner {
            self.get_mut(inner)?.parent = Some(x);
        }
        let root = self.replace_in_parent(root, x, y)?;
        self.get_mut(y)?.left = Some(x);
        self.get_mut(x)?.parent = Some(y);
        Ok(root)
    }

    /// Rotate `x` down to the right of its left child. Returns the new root.
    pub fn rotate_right(&mut self, arena: &Arena, root: RbId, x: RbId) -> Result<RbId> {
        self.check_root(arena, Some(root))?;
        self.check_root(arena, Some(x))?;
        let y = self.get(x)?.left.ok_or_else(|| {
            RopeError::invariant(format!("cannot rotate node {} right without a left child", x.index))
        })?;
        let inner = self.get(y)?.right;
        self.get_mut(x)?.left = inner;
        if let Some(inner) = inner {
            self.get_mut(inner)?.parent = Some(x);
        }
        let root = self.replace_in_parent(root, x, y)?;
        self.get_mut(y)?.right = Some(x);
        self.get_mut(x)?.parent = Some(y);
        Ok(root)
    }

    /// Deletion is not supported yet
    pub fn remove(&mut self, _root: RbId, _node: RbId) -> Result<Option<RbId>> {
        Err(RopeError::NotImplemented("red-black deletion"))
    }

    /// First node holding `key`, if any
    pub fn find(&self, arena: &Arena, root: Option<RbId>, key: u32) -> Result<Option<RbId>> {
        self.check_root(arena, root)?;
        let mut cursor = root;
        while let Some(x) = cursor {
            let n = self.get(x)?;
            if key == n.key {
                return Ok(Some(x));
            }
            cursor = if key < n.key { n.left } else { n.right };
        }
        Ok(None)
    }

    /// Keys in in-order sequence
    pub fn in_order(&self, arena: &Arena, root: Option<RbId>) -> Result<Vec<u32>> {
        self.check_root(arena, root)?;
        let mut keys = Vec::new();
        let mut stack = Vec::new();
        let mut cursor = root;
        loop {
            while let Some(x) = cursor {
                stack.push(x);
                cursor = self.get(x)?.left;
            }
            let Some(x) = stack.pop() else {
                break;
            };
            let n = self.get(x)?;
            keys.push(n.key);
            cursor = n.right;
        }
        Ok(keys)
    }

    /// Check every red-black property under `root` and return its black height
    pub fn validate(&self, arena: &Arena, root: Option<RbId>) -> Result<usize> {
        let Some(root) = root else {
            return Ok(0);
        };
        self.check_root(arena, Some(root))?;
        let r = self.get(root)?;
        if r.parent.is_some() {
            return Err(RopeError::invariant(format!(
                "root {} has a parent",
                root.index
            )));
        }
        if r.color != Color::Black {
            return Err(RopeError::invariant(format!("root {} is red", root.index)));
        }
        let keys = self.in_order(arena, Some(root))?;
        if keys.windows(2).any(|w| w[0] > w[1]) {
            return Err(RopeError::invariant("keys are out of order"));
        }
        self.black_height(root)
    }

    fn black_height(&self, id: RbId) -> Result<usize> {
        let n = self.get(id)?;
        let mut heights = [0usize; 2];
        for (slot, child) in [n.left, n.right].into_iter().enumerate() {
            let Some(child) = child else {
                continue;
            };
            let c = self.get(child)?;
            if c.parent != Some(id) {
                return Err(RopeError::invariant(format!(
                    "node {} is held by {} but names {:?} as parent",
                    child.index,
                    id.index,
                    c.parent.map(|p| p.index)
                )));
            }
            if n.color == Color::Red && c.color == Color::Red {
                return Err(RopeError::invariant(format!(
                    "red node {} has red child {}",
                    id.index, child.index
                )));
            }
            heights[slot] = self.black_height(child)?;
        }
        if heights[0] != heights[1] {
            return Err(RopeError::invariant(format!(
                "node {} has black heights {} and {}",
                id.index, heights[0], heights[1]
            )));
        }
        Ok(heights[0] + usize::from(n.color == Color::Black))
    }
}

impl Default for RbTree {
    fn default() -> Self {
        Self::new()
    }
}

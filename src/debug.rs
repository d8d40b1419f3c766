//! Structural dumps of ropes and red-black trees
//!
//! Each node is printed on its own line, prefixed by one dash per level of
//! depth; children are indented two levels deeper than their parent. The
//! format is diagnostic only.

use std::io::Write;

use bstr::BStr;

use crate::arena::Arena;
use crate::error::Result;
use crate::rbtree::{Color, RbId, RbTree};
use crate::rope::{NodeId, NodeKind, Ropes};

fn indent<W: Write>(writer: &mut W, depth: usize) -> Result<()> {
    writer.write_all("-".repeat(depth).as_bytes())?;
    Ok(())
}

/// Dump a rope: `[count]` for internal nodes, the text for leaves
pub fn print_rope<W: Write>(
    writer: &mut W,
    ropes: &Ropes,
    arena: &Arena,
    node: Option<NodeId>,
    depth: usize,
) -> Result<()> {
    indent(writer, depth)?;
    let Some(node) = node else {
        writeln!(writer, "null")?;
        return Ok(());
    };

    match *ropes.node(arena, node)?.kind() {
        NodeKind::Leaf { text } => {
            writeln!(writer, "{}", BStr::new(arena.get(text)?))?;
        }
        NodeKind::Internal { left, right, count } => {
            writeln!(writer, "[{}]", count)?;
            print_rope(writer, ropes, arena, left, depth + 2)?;
            print_rope(writer, ropes, arena, right, depth + 2)?;
        }
    }
    Ok(())
}

/// Dump a red-black tree as `key (R|B)` lines
pub fn print_rbtree<W: Write>(
    writer: &mut W,
    tree: &RbTree,
    arena: &Arena,
    node: Option<RbId>,
    depth: usize,
) -> Result<()> {
    indent(writer, depth)?;
    let Some(node) = node else {
        writeln!(writer, "null")?;
        return Ok(());
    };

    let n = tree.node(arena, node)?;
    let color = match n.color() {
        Color::Red => 'R',
        Color::Black => 'B',
    };
    writeln!(writer, "{} ({})", n.key(), color)?;
    if n.left().is_some() || n.right().is_some() {
        print_rbtree(writer, tree, arena, n.left(), depth + 2)?;
        print_rbtree(writer, tree, arena, n.right(), depth + 2)?;
    }
    Ok(())
}

use std::io::Write;

use crate::arena::Arena;
use crate::error::Result;
use crate::rope::{NodeId, NodeKind, Ropes};

/// Write the flattened text of a rope followed by a newline
///
/// An absent rope prints as `null`.
pub fn write_rope<W: Write>(
    writer: &mut W,
    ropes: &Ropes,
    arena: &Arena,
    root: Option<NodeId>,
) -> Result<()> {
    match root {
        None => writer.write_all(b"null")?,
        Some(root) => {
            for leaf in ropes.leaves(arena, Some(root))? {
                if let NodeKind::Leaf { text } = ropes.node(arena, leaf)?.kind() {
                    writer.write_all(arena.get(*text)?)?;
                }
            }
        }
    }
    writer.write_all(b"\n")?;
    Ok(())
}

/// Write one split result: a numbered header and both halves
pub fn write_split<W: Write>(
    writer: &mut W,
    ropes: &Ropes,
    arena: &Arena,
    offset: usize,
    halves: (Option<NodeId>, Option<NodeId>),
) -> Result<()> {
    writeln!(writer, "[{}]---------------------------", offset)?;
    write_rope(writer, ropes, arena, halves.0)?;
    write_rope(writer, ropes, arena, halves.1)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RopeError;

    #[test]
    fn test_write_rope() {
        let mut arena = Arena::new(4096);
        let mut ropes = Ropes::new();
        let a = ropes.new_leaf_from_bytes(&mut arena, b"Hello, ").unwrap();
        let b = ropes.new_leaf_from_bytes(&mut arena, b"World!").unwrap();
        let root = ropes.concat(&mut arena, Some(a), Some(b)).unwrap();

        let mut output = Vec::new();
        write_rope(&mut output, &ropes, &arena, Some(root)).unwrap();
        assert_eq!(output, b"Hello, World!\n");
    }

    #[test]
    fn test_write_absent_rope() {
        let arena = Arena::new(0);
        let ropes = Ropes::new();
        let mut output = Vec::new();
        write_rope(&mut output, &ropes, &arena, None).unwrap();
        assert_eq!(output, b"null\n");
    }

    #[test]
    fn test_write_rope_rejects_cleared_arena() {
        let mut arena = Arena::new(4096);
        let mut ropes = Ropes::new();
        let root = ropes.new_leaf_from_bytes(&mut arena, b"secret").unwrap();
        arena.clear();
        arena.alloc_bytes(b"REUSED").unwrap();

        let mut output = Vec::new();
        let err = write_rope(&mut output, &ropes, &arena, Some(root)).unwrap_err();
        assert!(matches!(err, RopeError::StaleHandle { handle: 0, current: 1 }));
        assert!(output.is_empty());
    }

    #[test]
    fn test_write_split() {
        let mut arena = Arena::new(4096);
        let mut ropes = Ropes::new();
        let root = ropes.new_leaf_from_bytes(&mut arena, b"abc").unwrap();
        let halves = ropes.split(&mut arena, root, 1).unwrap();

        let mut output = Vec::new();
        write_split(&mut output, &ropes, &arena, 1, halves).unwrap();
        assert_eq!(output, b"[1]---------------------------\na\nbc\n");
    }
}

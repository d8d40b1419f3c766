//! Arena-backed rope with offset split/concat, plus a red-black index tree
//!
//! Every node and every text byte is carved from one [`arena::Arena`].
//! [`rope::Ropes`] and [`rbtree::RbTree`] are independent node stores that
//! share that arena; the rope does not consume the red-black tree yet.

pub mod arena;
pub mod bytes;
pub mod cli;
pub mod config;
pub mod debug;
pub mod error;
pub mod input;
pub mod output;
pub mod rbtree;
pub mod rope;

pub use arena::Arena;
pub use bytes::ByteStr;
pub use error::{Result, RopeError};
pub use rbtree::{Color, RbId, RbTree};
pub use rope::{NodeId, NodeKind, Ropes};

use crate::cli::Args;
use crate::error::Result;

/// Fragments used when no pieces or files are given
pub const DEMO_PIECES: [&str; 6] = [
    "Hello, ",
    "Rope!",
    "_How was your day",
    "NO GOOD",
    " Pajaro Loco!",
    " ABCDEFG",
];

/// Runtime configuration derived from CLI arguments
#[derive(Clone, Debug)]
pub struct Config {
    pub capacity: usize,
    /// Explicit split offsets; empty means every offset
    pub splits: Vec<usize>,
    pub input_files: Vec<String>,
    pub record_delimiter: u8,
    pub tree: bool,
    pub rb_keys: Vec<u32>,
    pub log_level: String,
    pub pieces: Vec<Vec<u8>>,
}

impl Config {
    /// Build configuration from parsed CLI arguments
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Config {
            capacity: args.arena_capacity()?,
            splits: args.splits.clone(),
            input_files: args.files.clone(),
            record_delimiter: args.record_delimiter(),
            tree: args.tree,
            rb_keys: args.rb_keys.clone(),
            log_level: args.log_level.clone(),
            pieces: args.pieces.iter().map(|p| p.as_bytes().to_vec()).collect(),
        })
    }

    /// Whether the built-in demo rope should be used
    pub fn use_demo(&self) -> bool {
        self.pieces.is_empty() && self.input_files.is_empty()
    }

    /// Offsets to split at for a rope of `len` bytes
    pub fn split_offsets(&self, len: usize) -> Vec<usize> {
        if self.splits.is_empty() {
            (0..=len).collect()
        } else {
            self.splits.clone()
        }
    }
}

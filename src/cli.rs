use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "rrope", about = "Split and re-join an arena-backed rope")]
pub struct Args {
    /// Arena capacity in bytes, with optional K, M or G suffix
    #[arg(short = 'c', long, value_name = "SIZE", default_value = "124M")]
    pub capacity: String,

    /// Split at OFFSET instead of every offset (repeatable)
    #[arg(short = 's', long = "split", value_name = "OFFSET")]
    pub splits: Vec<usize>,

    /// Read rope pieces from FILE, one per record ('-' for stdin)
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub files: Vec<String>,

    /// Use NUL as record delimiter for --file input
    #[arg(short = 'z', long = "zero-terminated")]
    pub zero_terminated: bool,

    /// Print the tree structure after every split
    #[arg(long)]
    pub tree: bool,

    /// Insert KEY into a red-black index tree and print it (repeatable)
    #[arg(long = "rb", value_name = "KEY")]
    pub rb_keys: Vec<u32>,

    /// Log filter passed to the tracing subscriber
    #[arg(long, value_name = "FILTER", default_value = "warn")]
    pub log_level: String,

    /// Text pieces, one leaf each
    #[arg(value_name = "PIECE")]
    pub pieces: Vec<String>,
}

impl Args {
    /// Parse --capacity, accepting binary K/M/G suffixes
    pub fn arena_capacity(&self) -> crate::error::Result<usize> {
        let s = self.capacity.trim();
        let invalid = || crate::error::RopeError::InvalidCapacity(self.capacity.clone());

        let (digits, scale) = match s.as_bytes().last() {
            Some(b'k' | b'K') => (&s[..s.len() - 1], 1usize << 10),
            Some(b'm' | b'M') => (&s[..s.len() - 1], 1usize << 20),
            Some(b'g' | b'G') => (&s[..s.len() - 1], 1usize << 30),
            Some(_) => (s, 1),
            None => return Err(invalid()),
        };

        digits
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_mul(scale))
            .ok_or_else(invalid)
    }

    /// Get the record delimiter (newline or NUL)
    pub fn record_delimiter(&self) -> u8 {
        if self.zero_terminated {
            0u8
        } else {
            b'\n'
        }
    }
}

use std::io::{self, BufWriter, Write};

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use rrope::cli::Args;
use rrope::config::{Config, DEMO_PIECES};
use rrope::debug::{print_rbtree, print_rope};
use rrope::error::Result;
use rrope::{input, output, Arena, NodeId, RbTree, Ropes};

/// Set up SIGPIPE handling for Unix systems
/// This prevents "broken pipe" errors when output is piped to commands like `head`
#[cfg(unix)]
fn setup_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

#[cfg(not(unix))]
fn setup_sigpipe() {
    // Windows doesn't have SIGPIPE
}

/// Install the stderr subscriber; an unparsable filter falls back to `warn`
fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    setup_sigpipe();

    if let Err(e) = run() {
        eprintln!("rrope: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_args(&args)?;
    init_logging(&config.log_level);

    let mut arena = Arena::new(config.capacity);
    let mut ropes = Ropes::new();
    let mut rope = build_rope(&mut arena, &mut ropes, &config)?;
    let len = ropes.count(&arena, Some(rope))?;
    let leaves = ropes.leaf_count(&arena, Some(rope))?;
    info!(capacity = config.capacity, len, leaves, "built rope");

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    // Split, print both halves, then glue them back for the next offset
    for offset in config.split_offsets(len) {
        let (first, second) = ropes.split(&mut arena, rope, offset)?;
        output::write_split(&mut out, &ropes, &arena, offset, (first, second))?;
        if config.tree {
            print_rope(&mut out, &ropes, &arena, first, 0)?;
            print_rope(&mut out, &ropes, &arena, second, 0)?;
        }
        rope = ropes.concat(&mut arena, first, second)?;
    }

    if !config.rb_keys.is_empty() {
        let mut tree = RbTree::new();
        let mut root = None;
        for &key in &config.rb_keys {
            let node = tree.alloc(&mut arena, key)?;
            root = Some(tree.insert(&arena, root, node)?);
        }
        writeln!(out, "red-black tree")?;
        print_rbtree(&mut out, &tree, &arena, root, 0)?;
        writeln!(out, "black height: {}", tree.validate(&arena, root)?)?;
    }

    debug!(
        used = arena.used(),
        remaining = arena.remaining(),
        nodes = ropes.len(),
        "arena usage"
    );
    out.flush()?;
    Ok(())
}

/// Build the rope from pieces and files, or the demo rope when neither is given
fn build_rope(arena: &mut Arena, ropes: &mut Ropes, config: &Config) -> Result<NodeId> {
    if config.use_demo() {
        let leaves = DEMO_PIECES
            .iter()
            .map(|piece| ropes.new_leaf_from_bytes(arena, piece.as_bytes()))
            .collect::<Result<Vec<_>>>()?;
        let head = ropes.concat(arena, Some(leaves[0]), Some(leaves[1]))?;
        let tail = ropes.concat(arena, Some(leaves[2]), Some(leaves[3]))?;
        let body = ropes.concat(arena, Some(head), Some(tail))?;
        let body = ropes.concat(arena, Some(body), Some(leaves[4]))?;
        return ropes.concat(arena, Some(body), Some(leaves[5]));
    }

    let mut pieces = config.pieces.clone();
    for path in &config.input_files {
        let reader = input::open_input(path)?;
        pieces.extend(input::read_pieces(reader, config.record_delimiter)?);
    }

    let mut root = None;
    for piece in &pieces {
        let leaf = ropes.new_leaf_from_bytes(arena, piece)?;
        root = Some(match root {
            None => leaf,
            Some(root) => ropes.concat(arena, Some(root), Some(leaf))?,
        });
    }
    match root {
        Some(root) => Ok(root),
        None => ropes.new_leaf_from_bytes(arena, b""),
    }
}

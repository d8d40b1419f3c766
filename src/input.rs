use std::fs::File;
use std::io::{self, BufRead, BufReader};

/// Open a piece source; "-" is stdin
pub fn open_input(path: &str) -> io::Result<Box<dyn BufRead>> {
    if path == "-" {
        Ok(Box::new(BufReader::new(io::stdin().lock())))
    } else {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

/// Read every record from a reader as a rope piece
///
/// The delimiter is stripped; a missing final delimiter is tolerated and
/// empty records are kept.
pub fn read_pieces<R: BufRead>(reader: R, delimiter: u8) -> io::Result<Vec<Vec<u8>>> {
    reader.split(delimiter).collect()
}

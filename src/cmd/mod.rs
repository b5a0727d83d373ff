use chespi::error::ChespiResult;
use chespi::model::loader::{parse_sequence, read_sequence};
use std::path::Path;

pub mod predict;
pub mod score;

/// A reference assignment given inline or as a file (FASTA headers skipped).
/// Loops must be written as `-`, `C` or `L`; whitespace is dropped.
pub fn read_reference(arg: &str) -> ChespiResult<String> {
    if Path::new(arg).exists() {
        read_sequence(arg)
    } else {
        Ok(parse_sequence(arg))
    }
}

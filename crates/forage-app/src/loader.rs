//! Grid file loading.
//!
//! A grid file holds one row per line: whitespace-separated non-negative
//! integers. Blank lines are skipped. Squareness is validated by the core
//! when the grid is constructed, not here.

use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading or tokenizing a grid file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read grid file: {0}")]
    Io(#[from] io::Error),
    /// A token did not parse as a non-negative integer.
    #[error("line {line}: {token:?} is not a non-negative integer")]
    BadToken { line: usize, token: String },
}

/// Read and tokenize a grid file into a row-major baseline matrix.
pub fn load_grid(path: &Path) -> Result<Vec<Vec<f64>>, LoadError> {
    parse_grid(&fs::read_to_string(path)?)
}

/// Tokenize grid text into a row-major baseline matrix.
pub fn parse_grid(text: &str) -> Result<Vec<Vec<f64>>, LoadError> {
    let mut rows = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut row = Vec::new();
        for token in line.split_whitespace() {
            let value: u64 = token.parse().map_err(|_| LoadError::BadToken {
                line: index + 1,
                token: token.to_string(),
            })?;
            row.push(value as f64);
        }
        rows.push(row);
    }
    Ok(rows)
}

//! Command-line front end for the foraging decision core: grid file
//! loading and argument parsing helpers shared by the `forage` binary.

pub mod loader;

use forage_core::Cell;

/// Parse a `row,col` starting coordinate from the command line.
pub fn parse_start(raw: &str) -> Result<Cell, String> {
    let (row, col) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected `row,col`, got {raw:?}"))?;
    let row = row
        .trim()
        .parse()
        .map_err(|_| format!("{:?} is not a valid row index", row.trim()))?;
    let col = col
        .trim()
        .parse()
        .map_err(|_| format!("{:?} is not a valid column index", col.trim()))?;
    Ok(Cell::new(row, col))
}

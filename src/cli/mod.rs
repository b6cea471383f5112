//! Command-line front end.

mod args;

pub use args::Args;

use std::io::{self, BufRead, Write};

/// Ask once whether `count` source files may be overwritten.
///
/// Only an explicit `y`/`yes` (any case) confirms; end of input declines.
pub fn confirm_overwrite<R: BufRead, W: Write>(input: &mut R, output: &mut W, count: usize) -> io::Result<bool> {
    write!(
        output,
        "Overwrite {} file{} in place? [y/N] ",
        count,
        if count == 1 { "" } else { "s" }
    )?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

//! Line-oriented JSON I/O
//!
//! - Input: one JSON request per line
//! - Output: one JSON response per line
//! - UTF-8 only

use std::io::{BufRead, Write};

use super::errors::CliResult;

/// Reads the next non-blank line, or `None` at end of input.
pub fn read_request<R: BufRead>(reader: &mut R) -> CliResult<Option<String>> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            return Ok(Some(trimmed.to_string()));
        }
    }
}

/// Writes one JSON line and flushes.
pub fn write_json<W: Write>(writer: &mut W, json: &str) -> CliResult<()> {
    writeln!(writer, "{}", json)?;
    writer.flush()?;
    Ok(())
}

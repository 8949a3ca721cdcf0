//! Metric line parser.
//!
//! Validates and splits `<name> <value> <timestamp>` lines in one pass over
//! the bytes. The caller strips the trailing newline (and any trailing CR)
//! before handing the slice over.

use crate::error::{FilterError, Result};

/// A validated metric line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMetric {
    /// Dot-separated metric name.
    pub name: String,
    /// Sample value.
    pub value: f64,
    /// Unix timestamp in seconds, never zero.
    pub timestamp: i64,
}

/// Parses one metric line.
///
/// Rejects lines containing non-ASCII or non-printable bytes, lines without
/// exactly two spaces, empty names, unparsable values, and zero timestamps.
///
/// # Errors
///
/// Returns [`FilterError::Parse`] with the offending line preserved.
pub fn parse_line(line: &[u8]) -> Result<ParsedMetric> {
    let mut spaces = [0usize; 2];
    let mut space_count = 0usize;

    for (i, &b) in line.iter().enumerate() {
        if b > 0x7E || (b < 0x20 && b != b' ') {
            return Err(FilterError::parse(line, "non-printable or non-ascii byte"));
        }
        if b == b' ' {
            if space_count < 2 {
                spaces[space_count] = i;
            }
            space_count += 1;
        }
    }
    if space_count != 2 {
        return Err(FilterError::parse(
            line,
            format!("expected 2 spaces, found {space_count}"),
        ));
    }

    let name = &line[..spaces[0]];
    if name.is_empty() {
        return Err(FilterError::parse(line, "empty metric name"));
    }

    // All bytes were checked printable ASCII above.
    let value_str = std::str::from_utf8(&line[spaces[0] + 1..spaces[1]])
        .map_err(|_| FilterError::parse(line, "non-utf8 value"))?;
    let value: f64 = value_str
        .parse()
        .map_err(|_| FilterError::parse(line, format!("invalid value {value_str:?}")))?;

    let ts_str = std::str::from_utf8(&line[spaces[1] + 1..])
        .map_err(|_| FilterError::parse(line, "non-utf8 timestamp"))?;
    let timestamp: i64 = ts_str
        .parse()
        .map_err(|_| FilterError::parse(line, format!("invalid timestamp {ts_str:?}")))?;
    if timestamp == 0 {
        return Err(FilterError::parse(line, "zero timestamp"));
    }

    let name = std::str::from_utf8(name)
        .map_err(|_| FilterError::parse(line, "non-utf8 name"))?
        .to_string();

    Ok(ParsedMetric {
        name,
        value,
        timestamp,
    })
}

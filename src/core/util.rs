//! Common utilities

use anyhow::{bail, Result};

/// Parse a 1-indexed inclusive line range ("START:END" or "N") into zero-based bounds
pub fn parse_line_range(spec: &str) -> Result<(usize, usize)> {
    let (start, end) = match spec.split_once(':') {
        Some((s, e)) => (s.trim(), e.trim()),
        None => (spec.trim(), spec.trim()),
    };

    let start: usize = match start.parse() {
        Ok(n) => n,
        Err(_) => bail!("Invalid start line: '{}'", start),
    };
    let end: usize = match end.parse() {
        Ok(n) => n,
        Err(_) => bail!("Invalid end line: '{}'", end),
    };

    if start < 1 {
        bail!("start line must be >= 1, got {}", start);
    }
    if end < start {
        bail!("end line ({}) must be >= start line ({})", end, start);
    }

    Ok((start - 1, end - 1))
}

/// Convert a 1-based position from the command line into an index
pub fn parse_position(position: usize) -> Result<usize> {
    if position < 1 {
        bail!("positions are 1-based, got {}", position);
    }
    Ok(position - 1)
}

/// Whether two inclusive ranges share at least one line
pub fn ranges_overlap(a: (usize, usize), b: (usize, usize)) -> bool {
    a.0 <= b.1 && b.0 <= a.1
}

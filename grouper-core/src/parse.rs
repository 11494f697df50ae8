//! Line-oriented point input.
//!
//! Grammar: a non-empty line contains `"->"`, optional whitespace,
//! then `"(<x>,<z>)"`; anything before `"->"` or after the closing
//! `")"` is ignored. Lines that don't match are silently skipped and
//! never increment the point count. Lines longer than 256 bytes are
//! truncated before parsing.
//!
//! Unlike an `mmap`-the-whole-file approach, loading here streams
//! through a `BufRead` one line at a time, trading a bit of raw
//! throughput for not needing the whole input resident at once.

use std::io::BufRead;

use crate::config::AVG_BYTES_PER_LINE;
use crate::point::PointStore;

const MAX_LINE_LENGTH: usize = 256;

/// Estimates the point count from a file size alone, before any line
/// has been read.
pub fn estimate_point_count(file_size_bytes: u64) -> u64 {
    file_size_bytes / AVG_BYTES_PER_LINE
}

/// Truncates `s` to at most `max_len` bytes, backing off to the
/// nearest preceding char boundary so a multi-byte char straddling the
/// cut point doesn't panic.
fn truncate_to_char_boundary(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Parses one line, returning `(x, z)` if it matches the grammar.
pub fn parse_line(line: &str) -> Option<(i32, i32)> {
    let line = truncate_to_char_boundary(line, MAX_LINE_LENGTH - 1);

    let arrow = line.find("->")?;
    let after_arrow = &line[arrow + 2..];

    let rest = after_arrow.trim_start().strip_prefix('(')?;
    let comma = rest.find(',')?;
    let x: i32 = rest[..comma].trim_start().parse().ok()?;

    let after_comma = &rest[comma + 1..];
    let close = after_comma.find(')')?;
    let z: i32 = after_comma[..close].trim_start().parse().ok()?;

    Some((x, z))
}

/// Reads every line from `reader`, appending each well-formed point to
/// `store`. Malformed lines are silently skipped.
pub fn load_points<R: BufRead>(reader: R, store: &mut PointStore) -> std::io::Result<u64> {
    let mut loaded = 0u64;
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        if let Some((x, z)) = parse_line(&line) {
            store.append(x, z);
            loaded += 1;
        }
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tier;

    #[test]
    fn parses_well_formed_line() {
        assert_eq!(parse_line("Stronghold -> (123,-456)"), Some((123, -456)));
    }

    #[test]
    fn parses_producer_format_with_no_space_and_trailing_reg() {
        assert_eq!(parse_line("Stronghold->(123,-456)reg(4,-5)"), Some((123, -456)));
    }

    #[test]
    fn ignores_content_outside_arrow_and_parens() {
        assert_eq!(
            parse_line("junk before -> (7,8) trailing junk"),
            Some((7, 8))
        );
    }

    #[test]
    fn skips_lines_without_arrow() {
        assert_eq!(parse_line("(1,2) no arrow here"), None);
    }

    #[test]
    fn skips_malformed_parens() {
        assert_eq!(parse_line("x -> 1,2)"), None);
        assert_eq!(parse_line("x -> (1,2"), None);
        assert_eq!(parse_line("x -> (1;2)"), None);
    }

    #[test]
    fn load_points_skips_malformed_and_counts_only_valid() {
        let input = "a -> (1,1)\nnot a match\nb -> (-2,3)\n\n";
        let mut store = PointStore::with_estimated_capacity(Tier::Low, 10).unwrap();
        let loaded = load_points(input.as_bytes(), &mut store).unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.coords(0), (1, 1));
        assert_eq!(store.coords(1), (-2, 3));
    }

    #[test]
    fn estimate_uses_avg_bytes_per_line() {
        assert_eq!(estimate_point_count(3_500), 100);
    }

    #[test]
    fn truncation_backs_off_to_char_boundary_without_panicking() {
        // 'é' is 2 bytes in UTF-8; 254 ASCII bytes then 'é' puts its
        // second byte at offset 255, exactly the cut point
        // (MAX_LINE_LENGTH - 1 = 255), so naive byte slicing would
        // panic on "not a char boundary".
        let prefix = "x".repeat(254);
        let line = format!("{prefix}é -> (1,2)");
        assert!(line.len() > MAX_LINE_LENGTH);
        assert!(!line.is_char_boundary(MAX_LINE_LENGTH - 1));
        // Must not panic; the truncated prefix is what matters here.
        let _ = parse_line(&line);
    }
}

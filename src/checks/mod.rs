//! Record parsing and verdict evaluation for the two check families.

pub mod mount;
pub mod unit;

/// Markers `systemctl` prefixes state rows with in decorated output.
const STATE_MARKERS: &[char] = &['●', '○', '×', '*'];

/// Shared line cleanup for both parsers: non-printable characters become
/// spaces, whitespace runs collapse to single spaces, leading markers and
/// whitespace are trimmed.
pub(crate) fn normalize_line(line: &str) -> String {
    let printable: String = line
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let collapsed = printable.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_start_matches(|c: char| STATE_MARKERS.contains(&c) || c == ' ')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_line("  a   b\tc  "), "a b c");
    }

    #[test]
    fn test_normalize_strips_control_characters() {
        assert_eq!(normalize_line("a\u{1b}[0m b"), "a [0m b");
        assert_eq!(normalize_line("a\u{0}b"), "a b");
    }

    #[test]
    fn test_normalize_trims_leading_markers() {
        assert_eq!(normalize_line("● foo.service loaded"), "foo.service loaded");
        assert_eq!(normalize_line("× bar.service"), "bar.service");
        assert_eq!(normalize_line("*"), "");
    }
}

/// Wildcard characters and the literal placeholders that stand in for them.
///
/// Replacement is plain substring substitution, so input that already
/// contains a placeholder (say a file literally named `[star].txt`) does not
/// survive a round trip.
pub const ESCAPES: [(&str, &str); 2] = [("*", "[star]"), ("?", "[mark]")];

/// Replace every wildcard in `value` with its placeholder.
pub fn escape(value: &str) -> String {
    ESCAPES
        .iter()
        .fold(value.to_string(), |acc, (wildcard, placeholder)| {
            acc.replace(wildcard, placeholder)
        })
}

/// Inverse of [`escape`].
pub fn unescape(value: &str) -> String {
    ESCAPES
        .iter()
        .fold(value.to_string(), |acc, (wildcard, placeholder)| {
            acc.replace(placeholder, wildcard)
        })
}

pub fn escape_all<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    values.iter().map(|v| escape(v.as_ref())).collect()
}

pub fn unescape_all<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    values.iter().map(|v| unescape(v.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_single() {
        assert_eq!(escape("input*.txt"), "input[star].txt");
        assert_eq!(escape("file?.dat"), "file[mark].dat");
        assert_eq!(escape("**/.git"), "[star][star]/.git");
    }

    #[test]
    fn test_escape_list() {
        let escaped = escape_all(&["*.txt", "imp.*", "file*.zip"]);
        assert_eq!(escaped, vec!["[star].txt", "imp.[star]", "file[star].zip"]);
    }

    #[test]
    fn test_unescape_single() {
        assert_eq!(unescape("input[star].txt"), "input*.txt");
        assert_eq!(unescape("a[mark]b"), "a?b");
    }

    #[test]
    fn test_unescape_list() {
        let unescaped = unescape_all(&["[star].txt", "imp.[star]", "file[star].zip"]);
        assert_eq!(unescaped, vec!["*.txt", "imp.*", "file*.zip"]);
    }

    #[test]
    fn test_round_trip() {
        for value in ["", "plain", "*", "a?b*c", "**/__pycache__", "[x]*?"] {
            assert_eq!(unescape(&escape(value)), value);
        }
        let values = ["*.rs", "src/**", "?"];
        assert_eq!(unescape_all(&escape_all(&values)), values);
    }

    #[test]
    fn test_placeholder_in_input_is_ambiguous() {
        // A literal placeholder comes back as a wildcard.
        assert_eq!(unescape(&escape("[star]")), "*");
    }
}

//! Common helper functions for output formatting.

use owo_colors::OwoColorize;

/// Formats a section label, bold when colors are on.
pub fn label(text: &str, use_colors: bool) -> String {
    if use_colors {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

/// Joins items for display, or `(none)` if there are none.
pub fn join_or_none<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let items: Vec<String> = items.into_iter().map(|s| s.as_ref().to_string()).collect();
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}

/// Formats a yes/no flag, colored green or red.
pub fn yes_no(value: bool, use_colors: bool) -> String {
    let text = if value { "yes" } else { "no" };
    match (use_colors, value) {
        (false, _) => text.to_string(),
        (true, true) => text.green().to_string(),
        (true, false) => text.red().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_without_colors() {
        assert_eq!(label("Fields", false), "Fields");
    }

    #[test]
    fn test_join_or_none() {
        assert_eq!(join_or_none(["a", "b"]), "a, b");
        assert_eq!(join_or_none(Vec::<String>::new()), "(none)");
    }

    #[test]
    fn test_yes_no() {
        assert_eq!(yes_no(true, false), "yes");
        assert_eq!(yes_no(false, false), "no");
        assert!(yes_no(true, true).contains("yes"));
    }
}

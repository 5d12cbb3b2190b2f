/// Split comma-separated text into committed list items: split on comma,
/// trim each item, drop empties.
pub fn parse_csv(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Render a committed list back into the text buffer form.
pub fn format_csv(items: &[String]) -> String {
    items.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_csv_trims_and_drops_empties() {
        assert_eq!(parse_csv("a, b ,c"), vec!["a", "b", "c"]);
        assert_eq!(parse_csv("a,,b,"), vec!["a", "b"]);
        assert!(parse_csv(" , ,").is_empty());
        assert!(parse_csv("").is_empty());
    }

    #[test]
    fn format_csv_round_trips() {
        let items = vec!["a".to_owned(), "b".to_owned()];
        assert_eq!(format_csv(&items), "a, b");
        assert_eq!(parse_csv(&format_csv(&items)), items);
    }
}

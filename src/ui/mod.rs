pub mod panels;
pub mod plot;
pub mod table;

/// Legend text for a combination label; the empty filter has an empty label.
pub fn display_label(label: &str) -> &str {
    if label.is_empty() {
        "(all rows)"
    } else {
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_label_gets_a_placeholder() {
        assert_eq!(display_label(""), "(all rows)");
        assert_eq!(display_label("AsiaChina"), "AsiaChina");
    }
}

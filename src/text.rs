use icu_normalizer::DecomposingNormalizerBorrowed;

/// Lowercase with full Unicode case mapping, used for search matching
pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

/// Key for ordering names: lowercased, with accents removed, so "Äpfel"
/// sorts next to "apfel" instead of after "z".
pub fn sort_key(value: &str) -> String {
    let decomposed = DecomposingNormalizerBorrowed::new_nfd().normalize(value);
    decomposed
        .chars()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

fn is_combining_mark(c: char) -> bool {
    matches!(
        c,
        '\u{0300}'..='\u{036F}'
            | '\u{1AB0}'..='\u{1AFF}'
            | '\u{1DC0}'..='\u{1DFF}'
            | '\u{20D0}'..='\u{20FF}'
            | '\u{FE20}'..='\u{FE2F}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_case_handles_non_ascii() {
        assert_eq!(fold_case("Äpfel KAUFEN"), "äpfel kaufen");
        assert_eq!(fold_case("ΣΟΦΙΑ"), "σοφια");
    }

    #[test]
    fn sort_key_strips_accents() {
        assert_eq!(sort_key("Äpfel"), "apfel");
        assert_eq!(sort_key("Crème brûlée"), "creme brulee");
        assert!(sort_key("Äpfel kaufen") < sort_key("bananen"));
        assert!(sort_key("bananen") < sort_key("Zebra"));
    }
}

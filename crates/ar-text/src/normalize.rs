//! Word normalization

/// Soft hyphen inserted by typesetting tools
pub const SOFT_HYPHEN: char = '\u{00AD}';

/// Normalize a word for dictionary comparison.
///
/// Lowercases, drops soft hyphens and everything that is not a letter,
/// digit or underscore. `"Thunder!"`, `"thun\u{AD}der"` and `"THUNDER"`
/// all become `"thunder"`.
pub fn normalize_word(word: &str) -> String {
    word.chars()
        .filter(|&c| c != SOFT_HYPHEN)
        .flat_map(char::to_lowercase)
        .filter(|&c| c.is_alphanumeric() || c == '_')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_punctuation() {
        assert_eq!(normalize_word("Storm!"), "storm");
        assert_eq!(normalize_word("\"Thunder,\""), "thunder");
        assert_eq!(normalize_word("wolf's"), "wolfs");
        assert_eq!(normalize_word("..."), "");
    }

    #[test]
    fn test_normalize_soft_hyphen() {
        assert_eq!(normalize_word("foot\u{AD}steps"), "footsteps");
    }

    #[test]
    fn test_normalize_unicode() {
        assert_eq!(normalize_word("Éclair"), "éclair");
        assert_eq!(normalize_word("Straße."), "straße");
        assert_eq!(normalize_word("1914,"), "1914");
    }
}

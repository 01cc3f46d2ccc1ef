use std::collections::HashSet;

use regex::Regex;

/// Cleans raw review text into tokens suitable for corpus building.
///
/// Compiles its regexes once at construction; `normalize` itself is a pure
/// function of the input text and the fixed stopword set.
pub struct Normalizer {
    stopwords: HashSet<&'static str>,
    url_re: Regex,
    symbol_re: Regex,
}

/// Standard English stopword set.
const STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for",
    "with", "about", "against", "between", "into", "through", "during", "before", "after",
    "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
    "again", "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
    "any", "both", "each", "few", "more", "most", "other", "some", "such", "no", "nor", "not",
    "only", "own", "same", "so", "than", "too", "very", "can", "will", "just", "should", "now",
];

impl Normalizer {
    pub fn new() -> Self {
        Normalizer {
            stopwords: STOPWORDS.iter().copied().collect(),
            url_re: Regex::new(r"http\S+|www\S+").unwrap(),
            symbol_re: Regex::new(r"[^a-z0-9\s]").unwrap(),
        }
    }

    /// Turns raw text into a cleaned token sequence.
    ///
    /// A missing field (`None`) yields an empty sequence rather than an error.
    /// Lowercases, strips URLs, replaces everything outside `[a-z0-9]` and
    /// whitespace with a space, then tokenizes on whitespace, dropping
    /// stopwords and single-character tokens. Token order is preserved.
    pub fn normalize(&self, text: Option<&str>) -> Vec<String> {
        let Some(text) = text else {
            return Vec::new();
        };

        let lowered = text.to_lowercase();
        let no_urls = self.url_re.replace_all(&lowered, "");
        let cleaned = self.symbol_re.replace_all(&no_urls, " ");

        cleaned
            .split_whitespace()
            .filter(|word| word.len() > 1 && !self.stopwords.contains(word))
            .map(|word| word.to_string())
            .collect()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_text_yields_empty_sequence() {
        let normalizer = Normalizer::new();
        assert!(normalizer.normalize(None).is_empty());
    }

    #[test]
    fn strips_symbols_and_short_tokens() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.normalize(Some("A!! a bb")), vec!["bb"]);
    }

    #[test]
    fn strips_urls() {
        let normalizer = Normalizer::new();
        let tokens =
            normalizer.normalize(Some("check https://example.com/item and www.shop.com please"));
        assert_eq!(tokens, vec!["check", "please"]);
    }

    #[test]
    fn drops_stopwords_preserving_order() {
        let normalizer = Normalizer::new();
        let tokens = normalizer.normalize(Some("the battery lasted for two whole days"));
        assert_eq!(tokens, vec!["battery", "lasted", "two", "whole", "days"]);
    }

    #[test]
    fn lowercases_and_keeps_digits() {
        let normalizer = Normalizer::new();
        let tokens = normalizer.normalize(Some("Arrived in 3 Days, 10/10"));
        assert_eq!(tokens, vec!["arrived", "days", "10", "10"]);
    }
}

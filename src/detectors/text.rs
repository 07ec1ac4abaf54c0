//! Small text helpers shared by the lexical detectors.

use std::collections::HashSet;

/// Words too common to carry meaning for overlap scoring.
const STOPWORDS: &[&str] = &[
    "the", "and", "that", "this", "with", "from", "have", "has", "was", "were", "are", "is",
    "for", "not", "but", "its", "it's", "into", "their", "there", "about", "which", "would",
    "could", "should", "been", "than", "then", "them", "they", "what", "when", "where", "will",
];

/// Lowercased content words of a text: alphanumeric tokens longer than two
/// characters, minus stopwords.
pub fn content_words(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2 && !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Naive sentence split on terminal punctuation.
pub fn sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Jaccard similarity of two word sets. Empty-vs-empty is 0, not NaN.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Whether a sentence contains an explicit negation marker.
pub fn has_negation(sentence: &str) -> bool {
    let lower = sentence.to_lowercase();
    ["not ", "no ", "never ", "cannot ", "n't ", "without "]
        .iter()
        .any(|m| lower.contains(m))
        || lower.ends_with("n't")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_words_filter_stopwords_and_short_tokens() {
        let words = content_words("The cat sat on the mat, and it was fine.");
        assert!(words.contains("cat"));
        assert!(words.contains("mat"));
        assert!(!words.contains("the"));
        assert!(!words.contains("on"));
    }

    #[test]
    fn test_sentence_split() {
        let s = sentences("First sentence. Second one! Third? ");
        assert_eq!(s, vec!["First sentence", "Second one", "Third"]);
    }

    #[test]
    fn test_jaccard_empty_is_zero() {
        assert_eq!(jaccard(&HashSet::new(), &HashSet::new()), 0.0);
    }

    #[test]
    fn test_negation_markers() {
        assert!(has_negation("Paris is not the capital of Germany"));
        assert!(has_negation("it isn't"));
        assert!(!has_negation("Paris is the capital of France"));
    }
}

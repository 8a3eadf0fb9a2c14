//! Read entities definitions.

pub mod price;
pub mod transaction;

use derive_more::{AsRef, Display, FromStr};

/// Search term to fuzzy match list items with.
///
/// Any whitespace-separated word of a [`Search`] matching case-insensitively
/// is enough for an item to match.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
pub struct Search(String);

impl Search {
    /// Creates a new [`Search`] if the given `term` has any words.
    #[must_use]
    pub fn new(term: impl Into<String>) -> Option<Self> {
        let term = term.into();
        let term = term.trim();
        (!term.is_empty() && term.len() <= 256).then(|| Self(term.to_owned()))
    }

    /// Returns the words of this [`Search`].
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.0.split_whitespace()
    }

    /// Checks whether the provided `text` matches this [`Search`].
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.words().any(|w| text.contains(&w.to_lowercase()))
    }
}

impl FromStr for Search {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("blank `Search`")
    }
}

#[cfg(test)]
mod spec {
    use super::Search;

    #[test]
    fn matches_any_word_case_insensitively() {
        let search = Search::new("  iphone  A2403 ").unwrap();

        assert_eq!(search.to_string(), "iphone  A2403");
        assert!(search.matches("iPhone 12"));
        assert!(search.matches("a2403"));
        assert!(!search.matches("Galaxy S21"));
    }

    #[test]
    fn rejects_blank() {
        assert!(Search::new("").is_none());
        assert!(Search::new(" \t ").is_none());
    }
}

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The set of content-model identifiers recorded on a repository object.
///
/// Only used for membership tests; ordering carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentModelSet(BTreeSet<String>);

impl ContentModelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an identifier. Returns false if it was already present.
    pub fn insert(&mut self, model: impl Into<String>) -> bool {
        self.0.insert(model.into())
    }

    pub fn contains(&self, model: &str) -> bool {
        self.0.contains(model)
    }

    /// True if every identifier in `required` is present.
    pub fn contains_all<S: AsRef<str>>(&self, required: &[S]) -> bool {
        required.iter().all(|m| self.contains(m.as_ref()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ContentModelSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        ContentModelSet(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_all() {
        let set: ContentModelSet = ["a", "b"].into_iter().collect();
        assert!(set.contains_all(&["a"]));
        assert!(set.contains_all(&["b", "a"]));
        assert!(!set.contains_all(&["a", "c"]));
        assert!(set.contains_all::<&str>(&[]));
    }

    #[test]
    fn test_duplicates_collapse() {
        let mut set = ContentModelSet::new();
        assert!(set.insert("x"));
        assert!(!set.insert("x"));
        assert_eq!(set.len(), 1);
    }
}

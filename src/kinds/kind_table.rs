//! First-match-wins resolution of object kinds.

use thiserror::Error;

use super::ContentModelSet;

/// One row of a [`KindTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindSpec<'a, K> {
    pub kind: K,
    /// Content models that must all be present for this kind to match.
    pub content_models: &'a [&'a str],
    /// MIME types that select this kind at ingest time. Empty if none.
    pub mimetypes: &'a [&'a str],
}

/// Raised by [`KindTable::new`] when a row can never be selected by content models.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("kind at position {shadowed} is shadowed by the more general kind at position {by}")]
pub struct KindTableError {
    pub shadowed: usize,
    pub by: usize,
}

/// An ordered, immutable table of candidate kinds plus a fallback.
///
/// Rows are tried in order and the first match wins, so more specific kinds
/// (those requiring a superset of another row's content models) must come
/// before the kinds they specialize.
#[derive(Debug, Clone, Copy)]
pub struct KindTable<'a, K> {
    specs: &'a [KindSpec<'a, K>],
    fallback: K,
}

impl<'a, K: Copy> KindTable<'a, K> {
    /// Build a table, rejecting orderings where a row is unreachable because an
    /// earlier row requires a subset of its content models.
    pub fn new(specs: &'a [KindSpec<'a, K>], fallback: K) -> Result<Self, KindTableError> {
        for (later, spec) in specs.iter().enumerate() {
            for (earlier, prior) in specs[..later].iter().enumerate() {
                if prior
                    .content_models
                    .iter()
                    .all(|m| spec.content_models.contains(m))
                {
                    return Err(KindTableError {
                        shadowed: later,
                        by: earlier,
                    });
                }
            }
        }
        Ok(Self { specs, fallback })
    }

    /// Build a table without checking row order. Intended for static tables
    /// whose order is covered by a test.
    pub const fn new_unchecked(specs: &'a [KindSpec<'a, K>], fallback: K) -> Self {
        Self { specs, fallback }
    }

    pub fn specs(&self) -> &'a [KindSpec<'a, K>] {
        self.specs
    }

    pub fn fallback(&self) -> K {
        self.fallback
    }

    /// The first kind whose required content models are all in `actual`,
    /// or the fallback.
    pub fn resolve_by_content_models(&self, actual: &ContentModelSet) -> K {
        self.specs
            .iter()
            .find(|spec| actual.contains_all(spec.content_models))
            .map(|spec| spec.kind)
            .unwrap_or(self.fallback)
    }

    /// The first kind that declares `mimetype`, or the fallback.
    pub fn resolve_by_mimetype(&self, mimetype: &str) -> K {
        self.specs
            .iter()
            .find(|spec| spec.mimetypes.contains(&mimetype))
            .map(|spec| spec.kind)
            .unwrap_or(self.fallback)
    }
}

impl<'a, K: Copy + PartialEq> KindTable<'a, K> {
    /// The row describing `kind`, if the table has one.
    pub fn spec_for(&self, kind: K) -> Option<&'a KindSpec<'a, K>> {
        self.specs.iter().find(|spec| spec.kind == kind)
    }
}

/// Resolve a kind from the content models recorded on a persisted object.
pub fn resolve_by_content_models<K: Copy>(actual: &ContentModelSet, table: &KindTable<'_, K>) -> K {
    table.resolve_by_content_models(actual)
}

/// Resolve a kind from the MIME type of a file being ingested.
pub fn resolve_by_mimetype<K: Copy>(mimetype: &str, table: &KindTable<'_, K>) -> K {
    table.resolve_by_mimetype(mimetype)
}

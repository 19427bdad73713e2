//! Lazy filtering of object handles down to the ones the current credentials can see.
//!
//! Listing queries (all collections, members of a collection) return pids from
//! the resource index, which does not apply access policies. [`filter_accessible`]
//! checks each handle in turn and passes on only those that exist and are
//! reachable.
//!
//! A handle is dropped when its check reports that the object does not exist, or
//! when the check fails as a request to the repository (permission denial being
//! one such failure). The consumer cannot tell these cases apart. Any other
//! failure ends the stream with that error.

use async_trait::async_trait;
use futures::stream::{self, Stream, TryStreamExt};

/// Errors that can tell a failed repository request apart from other faults.
pub trait RequestFault {
    /// True if the error came from a request to the repository failing,
    /// including a permission denial.
    fn is_request_failure(&self) -> bool;
}

impl RequestFault for crate::backend::BackendError {
    fn is_request_failure(&self) -> bool {
        crate::backend::BackendError::is_request_failure(self)
    }
}

/// Something whose existence can be checked, possibly with a remote call.
#[async_trait]
pub trait ExistenceCheck: Send + Sync {
    type Error: RequestFault + Send;

    async fn exists(&self) -> Result<bool, Self::Error>;
}

/// Outcome of a single existence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Classify the result of an existence check.
///
/// `Ok(true)` is visible. `Ok(false)` and request failures are hidden. Every
/// other error is returned unchanged.
pub fn classify<E: RequestFault>(checked: Result<bool, E>) -> Result<Visibility, E> {
    match checked {
        Ok(true) => Ok(Visibility::Visible),
        Ok(false) => Ok(Visibility::Hidden),
        Err(e) if e.is_request_failure() => Ok(Visibility::Hidden),
        Err(e) => Err(e),
    }
}

/// Lazily yield the handles that exist and are accessible, in input order.
///
/// Checks run one at a time, only as the stream is polled. After yielding an
/// error the stream ends.
pub fn filter_accessible<I, H>(handles: I) -> impl Stream<Item = Result<H, H::Error>>
where
    I: IntoIterator<Item = H>,
    H: ExistenceCheck,
{
    stream::unfold(Some(handles.into_iter()), |remaining| async move {
        let mut remaining = remaining?;
        while let Some(handle) = remaining.next() {
            match classify(handle.exists().await) {
                Ok(Visibility::Visible) => return Some((Ok(handle), Some(remaining))),
                Ok(Visibility::Hidden) => continue,
                Err(e) => return Some((Err(e), None)),
            }
        }
        None
    })
}

/// Collect every accessible handle, failing on the first non-request error.
pub async fn collect_accessible<I, H>(handles: I) -> Result<Vec<H>, H::Error>
where
    I: IntoIterator<Item = H>,
    H: ExistenceCheck,
{
    filter_accessible(handles).try_collect().await
}

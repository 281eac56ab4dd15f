/// Result of an operation that may be cancelled by the caller.
///
/// Cancellation is not an error: a component that observes a set
/// [`CancellationToken`](tokio_util::sync::CancellationToken) returns
/// [`Outcome::Aborted`] and the value propagates silently to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T> {
    /// The operation ran to completion.
    Completed(T),
    /// The operation stopped early because cancellation was requested.
    Aborted,
}

impl<T> Outcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Outcome::Aborted)
    }

    /// Returns the completed value, if any.
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Aborted => None,
        }
    }
}

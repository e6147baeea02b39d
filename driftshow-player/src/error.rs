//! Error types for driftshow-player
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation. Strategies never silently swallow errors from their core
//! operations (`start`, `next`, `previous`); they attach the action name via
//! [`Error::in_action`] and rethrow. Only the look-ahead background fetch is
//! logged without rethrowing, since it races ahead of user-visible actions.

use driftshow_common::{ItemError, PlayerName};
use thiserror::Error;

/// Main error type for the playback core
#[derive(Error, Debug)]
pub enum Error {
    /// Strategy item list is empty
    #[error("items are empty for {0} player")]
    EmptySource(PlayerName),

    /// Advancing produced no candidate item
    #[error("no next item found")]
    NoNextItem,

    /// Rewinding produced no candidate item
    #[error("no previous item found")]
    NoPreviousItem,

    /// Item-fetch API failure
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Item construction failure at the fetch boundary
    #[error("invalid item: {0}")]
    Item(#[from] ItemError),

    /// Operation not valid in the current lifecycle state
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Reentrant next/previous while a transition is still settling
    #[error("transition already in progress")]
    TransitionInProgress,

    /// Error wrapped with the action that triggered it
    #[error("{action} failed: {source}")]
    Action {
        action: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Tag this error with the name of the action that triggered it
    ///
    /// Already-tagged errors keep their innermost action.
    pub fn in_action(self, action: &'static str) -> Error {
        match self {
            Error::Action { .. } => self,
            other => Error::Action {
                action,
                source: Box::new(other),
            },
        }
    }

    /// Action tag, when present
    pub fn action(&self) -> Option<&'static str> {
        match self {
            Error::Action { action, .. } => Some(action),
            _ => None,
        }
    }
}

/// Convenience Result type using the playback core Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_tagging() {
        let err = Error::NoNextItem.in_action("next");
        assert_eq!(err.action(), Some("next"));
        assert!(err.to_string().contains("next failed"));
    }

    #[test]
    fn test_action_tag_not_overwritten() {
        let err = Error::NoNextItem.in_action("next").in_action("start");
        assert_eq!(err.action(), Some("next"));
    }
}

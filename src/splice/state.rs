//! The per-call state machine.

use thiserror::Error;

/// Where an intercepted call is in its lifecycle.
///
/// ```text
/// NotStarted -> AwaitingDecision -> Replaying  -> Delivering -> Completed
///                                -> Forwarding -> Recording -> Delivering
///                                -> Delivering (write-protected miss)
///                                -> Completed  (silenced miss, nothing delivered)
/// NotStarted -> Delivering (unsupported request shape)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallState {
    /// Created, guard not yet consulted.
    NotStarted,
    /// Guard approved; waiting on the cassette.
    AwaitingDecision,
    /// Serving a recorded interaction.
    Replaying,
    /// The real client is handling the request.
    Forwarding,
    /// Persisting the real response.
    Recording,
    /// Handing the result to the caller.
    Delivering,
    /// Terminal. Reached exactly once.
    Completed,
}

/// A transition the state machine does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal call transition {from:?} -> {to:?}")]
pub struct IllegalTransition {
    /// State before the attempted transition.
    pub from: CallState,
    /// Requested state.
    pub to: CallState,
}

impl CallState {
    /// Whether `self -> next` is a legal transition.
    #[must_use]
    pub fn can_advance_to(self, next: CallState) -> bool {
        use CallState::{
            AwaitingDecision, Completed, Delivering, Forwarding, NotStarted, Recording, Replaying,
        };
        matches!(
            (self, next),
            (NotStarted, AwaitingDecision | Delivering)
                | (AwaitingDecision, Replaying | Forwarding | Delivering | Completed)
                | (Replaying | Recording, Delivering)
                // A transport failure leaves nothing to record.
                | (Forwarding, Recording | Delivering)
                | (Delivering, Completed)
        )
    }

    /// Moves to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalTransition`] if the move is not allowed.
    pub fn advance(self, next: CallState) -> Result<CallState, IllegalTransition> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(IllegalTransition { from: self, to: next })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CallState::*;
    use super::*;

    #[test]
    fn replay_path_is_legal() {
        let state = NotStarted
            .advance(AwaitingDecision)
            .and_then(|s| s.advance(Replaying))
            .and_then(|s| s.advance(Delivering))
            .and_then(|s| s.advance(Completed));
        assert_eq!(state, Ok(Completed));
    }

    #[test]
    fn record_path_is_legal() {
        let state = NotStarted
            .advance(AwaitingDecision)
            .and_then(|s| s.advance(Forwarding))
            .and_then(|s| s.advance(Recording))
            .and_then(|s| s.advance(Delivering))
            .and_then(|s| s.advance(Completed));
        assert_eq!(state, Ok(Completed));
    }

    #[test]
    fn completed_is_terminal() {
        let all =
            [NotStarted, AwaitingDecision, Replaying, Forwarding, Recording, Delivering, Completed];
        for next in all {
            let expected = IllegalTransition { from: Completed, to: next };
            assert_eq!(Completed.advance(next), Err(expected));
        }
    }

    #[test]
    fn replaying_cannot_record() {
        assert!(!Replaying.can_advance_to(Recording));
        assert!(!Replaying.can_advance_to(Forwarding));
    }

    #[test]
    fn silenced_miss_completes_without_delivering() {
        assert!(AwaitingDecision.can_advance_to(Completed));
        assert!(!NotStarted.can_advance_to(Completed));
    }
}

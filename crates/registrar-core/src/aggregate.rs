//! Aggregate state abstraction and the fold over an event stream.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::event::DomainEvent;

/// Materialized state of an aggregate, derived by folding its events.
///
/// `Default` is the state before any event has been applied. `apply` must be
/// pure and total: the same sequence of events always produces the same
/// state, and no event can make it fail.
pub trait Aggregate:
    Default + Clone + PartialEq + std::fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The event type this aggregate consumes.
    type Event: DomainEvent;

    /// Apply a single event to mutate state.
    fn apply(&mut self, event: &Self::Event);

    /// Whether a creation event has been folded into this state. The store's
    /// duplicate creation policy only applies once this is true.
    fn is_created(&self) -> bool;
}

/// Folds `events`, in the order given, over the default state.
#[must_use]
pub fn fold<'a, A, I>(events: I) -> A
where
    A: Aggregate,
    I: IntoIterator<Item = &'a A::Event>,
{
    events.into_iter().fold(A::default(), |mut state, event| {
        state.apply(event);
        state
    })
}

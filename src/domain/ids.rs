//! Entity identity: explicit, injectable id generation

use std::cell::Cell;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of an observable entity (presentation or frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id counter owned by an editing session.
///
/// Every entity created in the session draws its id from the same generator, so
/// presentation ids and frame ids never collide and never repeat.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: Cell<u64>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting at `first` (useful to keep ids apart across sessions).
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: Cell::new(first),
        }
    }

    pub fn next_id(&self) -> EntityId {
        let id = self.next.get();
        let next = id
            .checked_add(1)
            .expect("entity id space exhausted within a single session");
        self.next.set(next);
        EntityId(id)
    }

    /// The id the next call to [`IdGenerator::next_id`] will return.
    pub fn peek(&self) -> EntityId {
        EntityId(self.next.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_generator_when_drawing_ids_then_strictly_increasing() {
        let ids = IdGenerator::new();
        let a = ids.next_id();
        let b = ids.next_id();
        let c = ids.next_id();
        assert!(a < b && b < c);
        assert_eq!(a.value(), 0);
    }

    #[test]
    fn given_offset_generator_when_drawing_then_starts_at_offset() {
        let ids = IdGenerator::starting_at(41);
        assert_eq!(ids.peek().value(), 41);
        assert_eq!(ids.next_id().to_string(), "41");
        assert_eq!(ids.peek().value(), 42);
    }
}

//! Duplicate detection for proposed events.
//!
//! A candidate duplicates another event when subject, start and end all
//! match. Candidates are checked against the calendar's existing events
//! (minus any the same operation is about to remove) and against every other
//! candidate proposed in the same batch.

use tracing::trace;

use crate::error::{CalendarResult, Violation, Violations};
use crate::event::{Event, EventSet};

/// Returns true if `candidate` collides with an event that will still exist
/// once the operation commits.
pub fn would_duplicate(
    candidate: &Event,
    existing: &EventSet,
    removed: &[Event],
    pending: &[Event],
) -> bool {
    let clashes_existing = existing.contains(candidate) && !removed.contains(candidate);
    clashes_existing || pending.contains(candidate)
}

/// Admits candidates one by one, remembering each accepted candidate so later
/// ones in the same batch are checked against it.
#[derive(Debug)]
pub struct DuplicateGuard<'a> {
    existing: &'a EventSet,
    removed: &'a [Event],
    admitted: Vec<Event>,
    violations: Violations,
}

impl<'a> DuplicateGuard<'a> {
    /// Guard for a batch that only adds events.
    pub fn new(existing: &'a EventSet) -> Self {
        Self::replacing(existing, &[])
    }

    /// Guard for a batch that removes `removed` and adds the candidates.
    pub fn replacing(existing: &'a EventSet, removed: &'a [Event]) -> Self {
        Self {
            existing,
            removed,
            admitted: Vec::new(),
            violations: Violations::new(),
        }
    }

    /// Checks a candidate without admitting it.
    pub fn check(&self, candidate: &Event) -> Result<(), Violation> {
        if would_duplicate(candidate, self.existing, self.removed, &self.admitted) {
            trace!(event = %candidate, "Duplicate candidate");
            Err(candidate.duplicate_violation())
        } else {
            Ok(())
        }
    }

    /// Admits a candidate, or records the collision.
    pub fn admit(&mut self, candidate: Event) {
        match self.check(&candidate) {
            Ok(()) => self.admitted.push(candidate),
            Err(violation) => self.violations.push(violation),
        }
    }

    /// Records a violation found by the caller so it is reported with the
    /// guard's own findings.
    pub fn reject(&mut self, violations: Violations) {
        self.violations.extend(violations);
    }

    /// Returns the admitted events, or every collision found.
    pub fn finish(self) -> CalendarResult<Vec<Event>> {
        self.violations.into_result()?;
        Ok(self.admitted)
    }
}

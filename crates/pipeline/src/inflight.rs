//! At-most-one-in-flight-per-document enforcement.
//!
//! Double submission risks duplicate authority registration, so a second
//! attempt on a document whose submission is running must fail fast rather
//! than queue behind it. The guard is process-local; the registry is the
//! lock authority for one worker-pool process.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use emisor_core::DocumentId;

/// Registry of documents with a submission currently running.
#[derive(Debug, Default)]
pub struct InFlight {
    active: Mutex<HashSet<DocumentId>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Claim a document for the duration of one submission attempt.
    ///
    /// Returns `None` when another attempt is already in flight; the caller
    /// must fail fast without retry.
    pub fn try_acquire(self: &Arc<Self>, id: DocumentId) -> Option<InFlightGuard> {
        let mut active = self.active.lock().unwrap();
        if !active.insert(id) {
            return None;
        }
        Some(InFlightGuard {
            registry: Arc::clone(self),
            id,
        })
    }
}

/// RAII claim; released on drop, including on panic unwinds.
#[derive(Debug)]
pub struct InFlightGuard {
    registry: Arc<InFlight>,
    id: DocumentId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.active.lock().unwrap().remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_guard_lives() {
        let registry = InFlight::arc();
        let id = DocumentId::new();

        let guard = registry.try_acquire(id).unwrap();
        assert!(registry.try_acquire(id).is_none());

        drop(guard);
        assert!(registry.try_acquire(id).is_some());
    }

    #[test]
    fn different_documents_do_not_contend() {
        let registry = InFlight::arc();
        let _a = registry.try_acquire(DocumentId::new()).unwrap();
        let _b = registry.try_acquire(DocumentId::new()).unwrap();
    }
}

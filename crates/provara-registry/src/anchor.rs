//! # Ledger Anchor
//!
//! The boundary to the external transaction layer: every accepted registry
//! transition (new entities root + counter snapshot) is pushed into an
//! opaque, append-only store keyed by root hash. The storage engine is the
//! embedding deployment's concern; the registry only requires that a
//! commit either lands durably or surfaces an error before the update is
//! reported accepted.
//!
//! [`InMemoryLedger`] is the in-process implementation used by tests and
//! local runs.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use provara_crypto::Hash32;

use crate::registry::RegistryState;

/// Error surfaced by a ledger commit.
#[derive(Error, Debug)]
pub enum AnchorError {
    /// The underlying store refused or failed the commit.
    #[error("ledger commit failed: {0}")]
    Commit(String),
}

/// One committed registry transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// The entities root after the transition.
    pub root: Hash32,
    /// The full counter snapshot after the transition.
    pub state: RegistryState,
}

/// The append-only commit capability the registry writes through.
pub trait LedgerAnchor: Send + Sync {
    /// Durably record a registry transition, keyed by the new root.
    fn commit(&self, root: &Hash32, state: &RegistryState) -> Result<(), AnchorError>;
}

/// An in-memory, append-only ledger.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    entries: Mutex<Vec<LedgerEntry>>,
}

impl InMemoryLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of committed transitions.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// Whether nothing has been committed yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The most recent committed entry.
    pub fn latest(&self) -> Option<LedgerEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .last()
            .cloned()
    }

    /// Look up a committed transition by its root hash.
    pub fn find_by_root(&self, root: &Hash32) -> Option<LedgerEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .find(|e| e.root == *root)
            .cloned()
    }
}

impl LedgerAnchor for InMemoryLedger {
    fn commit(&self, root: &Hash32, state: &RegistryState) -> Result<(), AnchorError> {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(LedgerEntry {
                root: *root,
                state: state.clone(),
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(version: u64) -> RegistryState {
        RegistryState {
            entities_root: Hash32([version as u8; 32]),
            total_entities: 1,
            compliant_entities: 1,
            total_verifications: version,
            version,
        }
    }

    #[test]
    fn test_append_and_lookup() {
        let ledger = InMemoryLedger::new();
        assert!(ledger.is_empty());
        ledger.commit(&Hash32([1; 32]), &state(1)).unwrap();
        ledger.commit(&Hash32([2; 32]), &state(2)).unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.latest().unwrap().state.version, 2);
        assert_eq!(
            ledger.find_by_root(&Hash32([1; 32])).unwrap().state.version,
            1
        );
        assert!(ledger.find_by_root(&Hash32([9; 32])).is_none());
    }
}

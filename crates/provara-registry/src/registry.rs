//! # Registry State Machine
//!
//! `Uninitialized → Active` at the registry level (construction is the
//! only transition); tracked entities move `Unregistered → Tracked →
//! (optionally) Reset` through proof-gated operations.
//!
//! ## The Insert/Update Branch
//!
//! The registry never guesses whether a call is a first insertion or an
//! update. The caller proves it: a [`PriorState::Vacant`] opening resolves
//! the empty-slot hash against the current root (insertion), a
//! [`PriorState::Occupied`] opening resolves the prior record's hash
//! (update). `total_entities` increments only on a proven-vacant
//! insertion — never on a count heuristic.
//!
//! ## Concurrency
//!
//! Every mutation runs under one internal mutex (at most one in-flight
//! update per registry). A caller holding an opening taken before another
//! writer committed sees [`RegistryError::Conflict`] and retries with a
//! freshly fetched opening. Reads return committed snapshots only.
//!
//! ## Finality
//!
//! A committed update is final. There is no rollback — only the
//! compensating `reset_entity` / `reset_registry` operations, which
//! themselves require a valid opening of current state and strictly
//! increment the version counter.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use provara_core::error::CanonicalizationError;
use provara_core::{SlotIndex, Timestamp};
use provara_crypto::slot_tree::SlotTreeError;
use provara_crypto::{empty_leaf_hash, Hash32, SlotOpening, SlotTree};
use provara_oracle::PublicKeyResolver;

use provara_circuit::{CircuitError, ComplianceProof, PolicyError, ProofPolicy};

use crate::anchor::{AnchorError, LedgerAnchor};
use crate::record::ComplianceRecord;

use std::collections::BTreeMap;

/// Depth of the entities tree (4096 slots).
pub const REGISTRY_TREE_DEPTH: u8 = 12;

/// Error in registry operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The prior-state opening does not resolve against the current root —
    /// usually a concurrent update landed first. Retry with a freshly
    /// fetched opening.
    #[error("registry conflict: {0} (re-fetch the opening and retry)")]
    Conflict(String),

    /// A query or reset named a record the current root does not contain.
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// The submitted record does not match the one derived from the proof.
    #[error("record mismatch: {0}")]
    RecordMismatch(String),

    /// The registry tree has no vacant slots left.
    #[error("registry is full ({capacity} slots)")]
    Full {
        /// The tree capacity.
        capacity: usize,
    },

    /// The accompanying proof failed verification.
    #[error("proof rejected: {0}")]
    Proof(#[from] CircuitError),

    /// The proof's backend is not acceptable under the deployment policy.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Tree addressing failed.
    #[error(transparent)]
    Tree(#[from] SlotTreeError),

    /// Record canonicalization failed.
    #[error(transparent)]
    Canonicalization(#[from] CanonicalizationError),

    /// The ledger refused the commit.
    #[error(transparent)]
    Anchor(#[from] AnchorError),
}

/// The caller's proven knowledge of the slot being replaced.
#[derive(Debug, Clone)]
pub enum PriorState {
    /// The slot is empty: first insertion for this entity.
    Vacant {
        /// Opening of the empty slot against the current root.
        opening: SlotOpening,
    },
    /// The slot holds the entity's previous record: update.
    Occupied {
        /// Opening of the prior record against the current root.
        opening: SlotOpening,
        /// The prior record (hash-checked against the opening).
        record: ComplianceRecord,
    },
}

/// A committed snapshot of the registry counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryState {
    /// Root of the entities tree.
    pub entities_root: Hash32,
    /// Entities ever inserted (never decremented except by registry reset).
    pub total_entities: u64,
    /// Entities whose latest record is compliant.
    pub compliant_entities: u64,
    /// Accepted verifications since initialization (or last registry reset).
    pub total_verifications: u64,
    /// Monotonic version, bumped by every accepted mutation.
    pub version: u64,
}

impl RegistryState {
    /// Aggregate compliance score: `round(compliant / total × 100)`,
    /// defined as 0 for an empty registry.
    pub fn aggregate_score(&self) -> u8 {
        if self.total_entities == 0 {
            return 0;
        }
        ((self.compliant_entities * 100 + self.total_entities / 2) / self.total_entities) as u8
    }
}

struct RegistryCore {
    tree: SlotTree,
    directory: BTreeMap<String, SlotIndex>,
    next_slot: u16,
    total_entities: u64,
    compliant_entities: u64,
    total_verifications: u64,
    version: u64,
}

impl RegistryCore {
    fn snapshot(&self) -> RegistryState {
        RegistryState {
            entities_root: self.tree.root(),
            total_entities: self.total_entities,
            compliant_entities: self.compliant_entities,
            total_verifications: self.total_verifications,
            version: self.version,
        }
    }
}

/// The proof-gated registry for one deployment.
///
/// Construction is the `Uninitialized → Active` transition: the tree is
/// empty, every counter is zero, and the version counter starts at zero
/// and only ever increases.
pub struct ComplianceRegistry {
    inner: Mutex<RegistryCore>,
    resolver: Arc<dyn PublicKeyResolver>,
    policy: ProofPolicy,
    anchor: Arc<dyn LedgerAnchor>,
}

impl ComplianceRegistry {
    /// Create an active registry at the default depth.
    pub fn new(
        resolver: Arc<dyn PublicKeyResolver>,
        policy: ProofPolicy,
        anchor: Arc<dyn LedgerAnchor>,
    ) -> Self {
        Self::with_depth(REGISTRY_TREE_DEPTH, resolver, policy, anchor)
            .expect("default registry depth is valid")
    }

    /// Create an active registry at an explicit tree depth.
    pub fn with_depth(
        depth: u8,
        resolver: Arc<dyn PublicKeyResolver>,
        policy: ProofPolicy,
        anchor: Arc<dyn LedgerAnchor>,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            inner: Mutex::new(RegistryCore {
                tree: SlotTree::new(depth)?,
                directory: BTreeMap::new(),
                next_slot: 0,
                total_entities: 0,
                compliant_entities: 0,
                total_verifications: 0,
                version: 0,
            }),
            resolver,
            policy,
            anchor,
        })
    }

    fn lock(&self) -> MutexGuard<'_, RegistryCore> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The current committed state snapshot.
    pub fn state(&self) -> RegistryState {
        self.lock().snapshot()
    }

    /// The slot tracking an entity, if it is tracked.
    pub fn entity_slot(&self, entity_key_hash: &str) -> Option<SlotIndex> {
        self.lock().directory.get(entity_key_hash).copied()
    }

    /// The opening of a slot against the current root.
    pub fn opening(&self, slot: SlotIndex) -> Result<SlotOpening, RegistryError> {
        Ok(self.lock().tree.opening(slot)?)
    }

    /// The next vacant slot and its opening, for a first insertion.
    ///
    /// The opening is taken against the current root; if another writer
    /// commits first, `insert_or_update` reports a conflict and the caller
    /// fetches a fresh one.
    pub fn next_vacant(&self) -> Result<(SlotIndex, SlotOpening), RegistryError> {
        let core = self.lock();
        let slot = SlotIndex(core.next_slot);
        if slot.as_usize() >= core.tree.capacity() {
            return Err(RegistryError::Full {
                capacity: core.tree.capacity(),
            });
        }
        let opening = core.tree.opening(slot)?;
        Ok((slot, opening))
    }

    /// Insert or update an entity's record.
    ///
    /// Requires a verified proof (whatever its verdict — negative results
    /// are recorded too), a prior-state opening against the *current*
    /// root, and a new record equal to the one the registry derives from
    /// the proof's public output. On success the leaf is written, the
    /// counters are updated, and the transition is committed to the
    /// ledger anchor.
    pub fn insert_or_update(
        &self,
        proof: &ComplianceProof,
        prior: PriorState,
        new_record: &ComplianceRecord,
    ) -> Result<RegistryState, RegistryError> {
        self.policy.validate(proof.backend)?;
        proof.verify(self.resolver.as_ref())?;
        let output = &proof.public_output;
        if new_record.entity_key_hash != output.entity_key_hash {
            return Err(RegistryError::RecordMismatch(format!(
                "record is for entity {} but the proof attests {}",
                new_record.entity_key_hash, output.entity_key_hash
            )));
        }

        let mut core = self.lock();
        let current_root = core.tree.root();

        let (slot, first_insertion, compliant_delta) = match prior {
            PriorState::Vacant { opening } => {
                if let Some(slot) = core.directory.get(&output.entity_key_hash) {
                    return Err(RegistryError::Conflict(format!(
                        "entity already tracked at {slot}; supply the occupied prior state"
                    )));
                }
                if !opening.verify(&empty_leaf_hash(), &current_root) {
                    return Err(RegistryError::Conflict(
                        "vacant opening does not resolve against the current root".to_string(),
                    ));
                }
                let expected = ComplianceRecord::first(output);
                if *new_record != expected {
                    return Err(RegistryError::RecordMismatch(
                        "submitted record does not match the proof-derived first record"
                            .to_string(),
                    ));
                }
                let delta = i64::from(output.compliant);
                (opening.leaf_index, true, delta)
            }
            PriorState::Occupied { opening, record } => {
                if record.entity_key_hash != output.entity_key_hash {
                    return Err(RegistryError::RecordMismatch(
                        "prior record belongs to a different entity".to_string(),
                    ));
                }
                match core.directory.get(&output.entity_key_hash) {
                    Some(slot) if *slot == opening.leaf_index => {}
                    Some(_) => {
                        return Err(RegistryError::Conflict(
                            "opening targets a different slot than the entity's".to_string(),
                        ))
                    }
                    None => {
                        return Err(RegistryError::RecordNotFound(format!(
                            "entity {} is not tracked",
                            output.entity_key_hash
                        )))
                    }
                }
                if !opening.verify(&record.leaf()?, &current_root) {
                    return Err(RegistryError::Conflict(
                        "prior opening does not resolve against the current root".to_string(),
                    ));
                }
                let expected = record.updated(output);
                if *new_record != expected {
                    return Err(RegistryError::RecordMismatch(
                        "submitted record does not match the proof-derived update".to_string(),
                    ));
                }
                let delta = i64::from(output.compliant) - i64::from(record.status.compliant);
                (opening.leaf_index, false, delta)
            }
        };

        core.tree.set_leaf(slot, new_record.leaf()?)?;
        if first_insertion {
            core.directory
                .insert(output.entity_key_hash.clone(), slot);
            core.next_slot = core.next_slot.max(slot.0 + 1);
            core.total_entities += 1;
        }
        core.compliant_entities = core
            .compliant_entities
            .saturating_add_signed(compliant_delta);
        core.total_verifications += 1;
        core.version += 1;

        let state = core.snapshot();
        self.anchor.commit(&state.entities_root, &state)?;
        tracing::info!(
            entity = %output.entity_key_hash,
            slot = %slot,
            first_insertion,
            compliant = output.compliant,
            total_entities = state.total_entities,
            compliant_entities = state.compliant_entities,
            aggregate_score = state.aggregate_score(),
            "registry update committed"
        );
        Ok(state)
    }

    /// Validate a record against the current root and return it.
    ///
    /// Read-only; runs concurrently with other reads and observes only
    /// committed state.
    pub fn query(
        &self,
        opening: &SlotOpening,
        record: &ComplianceRecord,
    ) -> Result<ComplianceRecord, RegistryError> {
        let core = self.lock();
        if opening.verify(&record.leaf()?, &core.tree.root()) {
            Ok(record.clone())
        } else {
            Err(RegistryError::RecordNotFound(format!(
                "record for {} does not resolve against the current root",
                record.entity_key_hash
            )))
        }
    }

    /// Administratively zero one entity's flags and score.
    ///
    /// Requires a valid opening of the entity's current record. The
    /// record's version and the registry version both strictly increase.
    pub fn reset_entity(
        &self,
        opening: &SlotOpening,
        record: &ComplianceRecord,
        at: Timestamp,
    ) -> Result<(ComplianceRecord, RegistryState), RegistryError> {
        let mut core = self.lock();
        match core.directory.get(&record.entity_key_hash) {
            Some(slot) if *slot == opening.leaf_index => {}
            _ => {
                return Err(RegistryError::RecordNotFound(format!(
                    "entity {} is not tracked at the opened slot",
                    record.entity_key_hash
                )))
            }
        }
        if !opening.verify(&record.leaf()?, &core.tree.root()) {
            return Err(RegistryError::Conflict(
                "reset opening does not resolve against the current root".to_string(),
            ));
        }
        let reset = record.reset(at);
        core.tree.set_leaf(opening.leaf_index, reset.leaf()?)?;
        if record.status.compliant {
            core.compliant_entities -= 1;
        }
        core.version += 1;

        let state = core.snapshot();
        self.anchor.commit(&state.entities_root, &state)?;
        tracing::info!(
            entity = %record.entity_key_hash,
            version = reset.version,
            "entity reset committed"
        );
        Ok((reset, state))
    }

    /// Administratively clear the whole registry: empty tree, zero
    /// counters, version strictly incremented (never reused).
    pub fn reset_registry(&self) -> Result<RegistryState, RegistryError> {
        let mut core = self.lock();
        let depth = core.tree.depth();
        core.tree = SlotTree::new(depth)?;
        core.directory.clear();
        core.next_slot = 0;
        core.total_entities = 0;
        core.compliant_entities = 0;
        core.total_verifications = 0;
        core.version += 1;

        let state = core.snapshot();
        self.anchor.commit(&state.entities_root, &state)?;
        tracing::info!(version = state.version, "registry reset committed");
        Ok(state)
    }
}

impl std::fmt::Debug for ComplianceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("ComplianceRegistry")
            .field("total_entities", &state.total_entities)
            .field("compliant_entities", &state.compliant_entities)
            .field("total_verifications", &state.total_verifications)
            .field("version", &state.version)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_score_zero_entities() {
        let state = RegistryState {
            entities_root: Hash32([0; 32]),
            total_entities: 0,
            compliant_entities: 0,
            total_verifications: 0,
            version: 0,
        };
        assert_eq!(state.aggregate_score(), 0);
    }

    #[test]
    fn test_aggregate_score_rounding() {
        let mut state = RegistryState {
            entities_root: Hash32([0; 32]),
            total_entities: 3,
            compliant_entities: 2,
            total_verifications: 3,
            version: 3,
        };
        assert_eq!(state.aggregate_score(), 67);
        state.compliant_entities = 1;
        assert_eq!(state.aggregate_score(), 33);
        state.compliant_entities = 3;
        assert_eq!(state.aggregate_score(), 100);
    }
}

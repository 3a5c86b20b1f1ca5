//! # Slot Tree — Fixed-Depth Merkle Tree with Openings
//!
//! The authenticated structure shared by document encoding and the entity
//! registry: a complete binary tree of `2^depth` slots, where every slot
//! holds a leaf hash and unset slots hold the canonical empty-leaf hash.
//!
//! ## Hashing
//!
//! Domain-separated SHA-256:
//! - Leaf: `SHA256(0x00 || leaf_bytes)`.
//! - Node: `SHA256(0x01 || left || right)`.
//!
//! The empty-leaf hash is `leaf_hash(b"")` — the hash of the canonical
//! empty value — so a prover can open an unused slot and demonstrate its
//! emptiness, which is what gates first-insertion in the registry.
//!
//! ## Openings
//!
//! A [`SlotOpening`] is the sibling-hash path from one leaf to the root,
//! with direction derived from the leaf index bits. Verifying an opening
//! recomputes the root from the claimed leaf hash; any mutation of the
//! revealed value, the path, or the index changes the computed root.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use provara_core::SlotIndex;

use crate::hash32::Hash32;

/// Maximum supported tree depth (65,536 slots).
pub const MAX_TREE_DEPTH: u8 = 16;

/// Error constructing or addressing a slot tree.
#[derive(Error, Debug)]
pub enum SlotTreeError {
    /// Depth outside the supported `1..=MAX_TREE_DEPTH` range.
    #[error("tree depth must be between 1 and {MAX_TREE_DEPTH}, got {0}")]
    DepthOutOfRange(u8),

    /// Slot index beyond the tree's capacity.
    #[error("slot index {index} out of range for depth-{depth} tree ({capacity} slots)")]
    SlotOutOfRange {
        /// The offending index.
        index: u16,
        /// The tree depth.
        depth: u8,
        /// The tree capacity (`2^depth`).
        capacity: usize,
    },
}

// ---------------------------------------------------------------------------
// Domain-separated hashing
// ---------------------------------------------------------------------------

/// Compute a leaf hash: `SHA256(0x00 || bytes)`.
pub fn leaf_hash(bytes: &[u8]) -> Hash32 {
    let mut hasher = Sha256::new();
    hasher.update([0x00]);
    hasher.update(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    Hash32(out)
}

/// Compute an interior node hash: `SHA256(0x01 || left || right)`.
pub fn node_hash(left: &Hash32, right: &Hash32) -> Hash32 {
    let mut hasher = Sha256::new();
    hasher.update([0x01]);
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    Hash32(out)
}

/// The hash of an unset slot: the leaf hash of the canonical empty value.
pub fn empty_leaf_hash() -> Hash32 {
    leaf_hash(b"")
}

// ---------------------------------------------------------------------------
// Openings
// ---------------------------------------------------------------------------

/// A Merkle opening: the minimal sibling path proving one slot's content
/// against a root.
///
/// Sibling order is leaf-to-root; the direction at level `k` is bit `k` of
/// the leaf index (bit set ⇒ the sibling is on the left).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotOpening {
    /// The index of the opened slot.
    pub leaf_index: SlotIndex,
    /// Sibling hashes from leaf level to just below the root.
    pub siblings: Vec<Hash32>,
}

impl SlotOpening {
    /// Recompute the root implied by this opening for the given leaf hash.
    pub fn compute_root(&self, leaf: &Hash32) -> Hash32 {
        let mut current = *leaf;
        let mut index = self.leaf_index.0;
        for sibling in &self.siblings {
            current = if index & 1 == 1 {
                node_hash(sibling, &current)
            } else {
                node_hash(&current, sibling)
            };
            index >>= 1;
        }
        current
    }

    /// Whether this opening resolves the given leaf hash to the given root.
    pub fn verify(&self, leaf: &Hash32, root: &Hash32) -> bool {
        self.compute_root(leaf) == *root
    }

    /// The depth of the tree this opening was taken from.
    pub fn depth(&self) -> u8 {
        self.siblings.len() as u8
    }
}

// ---------------------------------------------------------------------------
// SlotTree
// ---------------------------------------------------------------------------

/// A fixed-depth Merkle tree of `2^depth` slots.
///
/// All slots start at the empty-leaf hash. The root is recomputed from the
/// full leaf level on demand; at the supported depths this is a bounded,
/// local computation.
#[derive(Debug, Clone)]
pub struct SlotTree {
    depth: u8,
    leaves: Vec<Hash32>,
}

impl SlotTree {
    /// Create an empty tree of the given depth.
    pub fn new(depth: u8) -> Result<Self, SlotTreeError> {
        if depth == 0 || depth > MAX_TREE_DEPTH {
            return Err(SlotTreeError::DepthOutOfRange(depth));
        }
        let capacity = 1usize << depth;
        Ok(Self {
            depth,
            leaves: vec![empty_leaf_hash(); capacity],
        })
    }

    /// The tree depth.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// The number of slots (`2^depth`).
    pub fn capacity(&self) -> usize {
        self.leaves.len()
    }

    /// The leaf hash currently stored at `index`.
    pub fn leaf(&self, index: SlotIndex) -> Result<Hash32, SlotTreeError> {
        self.check_bounds(index)?;
        Ok(self.leaves[index.as_usize()])
    }

    /// Store a leaf hash at `index`.
    pub fn set_leaf(&mut self, index: SlotIndex, leaf: Hash32) -> Result<(), SlotTreeError> {
        self.check_bounds(index)?;
        self.leaves[index.as_usize()] = leaf;
        Ok(())
    }

    /// Restore a slot to the empty-leaf hash.
    pub fn clear_leaf(&mut self, index: SlotIndex) -> Result<(), SlotTreeError> {
        self.set_leaf(index, empty_leaf_hash())
    }

    /// Compute the current root by folding all levels.
    pub fn root(&self) -> Hash32 {
        let mut level = self.leaves.clone();
        while level.len() > 1 {
            level = level
                .chunks(2)
                .map(|pair| node_hash(&pair[0], &pair[1]))
                .collect();
        }
        level[0]
    }

    /// Build the opening (sibling path) for the slot at `index`.
    pub fn opening(&self, index: SlotIndex) -> Result<SlotOpening, SlotTreeError> {
        self.check_bounds(index)?;
        let mut siblings = Vec::with_capacity(self.depth as usize);
        let mut level = self.leaves.clone();
        let mut pos = index.as_usize();
        while level.len() > 1 {
            siblings.push(level[pos ^ 1]);
            level = level
                .chunks(2)
                .map(|pair| node_hash(&pair[0], &pair[1]))
                .collect();
            pos /= 2;
        }
        Ok(SlotOpening {
            leaf_index: index,
            siblings,
        })
    }

    /// The root of an empty tree at the given depth.
    pub fn empty_root(depth: u8) -> Result<Hash32, SlotTreeError> {
        if depth == 0 || depth > MAX_TREE_DEPTH {
            return Err(SlotTreeError::DepthOutOfRange(depth));
        }
        let mut current = empty_leaf_hash();
        for _ in 0..depth {
            current = node_hash(&current, &current);
        }
        Ok(current)
    }

    fn check_bounds(&self, index: SlotIndex) -> Result<(), SlotTreeError> {
        if index.as_usize() >= self.leaves.len() {
            return Err(SlotTreeError::SlotOutOfRange {
                index: index.0,
                depth: self.depth,
                capacity: self.leaves.len(),
            });
        }
        Ok(())
    }
}

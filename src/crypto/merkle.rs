//! Merkle tree root calculation
//!
//! The ledger hashes leaves as `H(0x00 || data)` and interior nodes as
//! `H(0x01 || left || right)`. Trees are left-complete: for a leaf count
//! that is not a power of two, the left subtree holds the largest power of
//! two and the remaining leaves form the right subtree.

use super::hash::{Blake2b256, Hash256};
use blake2::Digest;

/// Prefix for leaf hashes
pub const LEAF_HASH_PREFIX: u8 = 0x00;

/// Prefix for interior node hashes
pub const NODE_HASH_PREFIX: u8 = 0x01;

/// Hash a single leaf
pub fn leaf_hash(data: &[u8]) -> Hash256 {
    let mut hasher = Blake2b256::new();
    hasher.update([LEAF_HASH_PREFIX]);
    hasher.update(data);
    Hash256(hasher.finalize().into())
}

/// Hash two child nodes into their parent
pub fn node_hash(left: &Hash256, right: &Hash256) -> Hash256 {
    let mut hasher = Blake2b256::new();
    hasher.update([NODE_HASH_PREFIX]);
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    Hash256(hasher.finalize().into())
}

/// A subtree on the stack: its root and its height
struct Subtree {
    root: Hash256,
    height: u32,
}

/// Calculate the merkle root of a list of leaves
///
/// Returns the zero hash for an empty list.
pub fn merkle_root<L: AsRef<[u8]>>(leaves: &[L]) -> Hash256 {
    let mut stack: Vec<Subtree> = Vec::new();

    for leaf in leaves {
        let mut current = Subtree {
            root: leaf_hash(leaf.as_ref()),
            height: 0,
        };
        // Join equal-height subtrees as soon as they appear
        while let Some(top) = stack.pop() {
            if top.height != current.height {
                stack.push(top);
                break;
            }
            current = Subtree {
                root: node_hash(&top.root, &current.root),
                height: current.height + 1,
            };
        }
        stack.push(current);
    }

    // Fold remaining subtrees from smallest (right) to largest (left)
    let mut iter = stack.into_iter().rev();
    let mut root = match iter.next() {
        Some(subtree) => subtree.root,
        None => return Hash256::zero(),
    };
    for subtree in iter {
        root = node_hash(&subtree.root, &root);
    }
    root
}

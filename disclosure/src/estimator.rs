//! The cardinality-estimator capability and a reference HyperLogLog.
//!
//! Masking only needs three things from an estimator: an estimated count, a way
//! to start empty, and a way to add a hashed identity. Everything else about
//! the encoding stays behind [`CardinalityEstimate`].

use std::{collections::BTreeSet, fmt};

use sha2::{Digest, Sha256};

use crate::error::SketchError;

/// Prefix of the synthetic identities fed into estimators built by
/// [`build_synthetic`].
pub const SYNTHETIC_ID_PREFIX: &str = "DisclosureSyntheticId";

/// A probabilistic distinct-count sketch.
pub trait CardinalityEstimate: Clone {
    /// Returns a sketch that has observed nothing.
    fn empty() -> Self;
    /// Adds one identity, already passed through a one-way digest.
    fn add_hashed(&mut self, digest: &[u8]);
    /// Folds `other` into `self`.
    fn merge(&mut self, other: &Self);
    /// Returns the estimated number of distinct identities.
    fn estimated_count(&self) -> f64;
}

/// Returns the `index`-th synthetic identity.
pub fn synthetic_id(index: u64) -> String {
    format!("{SYNTHETIC_ID_PREFIX}_{index}")
}

/// Builds an estimator that has observed exactly `count` synthetic identities.
///
/// The output is deterministic: two calls with the same `count` produce
/// estimators that observed the same digests. Cost is linear in `count`.
pub fn build_synthetic<E: CardinalityEstimate>(count: u64) -> E {
    let mut estimate = E::empty();
    for index in 0..count {
        let digest = Sha256::digest(synthetic_id(index).as_bytes());
        estimate.add_hashed(&digest);
    }
    estimate
}

const PRECISION: u32 = 14;
const REGISTER_COUNT: usize = 1 << PRECISION;
const SPARSE_LIMIT: usize = REGISTER_COUNT / 4;
#[allow(clippy::cast_possible_truncation)]
const MAX_RANK: u8 = (64 - PRECISION + 1) as u8;

/// HyperLogLog with 2^14 registers.
///
/// Small sets are kept as exact 64-bit hashes and report exact counts; past
/// 4096 distinct hashes the sketch switches to dense registers.
///
/// Deserialized state is checked: a dense sketch must carry exactly 2^14
/// registers with ranks no sketch could exceed, and a sparse one at most
/// 4096 hashes. Anything else is rejected with a [`SketchError`].
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawSketch")
)]
pub struct HyperLogLog {
    repr: Repr,
}

/// Unchecked wire form of [`HyperLogLog`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawSketch {
    repr: Repr,
}

#[cfg(feature = "serde")]
impl TryFrom<RawSketch> for HyperLogLog {
    type Error = SketchError;

    fn try_from(raw: RawSketch) -> Result<Self, Self::Error> {
        Self::from_repr(raw.repr)
    }
}

#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
enum Repr {
    Sparse(BTreeSet<u64>),
    Dense(Vec<u8>),
}

impl HyperLogLog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            repr: Repr::Sparse(BTreeSet::new()),
        }
    }

    #[cfg_attr(not(feature = "serde"), allow(dead_code))]
    fn from_repr(repr: Repr) -> Result<Self, SketchError> {
        match &repr {
            Repr::Sparse(hashes) if hashes.len() > SPARSE_LIMIT => {
                return Err(SketchError::SparseOverflow {
                    found: hashes.len(),
                    limit: SPARSE_LIMIT,
                });
            }
            Repr::Sparse(_) => {}
            Repr::Dense(registers) => {
                if registers.len() != REGISTER_COUNT {
                    return Err(SketchError::RegisterCount {
                        found: registers.len(),
                        expected: REGISTER_COUNT,
                    });
                }
                if let Some((index, &rank)) = registers
                    .iter()
                    .enumerate()
                    .find(|&(_, &rank)| rank > MAX_RANK)
                {
                    return Err(SketchError::RegisterRank {
                        index,
                        rank,
                        max: MAX_RANK,
                    });
                }
            }
        }
        Ok(Self { repr })
    }

    /// Returns `true` while the sketch still stores exact hashes.
    pub fn is_sparse(&self) -> bool {
        matches!(self.repr, Repr::Sparse(_))
    }

    fn insert_hash(&mut self, hash: u64) {
        let overflowed = match &mut self.repr {
            Repr::Sparse(hashes) => {
                hashes.insert(hash);
                hashes.len() > SPARSE_LIMIT
            }
            Repr::Dense(registers) => {
                update_register(registers, hash);
                false
            }
        };
        if overflowed {
            let registers = self.take_registers();
            self.repr = Repr::Dense(registers);
        }
    }

    /// Moves the current state out as dense registers.
    fn take_registers(&mut self) -> Vec<u8> {
        match std::mem::replace(&mut self.repr, Repr::Sparse(BTreeSet::new())) {
            Repr::Dense(registers) => registers,
            Repr::Sparse(hashes) => {
                let mut registers = vec![0u8; REGISTER_COUNT];
                for hash in hashes {
                    update_register(&mut registers, hash);
                }
                registers
            }
        }
    }
}

impl Default for HyperLogLog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HyperLogLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.is_sparse() { "sparse" } else { "dense" };
        f.debug_struct("HyperLogLog")
            .field("mode", &mode)
            .field("estimate", &self.estimated_count())
            .finish()
    }
}

impl CardinalityEstimate for HyperLogLog {
    fn empty() -> Self {
        Self::new()
    }

    fn add_hashed(&mut self, digest: &[u8]) {
        self.insert_hash(fold_digest(digest));
    }

    fn merge(&mut self, other: &Self) {
        match &other.repr {
            Repr::Sparse(hashes) => {
                for &hash in hashes {
                    self.insert_hash(hash);
                }
            }
            Repr::Dense(theirs) => {
                let mut mine = self.take_registers();
                for (register, other) in mine.iter_mut().zip(theirs) {
                    *register = (*register).max(*other);
                }
                self.repr = Repr::Dense(mine);
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn estimated_count(&self) -> f64 {
        match &self.repr {
            Repr::Sparse(hashes) => hashes.len() as f64,
            Repr::Dense(registers) => {
                let m = REGISTER_COUNT as f64;
                let mut sum = 0.0;
                let mut zeros = 0usize;
                for &register in registers {
                    sum += 2f64.powi(-i32::from(register));
                    if register == 0 {
                        zeros += 1;
                    }
                }
                let alpha = 0.7213 / (1.0 + 1.079 / m);
                let raw = alpha * m * m / sum;
                // Linear counting is far more accurate for small ranges.
                if raw <= 2.5 * m && zeros > 0 {
                    m * (m / zeros as f64).ln()
                } else {
                    raw
                }
            }
        }
    }
}

/// Takes the leading 8 bytes of a digest as a big-endian hash, zero padded.
fn fold_digest(digest: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    let len = digest.len().min(bytes.len());
    bytes[..len].copy_from_slice(&digest[..len]);
    u64::from_be_bytes(bytes)
}

fn update_register(registers: &mut [u8], hash: u64) {
    let index = usize::try_from(hash >> (64 - PRECISION)).unwrap_or(0);
    // The sentinel bit caps the rank at 64 - PRECISION + 1.
    let remainder = (hash << PRECISION) | (1 << (PRECISION - 1));
    let rank = u8::try_from(remainder.leading_zeros() + 1).unwrap_or(u8::MAX);
    if let Some(register) = registers.get_mut(index) {
        *register = (*register).max(rank);
    }
}

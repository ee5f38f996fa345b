//! Bloom filter engine with a compact `.bf` file format.
//!
//! HowTo:
//!    * Sizing: `m = ceil(-n * ln(p) / ln(2)^2)` bits and
//!      `k = max(1, round(m / n * ln(2)))` positions per element, for `n`
//!      elements at false positive rate `p`.
//!    * Positions: a single 64 bit base hash `h` per element, position `i` is
//!      `(h + i * 0x9e3779b97f4a7c16) mod m`.
//!    * Persistence: 20 byte little-endian header (`m`, `k`, `n` as i32,
//!      error rate as f64) followed by the raw bit array.
//!
//! Insertion:
//!     * Sets the `k` bits and increments `n`. Bits are never cleared.
//! Query:
//!     * An element is reported present only if all `k` bits are set.
//! Loading:
//!     * Truncated or padded files are repaired rather than rejected, and
//!       every repair is reported as a [`bloom::LoadDiagnostic`].
//!
//! Obvious problems:
//!     * Positions derived from one hash are far less independent than `k`
//!       separate hashes: the positions of an element form an arithmetic
//!       progression mod `m`, and elements on overlapping progressions share
//!       bits. At the sized element count the observed false positive rate
//!       is well above the target rate.
//!     * The hash function is not recorded in the file. Filters must be
//!       read with the function they were written with.
//!     * No internal locking; share a filter across threads behind a mutex.

pub mod bloom;
pub mod common;
mod hash;

pub use bloom::{
    BloomError, BloomFilter, BloomFilterConfig, BloomFilterConfigBuilder,
    BloomFilterOps, BloomFilterStats, BloomResult, BulkBloomFilterOps,
    FilterStats, LoadDiagnostic, Severity,
};
pub use hash::{
    HashFunction, POSITION_STEP, default_hash_function,
    estimated_false_positive_rate, fnv_hash_function, optimal_bit_vector_size,
    optimal_num_hashes, optimal_parameters, bit_positions,
};

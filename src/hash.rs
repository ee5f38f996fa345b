use crate::bloom::{BloomError, BloomResult};
use fnv::FnvHasher;
use murmur3::murmur3_x64_128;
use std::hash::Hasher;
use std::io::Cursor;

/// A type alias for the base hash used by the Bloom filter.
///
/// **Parameters:**
///
/// - `item: &[u8]`
///   - A byte slice representing the item to be hashed.
///
/// **Returns:**
///
/// - `u64`
///   - The base hash. All `k` bit positions of an item are derived from
///     this single value, see [`bit_positions`].
///
/// **Usage:**
///
/// The function must be deterministic across processes and platforms,
/// otherwise filters written by one process can not be queried by another.
/// The choice of function is not stored in the `.bf` file.
pub type HashFunction = fn(&[u8]) -> u64;

/// Odd constant derived from the fractional part of the golden ratio,
/// added once per position to spread successive positions.
pub const POSITION_STEP: u64 = 0x9e37_79b9_7f4a_7c16;

pub(crate) fn hash_murmur64(key: &[u8]) -> u64 {
    let mut cursor = Cursor::new(key);
    // lower half of the 128 bit digest
    murmur3_x64_128(&mut cursor, 0).expect("Failed to compute Murmur3 hash")
        as u64
}

pub(crate) fn hash_fnv64(key: &[u8]) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(key);
    hasher.finish()
}

/// MurmurHash3 x64/128 with seed 0, truncated to 64 bits.
pub fn default_hash_function(item: &[u8]) -> u64 {
    hash_murmur64(item)
}

/// 64-bit FNV-1a.
pub fn fnv_hash_function(item: &[u8]) -> u64 {
    hash_fnv64(item)
}

/// Yields `(base + i * POSITION_STEP) mod capacity` for `i` in `0..num_hashes`.
///
/// The sum is computed in 128-bit arithmetic, so nothing wraps before the
/// modulo is taken. `capacity` must be non-zero.
pub fn bit_positions(
    base: u64,
    num_hashes: usize,
    capacity: usize,
) -> impl Iterator<Item = usize> {
    let capacity = capacity as u128;
    (0..num_hashes as u128).map(move |i| {
        ((base as u128 + i * POSITION_STEP as u128) % capacity) as usize
    })
}

pub fn optimal_bit_vector_size(n: usize, fpr: f64) -> usize {
    let ln2 = std::f64::consts::LN_2;
    ((-(n as f64) * fpr.ln()) / (ln2 * ln2)).ceil() as usize
}

pub fn optimal_num_hashes(n: usize, m: usize) -> usize {
    let k = ((m as f64 / n as f64) * std::f64::consts::LN_2).round() as usize;
    k.max(1)
}

/// Derives `(m, k)` for `num_elements` items at the target `error_rate`.
///
/// Fails when `num_elements` is zero or `error_rate` lies outside the open
/// interval `(0, 1)`.
pub fn optimal_parameters(
    num_elements: usize,
    error_rate: f64,
) -> BloomResult<(usize, usize)> {
    if num_elements == 0 {
        return Err(BloomError::ZeroCapacity);
    }
    // NaN fails both comparisons, so test for the valid range instead
    if !(error_rate > 0.0 && error_rate < 1.0) {
        return Err(BloomError::InvalidFalsePositiveRate { rate: error_rate });
    }

    let m = optimal_bit_vector_size(num_elements, error_rate);
    let k = optimal_num_hashes(num_elements, m);
    Ok((m, k))
}

/// Theoretical false positive probability `(1 - e^(-k n / m))^k`.
pub fn estimated_false_positive_rate(m: usize, k: usize, n: usize) -> f64 {
    if m == 0 {
        return 1.0;
    }
    let exponent = -(k as f64) * (n as f64) / (m as f64);
    (1.0 - exponent.exp()).powi(k as i32)
}

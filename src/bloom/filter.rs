use super::{
    BloomError, BloomFilterConfig, BloomFilterOps, BloomFilterStats,
    BloomParams, BloomResult, BulkBloomFilterOps,
};
use crate::hash::{
    HashFunction, default_hash_function, estimated_false_positive_rate,
    optimal_parameters, bit_positions,
};
use bitvec::{order::Lsb0, vec::BitVec};
use serde::Serialize;
use std::fmt;
use std::io::BufRead;
use tracing::debug;

/// Standard Bloom filter over a byte-aligned bit array.
///
/// Bit `p` lives in byte `p / 8` at bit `p % 8`, least significant bit
/// first, which is the on-disk layout of the `.bf` format.
pub struct BloomFilter {
    bits: BitVec<u8, Lsb0>,
    m: usize,
    k: usize,
    n: usize,
    error_rate: f64,
    hash_function: HashFunction,
}

/// Point-in-time statistics of a filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterStats {
    pub bits: usize,
    pub num_hashes: usize,
    pub insert_count: usize,
    pub error_rate: f64,
    pub byte_len: usize,
    pub set_bits: usize,
    pub density: f64,
    pub estimated_fpr: f64,
}

impl BloomFilter {
    /// Creates an empty filter sized for `config.capacity` elements.
    pub fn new(config: BloomFilterConfig) -> BloomResult<Self> {
        let params = BloomParams::try_from(&config)?;
        let filter = Self::with_params(
            params.bit_vector_size,
            params.num_hashes,
            0,
            config.false_positive_rate,
        )?
        .with_hash_function(config.hash_function);

        debug!(
            capacity = config.capacity,
            bits = filter.m,
            hashes = filter.k,
            "Created bloom filter"
        );
        Ok(filter)
    }

    /// Creates a zeroed filter from explicit parameters.
    ///
    /// `m == 0` is accepted and yields a filter that rejects inserts and
    /// queries. Values that can not be represented in the file header are
    /// rejected.
    pub fn with_params(
        m: usize,
        k: usize,
        n: usize,
        error_rate: f64,
    ) -> BloomResult<Self> {
        for (field, value) in [("m", m), ("k", k), ("n", n)] {
            if value > i32::MAX as usize {
                return Err(BloomError::HeaderOverflow { field, value });
            }
        }
        Ok(Self::from_raw_parts(
            m,
            k,
            n,
            error_rate,
            vec![0u8; m.div_ceil(8)],
        ))
    }

    pub(crate) fn from_raw_parts(
        m: usize,
        k: usize,
        n: usize,
        error_rate: f64,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            bits: BitVec::from_vec(bytes),
            m,
            k,
            n,
            error_rate,
            hash_function: default_hash_function,
        }
    }

    /// Builds a filter from text lines.
    ///
    /// Every line counts towards sizing, but only non-empty trimmed lines
    /// are inserted.
    pub fn from_lines<S: AsRef<str>>(
        lines: &[S],
        error_rate: f64,
    ) -> BloomResult<Self> {
        Self::from_lines_with(lines, error_rate, default_hash_function)
    }

    pub fn from_lines_with<S: AsRef<str>>(
        lines: &[S],
        error_rate: f64,
        hash_function: HashFunction,
    ) -> BloomResult<Self> {
        if lines.is_empty() {
            return Err(BloomError::EmptyInput);
        }

        let (m, k) = optimal_parameters(lines.len(), error_rate)?;
        let mut filter = Self::with_params(m, k, 0, error_rate)?
            .with_hash_function(hash_function);

        for line in lines {
            let element = line.as_ref().trim();
            if !element.is_empty() {
                filter.insert(element)?;
            }
        }

        debug!(
            lines = lines.len(),
            inserted = filter.n,
            bits = m,
            hashes = k,
            "Built bloom filter from lines"
        );
        Ok(filter)
    }

    /// Reads `reader` to the end and builds a filter from its lines.
    ///
    /// `\n`, `\r\n` and a lone `\r` all end a line. Invalid UTF-8
    /// sequences are dropped, so a line made only of them counts towards
    /// sizing but is not inserted.
    pub fn from_reader<R: BufRead>(
        mut reader: R,
        error_rate: f64,
    ) -> BloomResult<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        let lines: Vec<String> = universal_lines(&data)
            .into_iter()
            .map(decode_ignoring_invalid)
            .collect();
        Self::from_lines(&lines, error_rate)
    }

    /// Replaces the base hash. Must match the function used by whoever
    /// wrote the bits.
    pub fn with_hash_function(mut self, hash_function: HashFunction) -> Self {
        self.hash_function = hash_function;
        self
    }

    pub fn m(&self) -> usize {
        self.m
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    /// Raw bit array, exactly as it is written to disk.
    pub fn as_bytes(&self) -> &[u8] {
        self.bits.as_raw_slice()
    }

    pub fn is_initialized(&self) -> bool {
        self.m > 0 && self.k > 0
    }

    pub fn stats(&self) -> FilterStats {
        FilterStats {
            bits: self.m,
            num_hashes: self.k,
            insert_count: self.n,
            error_rate: self.error_rate,
            byte_len: self.as_bytes().len(),
            set_bits: self.set_bits(),
            density: self.density(),
            estimated_fpr: estimated_false_positive_rate(self.m, self.k, self.n),
        }
    }

    fn ensure_initialized(&self) -> BloomResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(BloomError::NotInitialized {
                bits: self.m,
                hashes: self.k,
            })
        }
    }

    fn positions(&self, item: &[u8]) -> impl Iterator<Item = usize> {
        bit_positions((self.hash_function)(item), self.k, self.m)
    }
}

fn universal_lines(data: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b'\n' => {
                lines.push(&data[start..i]);
                start = i + 1;
            }
            b'\r' => {
                lines.push(&data[start..i]);
                if data.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    // trailing text without a terminator is still a line
    if start < data.len() {
        lines.push(&data[start..]);
    }
    lines
}

fn decode_ignoring_invalid(raw: &[u8]) -> String {
    raw.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

impl Default for BloomFilter {
    /// The degraded empty filter: no bits, no hashes, zero error rate.
    fn default() -> Self {
        Self::from_raw_parts(0, 0, 0, 0.0, Vec::new())
    }
}

impl fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BloomFilter")
            .field("m", &self.m)
            .field("k", &self.k)
            .field("n", &self.n)
            .field("error_rate", &self.error_rate)
            .field("byte_len", &self.as_bytes().len())
            .finish()
    }
}

impl BloomFilterOps for BloomFilter {
    fn insert<T: AsRef<[u8]> + ?Sized>(&mut self, item: &T) -> BloomResult<()> {
        self.ensure_initialized()?;

        // k may come from an untrusted header, positions are not buffered
        let base = (self.hash_function)(item.as_ref());
        for idx in bit_positions(base, self.k, self.m) {
            self.bits.set(idx, true);
        }

        self.n += 1;
        Ok(())
    }

    fn contains<T: AsRef<[u8]> + ?Sized>(&self, item: &T) -> BloomResult<bool> {
        self.ensure_initialized()?;
        Ok(self.positions(item.as_ref()).all(|idx| self.bits[idx]))
    }
}

impl BulkBloomFilterOps for BloomFilter {
    fn insert_bulk<T: AsRef<[u8]>>(&mut self, items: &[T]) -> BloomResult<()> {
        for item in items {
            self.insert(item)?;
        }
        Ok(())
    }

    fn contains_bulk<T: AsRef<[u8]>>(
        &self,
        items: &[T],
    ) -> BloomResult<Vec<bool>> {
        items.iter().map(|item| self.contains(item)).collect()
    }
}

impl BloomFilterStats for BloomFilter {
    fn capacity(&self) -> usize {
        self.m
    }

    fn num_hashes(&self) -> usize {
        self.k
    }

    fn insert_count(&self) -> usize {
        self.n
    }

    fn false_positive_rate(&self) -> f64 {
        self.error_rate
    }

    fn set_bits(&self) -> usize {
        self.bits.count_ones()
    }

    fn density(&self) -> f64 {
        if self.m == 0 {
            0.0
        } else {
            self.set_bits() as f64 / self.m as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bloom::BloomFilterConfigBuilder;
    use crate::hash::{POSITION_STEP, fnv_hash_function};

    fn filter(capacity: usize, fpr: f64) -> BloomFilter {
        let config = BloomFilterConfigBuilder::default()
            .capacity(capacity)
            .false_positive_rate(fpr)
            .build()
            .unwrap();
        BloomFilter::new(config).unwrap()
    }

    #[test]
    fn test_new_allocates_whole_bytes() {
        let f = filter(1000, 0.01);
        assert_eq!(f.m(), 9586);
        assert_eq!(f.k(), 7);
        assert_eq!(f.n(), 0);
        assert_eq!(f.as_bytes().len(), 9586usize.div_ceil(8));
        assert_eq!(f.set_bits(), 0);
    }

    #[test]
    fn test_insert_sets_expected_bits() {
        let mut f = BloomFilter::with_params(64, 3, 0, 0.1).unwrap();
        f.insert("element").unwrap();

        let base = default_hash_function(b"element");
        let mut expected = [0u8; 8];
        for i in 0..3u128 {
            let pos = ((base as u128 + i * POSITION_STEP as u128) % 64) as usize;
            expected[pos / 8] |= 1 << (pos % 8);
        }
        assert_eq!(f.as_bytes(), &expected);
        assert_eq!(f.n(), 1);
    }

    #[test]
    fn test_uninitialized_filter_rejects_operations() {
        let mut f = BloomFilter::default();
        assert!(matches!(
            f.insert("x"),
            Err(BloomError::NotInitialized { bits: 0, hashes: 0 })
        ));
        assert!(f.contains("x").is_err());

        let mut no_hashes = BloomFilter::with_params(16, 0, 0, 0.1).unwrap();
        assert!(no_hashes.insert("x").is_err());
        assert_eq!(no_hashes.n(), 0);
    }

    #[test]
    fn test_header_overflow_rejected() {
        let too_big = i32::MAX as usize + 1;
        assert!(matches!(
            BloomFilter::with_params(8, too_big, 0, 0.1),
            Err(BloomError::HeaderOverflow { field: "k", .. })
        ));
    }

    #[test]
    fn test_hash_function_changes_positions() {
        let mut murmur = BloomFilter::with_params(1024, 4, 0, 0.01).unwrap();
        let mut fnv = BloomFilter::with_params(1024, 4, 0, 0.01)
            .unwrap()
            .with_hash_function(fnv_hash_function);
        murmur.insert("same").unwrap();
        fnv.insert("same").unwrap();
        assert!(fnv.contains("same").unwrap());
        assert_ne!(murmur.as_bytes(), fnv.as_bytes());
    }

    #[test]
    fn test_from_lines_counts_all_lines() {
        let lines = ["  alpha ", "", "beta", "\t"];
        let f = BloomFilter::from_lines(&lines, 0.01).unwrap();
        let (m, k) = optimal_parameters(4, 0.01).unwrap();
        assert_eq!((f.m(), f.k()), (m, k));
        assert_eq!(f.n(), 2);
        assert!(f.contains("alpha").unwrap());
        assert!(f.contains("beta").unwrap());
    }

    #[test]
    fn test_from_lines_empty_input() {
        let lines: [&str; 0] = [];
        assert!(matches!(
            BloomFilter::from_lines(&lines, 0.01),
            Err(BloomError::EmptyInput)
        ));
    }

    #[test]
    fn test_from_reader_drops_invalid_utf8() {
        let data: &[u8] = b"one\r\ntwo\n\xff\xfe\nth\xffree\n";
        let f = BloomFilter::from_reader(data, 0.01).unwrap();
        let (m, k) = optimal_parameters(4, 0.01).unwrap();
        assert_eq!((f.m(), f.k()), (m, k));
        assert_eq!(f.n(), 3);
        assert!(f.contains("one").unwrap());
        assert!(f.contains("two").unwrap());
        assert!(f.contains("three").unwrap());
    }

    #[test]
    fn test_universal_lines() {
        let expected = vec![&b"a"[..], &b"b"[..], &b"c"[..], &b"d"[..]];
        assert_eq!(universal_lines(b"a\rb\r\nc\nd"), expected);
        let expected = vec![&b"a"[..], &b""[..]];
        assert_eq!(universal_lines(b"a\r\r"), expected);
        assert!(universal_lines(b"").is_empty());
        assert_eq!(decode_ignoring_invalid(b"\xff\xfe"), "");
    }

    #[test]
    fn test_insert_with_large_hash_count() {
        // a corrupt header may carry a huge k
        let mut f = BloomFilter::from_raw_parts(64, 1_000_000, 0, 0.5, vec![0; 8]);
        f.insert("many hashes").unwrap();
        assert!(f.contains("many hashes").unwrap());
        assert_eq!(f.n(), 1);
        assert!(f.set_bits() > 1);
    }

    #[test]
    fn test_density_and_stats() {
        let mut f = BloomFilter::with_params(16, 1, 0, 0.5).unwrap();
        assert_eq!(f.density(), 0.0);
        f.insert("a").unwrap();
        let stats = f.stats();
        assert_eq!(stats.set_bits, 1);
        assert_eq!(stats.density, 1.0 / 16.0);
        assert_eq!(stats.byte_len, 2);
        assert_eq!(stats.insert_count, 1);
        assert_eq!(BloomFilter::default().density(), 0.0);
    }
}

use super::BloomResult;

pub trait BloomFilterOps {
    /// Sets the `k` bits of `item` and bumps the insert counter.
    fn insert<T: AsRef<[u8]> + ?Sized>(&mut self, item: &T) -> BloomResult<()>;
    /// `false` means definitely absent; `true` means possibly present.
    fn contains<T: AsRef<[u8]> + ?Sized>(&self, item: &T) -> BloomResult<bool>;
}

pub trait BloomFilterStats {
    /// Number of addressable bits (m)
    fn capacity(&self) -> usize;
    /// Hash positions per element (k)
    fn num_hashes(&self) -> usize;
    /// Elements inserted so far (n)
    fn insert_count(&self) -> usize;
    fn false_positive_rate(&self) -> f64;
    fn set_bits(&self) -> usize;
    /// `set_bits / capacity`, or 0 for an empty filter
    fn density(&self) -> f64;
}

pub trait BulkBloomFilterOps {
    fn insert_bulk<T: AsRef<[u8]>>(&mut self, items: &[T]) -> BloomResult<()>;
    fn contains_bulk<T: AsRef<[u8]>>(&self, items: &[T])
    -> BloomResult<Vec<bool>>;
}

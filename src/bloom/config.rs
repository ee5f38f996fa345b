use super::{BloomError, BloomResult};
use crate::hash::{HashFunction, default_hash_function, optimal_parameters};
use derive_builder::Builder;

#[derive(Clone, Debug, Builder)]
#[builder(pattern = "owned")]
pub struct BloomFilterConfig {
    /// Expected number of elements
    #[builder(default = "1_000_000")]
    pub capacity: usize,

    /// Target false positive rate (0.0 to 1.0, exclusive)
    #[builder(default = "0.01")]
    pub false_positive_rate: f64,

    /// Base hash from which bit positions are derived
    #[builder(default = "default_hash_function")]
    pub hash_function: HashFunction,
}

impl BloomFilterConfig {
    pub fn validate(&self) -> BloomResult<()> {
        if self.capacity == 0 {
            return Err(BloomError::ZeroCapacity);
        }
        if !(self.false_positive_rate > 0.0 && self.false_positive_rate < 1.0) {
            return Err(BloomError::InvalidFalsePositiveRate {
                rate: self.false_positive_rate,
            });
        }
        Ok(())
    }
}

/// Derived parameters calculated from BloomFilterConfig
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BloomParams {
    pub bit_vector_size: usize,
    pub num_hashes: usize,
}

impl TryFrom<&BloomFilterConfig> for BloomParams {
    type Error = BloomError;

    fn try_from(config: &BloomFilterConfig) -> BloomResult<Self> {
        config.validate()?;
        let (bit_vector_size, num_hashes) =
            optimal_parameters(config.capacity, config.false_positive_rate)?;

        Ok(Self {
            bit_vector_size,
            num_hashes,
        })
    }
}

//! Standard Bloom Filter implementation
pub mod config;
pub mod error;
pub mod filter;
pub mod storage;
pub mod traits;

pub use config::{BloomFilterConfig, BloomFilterConfigBuilder, BloomParams};
pub use error::{BloomError, BloomResult};
pub use filter::{BloomFilter, FilterStats};
pub use storage::{FileHeader, HEADER_LEN, LoadDiagnostic, Severity};
pub use traits::{BloomFilterOps, BloomFilterStats, BulkBloomFilterOps};

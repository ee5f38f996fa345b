//! `.bf` file format.
//!
//! ```text
//! offset  size  field
//!      0     4  m           i32 LE
//!      4     4  k           i32 LE
//!      8     4  n           i32 LE
//!     12     8  error_rate  f64 LE
//!     20     *  bit array   ceil(m / 8) bytes, nominally
//! ```
//!
//! Loading never fails on structural damage. Mismatches between the
//! declared size and the bytes actually present are reconciled and
//! reported as [`LoadDiagnostic`]s next to the recovered filter.

use super::{BloomError, BloomFilter, BloomResult};
use bincode::{Decode, Encode};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

pub const HEADER_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode)]
pub struct FileHeader {
    pub m: i32,
    pub k: i32,
    pub n: i32,
    pub error_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Info,
}

/// Advisory finding produced while loading a `.bf` stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadDiagnostic {
    /// Fewer than [`HEADER_LEN`] bytes; an empty filter was returned.
    HeaderTooShort { len: usize },
    /// A header integer was negative and has been treated as 0.
    NegativeField { field: &'static str, value: i32 },
    /// The bit array holds fewer bits than declared; `m` was lowered.
    BitArrayTooShort { declared_bits: usize, actual_bits: usize },
    /// At least one whole surplus byte followed the bit array and was dropped.
    BitArrayTruncated { declared_bits: usize, extra_bits: usize },
}

impl LoadDiagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            LoadDiagnostic::BitArrayTruncated { .. } => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for LoadDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadDiagnostic::HeaderTooShort { len } => write!(
                f,
                "File is shorter than minimum header length ({HEADER_LEN} bytes, got {len}). \
                 Data may be incomplete or corrupted."
            ),
            LoadDiagnostic::NegativeField { field, value } => {
                write!(f, "Header field `{field}` is negative ({value}), using 0.")
            }
            LoadDiagnostic::BitArrayTooShort {
                declared_bits,
                actual_bits,
            } => write!(
                f,
                "Bit array is too short for declared size. Declared {declared_bits} bits, \
                 got {actual_bits} bits. The filter may be incomplete or corrupted."
            ),
            LoadDiagnostic::BitArrayTruncated {
                declared_bits,
                extra_bits,
            } => write!(
                f,
                "Bit array is longer than declared size ({declared_bits} bits) by \
                 {extra_bits} bits. Truncating extra bits."
            ),
        }
    }
}

fn non_negative(
    field: &'static str,
    value: i32,
    diagnostics: &mut Vec<LoadDiagnostic>,
) -> usize {
    usize::try_from(value).unwrap_or_else(|_| {
        diagnostics.push(LoadDiagnostic::NegativeField { field, value });
        0
    })
}

fn header_field(field: &'static str, value: usize) -> BloomResult<i32> {
    i32::try_from(value).map_err(|_| BloomError::HeaderOverflow { field, value })
}

impl BloomFilter {
    pub fn header(&self) -> BloomResult<FileHeader> {
        Ok(FileHeader {
            m: header_field("m", self.m())?,
            k: header_field("k", self.k())?,
            n: header_field("n", self.n())?,
            error_rate: self.error_rate(),
        })
    }

    /// Header followed by the bit array, verbatim.
    pub fn to_bytes(&self) -> BloomResult<Vec<u8>> {
        let mut bytes =
            bincode::encode_to_vec(self.header()?, bincode::config::legacy())?;
        bytes.extend_from_slice(self.as_bytes());
        Ok(bytes)
    }

    pub fn save<W: Write>(&self, mut writer: W) -> BloomResult<()> {
        let bytes = self.to_bytes()?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        debug!(bytes = bytes.len(), "Saved bloom filter");
        Ok(())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> BloomResult<()> {
        let file = File::create(path.as_ref())?;
        self.save(BufWriter::new(file))
    }

    /// Reads the whole stream and reconstructs a filter from it.
    ///
    /// Only I/O failures are errors; see [`BloomFilter::from_bytes`].
    pub fn load<R: Read>(
        mut reader: R,
    ) -> BloomResult<(Self, Vec<LoadDiagnostic>)> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    pub fn load_from_path<P: AsRef<Path>>(
        path: P,
    ) -> BloomResult<(Self, Vec<LoadDiagnostic>)> {
        let file = File::open(path.as_ref())?;
        Self::load(BufReader::new(file))
    }

    /// Decodes a `.bf` image, reconciling the declared bit count with the
    /// bytes present:
    ///
    /// * short header: empty filter plus a warning
    /// * fewer bits than declared: `m` drops to the available bits, warning
    /// * a whole surplus byte or more: buffer cut to `ceil(m / 8)`, info
    /// * up to 7 padding bits: accepted silently
    pub fn from_bytes(data: &[u8]) -> BloomResult<(Self, Vec<LoadDiagnostic>)> {
        let mut diagnostics = Vec::new();

        if data.len() < HEADER_LEN {
            diagnostics.push(LoadDiagnostic::HeaderTooShort { len: data.len() });
            log_diagnostics(&diagnostics);
            return Ok((Self::default(), diagnostics));
        }

        let (header, _): (FileHeader, usize) = bincode::decode_from_slice(
            &data[..HEADER_LEN],
            bincode::config::legacy(),
        )?;

        let declared_bits = non_negative("m", header.m, &mut diagnostics);
        let k = non_negative("k", header.k, &mut diagnostics);
        let n = non_negative("n", header.n, &mut diagnostics);

        let mut bytes = data[HEADER_LEN..].to_vec();
        let actual_bits = bytes.len() * 8;

        let m = if actual_bits < declared_bits {
            diagnostics.push(LoadDiagnostic::BitArrayTooShort {
                declared_bits,
                actual_bits,
            });
            actual_bits
        } else {
            let extra_bits = actual_bits - declared_bits;
            if extra_bits > 7 {
                diagnostics.push(LoadDiagnostic::BitArrayTruncated {
                    declared_bits,
                    extra_bits,
                });
            }
            bytes.truncate(declared_bits.div_ceil(8));
            declared_bits
        };

        log_diagnostics(&diagnostics);
        debug!(m, k, n, error_rate = header.error_rate, "Loaded bloom filter");

        Ok((
            Self::from_raw_parts(m, k, n, header.error_rate, bytes),
            diagnostics,
        ))
    }
}

fn log_diagnostics(diagnostics: &[LoadDiagnostic]) {
    for diagnostic in diagnostics {
        debug!(severity = ?diagnostic.severity(), "{diagnostic}");
    }
}

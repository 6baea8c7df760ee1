pub mod bits;
pub mod delim;
pub mod engine;
pub mod frequency;
pub mod pqueue;
pub mod tree;


/// Number of consecutive source bytes grouped into one alphabet word.
pub const WORD_WIDTH: usize = 2;

/// Bit width of one word's numeric index.
pub const ALPHABET_BITS: usize = WORD_WIDTH * 8;

/// Number of distinct alphabet words (65,536 for two-byte words).
pub const DICT_SIZE: usize = 1 << ALPHABET_BITS;

/// Bit width of the staging register used by the bit-stream writer and
/// the decoder's word loads.
pub const REGISTER_BITS: usize = 64;

/// Worst-case encoded output bytes per source byte. Callers sizing
/// scratch buffers by this bound never overflow on realistic (clamped)
/// word distributions.
pub const MAX_ENCODING_SZ_PER_BYTE: usize = 6;

/// Worst-case decoded output bytes per encoded byte: every bit of an
/// encoded byte can complete a one-bit word code.
pub const MAX_DECODING_SZ_PER_BYTE: usize = WORD_WIDTH * 8;

/// Error types for huffrow operations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HuffError {
    /// The decoder ran past the end of the bit stream without meeting a
    /// field delimiter.
    TruncatedStream,
    /// Input data is invalid or corrupt.
    InvalidInput,
}

impl std::fmt::Display for HuffError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TruncatedStream => write!(f, "bit stream ended before a delimiter"),
            Self::InvalidInput => write!(f, "invalid input"),
        }
    }
}

impl std::error::Error for HuffError {}

pub type HuffResult<T> = Result<T, HuffError>;

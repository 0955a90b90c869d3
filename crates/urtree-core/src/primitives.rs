//! # Primitives
//!
//! Fixed runtime constants for the urtree core.

/// Magic bytes prefixed to every persisted `NodeStats` payload.
pub const MAGIC_BYTES: &[u8; 4] = b"URTS";

/// Current serialization format version of persisted `NodeStats`.
///
/// Increment this when the output record changes shape.
pub const FORMAT_VERSION: u8 = 1;

/// Number of columns in one output record (id + 21 reply + 21 ur).
pub const OUTPUT_COLUMNS: usize = 43;

/// Default number of output records handed to a sink at once.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Maximum number of records accepted for a single group.
///
/// Larger groups are rejected by the producer rather than risking
/// quadratic deviation passes over unbounded input.
pub const MAX_GROUP_RECORDS: usize = 1_000_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"URTS");
    }

    #[test]
    fn output_columns_split_evenly_between_variants() {
        assert_eq!((OUTPUT_COLUMNS - 1) % 2, 0);
    }
}

//! Layered memory: a medium-term per-session rolling window and a
//! long-term hybrid-searchable record store.

pub mod long;
pub mod medium;

pub use long::{LongMemory, MemoryIndexRequest, RetrievedMemory, VectorCapability};
pub use medium::{MediumEntry, MediumMemory};

/// Fixed embedding dimension. Every stored embedding is padded or
/// truncated to exactly this length.
pub const EMBEDDING_DIM: usize = 1536;

/// Normalize an embedding to the fixed dimension: truncate when longer,
/// zero-pad when shorter.
pub fn normalize_dimension(mut vector: Vec<f32>) -> Vec<f32> {
    vector.resize(EMBEDDING_DIM, 0.0);
    vector
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pads_short_vector() {
        let v = normalize_dimension(vec![1.0, 2.0]);
        assert_eq!(v.len(), EMBEDDING_DIM);
        assert_eq!(v[0], 1.0);
        assert_eq!(v[2], 0.0);
    }

    #[test]
    fn test_normalize_truncates_long_vector() {
        let v = normalize_dimension(vec![0.5; EMBEDDING_DIM + 100]);
        assert_eq!(v.len(), EMBEDDING_DIM);
    }
}

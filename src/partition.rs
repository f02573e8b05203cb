use std::slice::Chunks;

use crate::{
    error::ConfigurationError,
    types::{Batch, BatchIndex, ValidatedParticipant},
};

/// Lazy, restartable sequence of batches over a participant list.
///
/// A clone is an independent cursor, and calling [`partition`] again on the same input yields
/// the same batches.
#[derive(Debug, Clone)]
pub struct Batches<'a> {
    chunks: Chunks<'a, ValidatedParticipant>,
    next_index: BatchIndex,
}

/// Splits `participants` into consecutive batches of at most `chunk_size`, in input order.
pub fn partition(
    participants: &[ValidatedParticipant],
    chunk_size: usize,
) -> Result<Batches<'_>, ConfigurationError> {
    if chunk_size == 0 {
        return Err(ConfigurationError::ZeroChunkSize);
    }
    Ok(Batches { chunks: participants.chunks(chunk_size), next_index: 0 })
}

impl Iterator for Batches<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = self.chunks.next()?;
        let batch = Batch::new(self.next_index, chunk.to_vec());
        self.next_index += 1;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for Batches<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn participants(n: usize) -> Vec<ValidatedParticipant> {
        (0..n)
            .map(|i| ValidatedParticipant {
                account: format!("user{i}.testnet").parse().unwrap(),
                amount: i as u128,
            })
            .collect()
    }

    #[test]
    fn test_partition_with_remainder() {
        let input = participants(301);
        let batches: Vec<Batch> = partition(&input, 300).unwrap().collect();
        assert_eq!(batches.iter().map(Batch::size).collect::<Vec<_>>(), vec![300, 1]);
        assert_eq!(batches[1].index(), 1);
        assert_eq!(batches[1].participants()[0].account.as_str(), "user300.testnet");
    }

    #[test]
    fn test_partition_exact_multiple() {
        let input = participants(6);
        let batches = partition(&input, 3).unwrap();
        assert_eq!(batches.len(), 2);
        assert!(batches.map(|b| b.size()).all(|size| size == 3));
    }

    #[test]
    fn test_partition_zero_chunk_size() {
        let input = participants(5);
        assert_eq!(partition(&input, 0).unwrap_err(), ConfigurationError::ZeroChunkSize);
        assert_eq!(partition(&[], 0).unwrap_err(), ConfigurationError::ZeroChunkSize);
    }

    #[test]
    fn test_partition_empty_input() {
        assert_eq!(partition(&[], 10).unwrap().count(), 0);
    }

    #[test]
    fn test_partition_is_restartable() {
        let input = participants(7);
        let batches = partition(&input, 2).unwrap();
        let first: Vec<Batch> = batches.clone().collect();
        let second: Vec<Batch> = batches.collect();
        assert_eq!(first, second);
        assert_eq!(first, partition(&input, 2).unwrap().collect::<Vec<_>>());
    }

    proptest! {
        #[test]
        fn prop_partition_preserves_input(n in 0usize..200, chunk_size in 1usize..50) {
            let input = participants(n);
            let batches: Vec<Batch> = partition(&input, chunk_size).unwrap().collect();

            prop_assert_eq!(batches.len(), n.div_ceil(chunk_size));
            prop_assert!(batches.iter().all(|b| b.size() >= 1 && b.size() <= chunk_size));
            for (i, batch) in batches.iter().enumerate() {
                prop_assert_eq!(batch.index(), i);
            }

            let concatenated: Vec<ValidatedParticipant> =
                batches.iter().flat_map(|b| b.participants().iter().cloned()).collect();
            prop_assert_eq!(concatenated, input);
        }
    }
}

use serde::Serialize;

use crate::types::{
    common::{BaseUnits, BatchIndex},
    participant::ValidatedParticipant,
};

/// A contiguous, non-empty slice of the participant list, sent as one transaction.
///
/// Only the partitioner creates batches, so `index` is always the batch's position in the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    index: BatchIndex,
    participants: Vec<ValidatedParticipant>,
}

/// Call arguments of the contract's batch entry point.
#[derive(Serialize)]
struct AirdropArgs<'a> {
    participants: &'a [ValidatedParticipant],
}

impl Batch {
    pub(crate) fn new(index: BatchIndex, participants: Vec<ValidatedParticipant>) -> Self {
        debug_assert!(!participants.is_empty());
        Batch { index, participants }
    }

    pub fn index(&self) -> BatchIndex {
        self.index
    }

    pub fn size(&self) -> usize {
        self.participants.len()
    }

    pub fn participants(&self) -> &[ValidatedParticipant] {
        &self.participants
    }

    /// Sum of all amounts, `None` on overflow.
    pub fn total_amount(&self) -> Option<BaseUnits> {
        self.participants.iter().try_fold(0u128, |acc, p| acc.checked_add(p.amount))
    }

    /// JSON arguments for the contract call: `{"participants":[{"account":..,"amount":".."}]}`.
    pub fn to_args(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&AirdropArgs { participants: &self.participants })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(account: &str, amount: BaseUnits) -> ValidatedParticipant {
        ValidatedParticipant { account: account.parse().unwrap(), amount }
    }

    #[test]
    fn test_batch_args() {
        let batch = Batch::new(0, vec![participant("a.testnet", 1), participant("b.testnet", 20)]);
        let args: serde_json::Value = serde_json::from_slice(&batch.to_args().unwrap()).unwrap();
        assert_eq!(
            args,
            serde_json::json!({
                "participants": [
                    { "account": "a.testnet", "amount": "1" },
                    { "account": "b.testnet", "amount": "20" },
                ]
            })
        );
    }

    #[test]
    fn test_batch_total_amount() {
        let batch = Batch::new(3, vec![participant("a.testnet", 1), participant("b.testnet", 20)]);
        assert_eq!(batch.index(), 3);
        assert_eq!(batch.size(), 2);
        assert_eq!(batch.total_amount(), Some(21));

        let batch =
            Batch::new(0, vec![participant("a.testnet", u128::MAX), participant("b.testnet", 1)]);
        assert_eq!(batch.total_amount(), None);
    }
}

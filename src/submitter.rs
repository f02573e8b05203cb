use tracing::{debug, warn};

use crate::{
    config::{ContractEndpoint, GasBudget},
    error::{ConfigurationError, ErrorKind},
    ledger::Ledger,
    types::{Batch, Gas, SubmissionResult},
};

/// Sends batches to the contract, one transaction per batch.
///
/// The submitter owns its ledger session. It never retries; that decision belongs to the
/// [`DistributionRunner`](crate::engine::DistributionRunner), which knows what has already
/// been confirmed.
#[derive(Debug)]
pub struct TransactionSubmitter<L> {
    ledger: L,
    endpoint: ContractEndpoint,
    gas: GasBudget,
}

impl<L: Ledger> TransactionSubmitter<L> {
    pub fn new(ledger: L, endpoint: ContractEndpoint, gas: GasBudget) -> Self {
        TransactionSubmitter { ledger, endpoint, gas }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn endpoint(&self) -> &ContractEndpoint {
        &self.endpoint
    }

    /// Gas attached to a batch of `size` participants.
    pub fn gas_allowance(&self, size: usize) -> Result<Gas, ConfigurationError> {
        self.gas.allowance(size)
    }

    /// Submits `batch` once and waits for the ledger's verdict.
    pub async fn submit(&self, batch: &Batch) -> SubmissionResult {
        self.submit_attempt(batch, 1).await
    }

    pub(crate) async fn submit_attempt(&self, batch: &Batch, attempt: u32) -> SubmissionResult {
        let index = batch.index();

        let gas = match self.gas_allowance(batch.size()) {
            Ok(gas) => gas,
            Err(err) => {
                return SubmissionResult::failed(index, ErrorKind::Configuration(err), attempt);
            }
        };
        let args = match batch.to_args() {
            Ok(args) => args,
            Err(err) => {
                let kind = ErrorKind::Payload(err.to_string());
                return SubmissionResult::failed(index, kind, attempt);
            }
        };

        debug!(
            batch_index = index,
            size = batch.size(),
            gas,
            attempt,
            contract = %self.endpoint.contract_id,
            method = %self.endpoint.method,
            "Submitting batch"
        );

        match self
            .ledger
            .invoke(&self.endpoint.contract_id, &self.endpoint.method, &args, gas)
            .await
        {
            Ok(outcome) => {
                SubmissionResult::success(index, outcome.transaction_id, outcome.gas_burnt, attempt)
            }
            Err(err) => {
                warn!(batch_index = index, attempt, %err, "Batch rejected");
                SubmissionResult::failed(index, err.into(), attempt)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::LedgerError,
        ledger::SimulatedLedger,
        partition::partition,
        types::{SubmissionStatus, ValidatedParticipant},
    };

    fn participants(n: usize) -> Vec<ValidatedParticipant> {
        (0..n)
            .map(|i| ValidatedParticipant {
                account: format!("user{i}.testnet").parse().unwrap(),
                amount: 1_000,
            })
            .collect()
    }

    fn submitter(ledger: SimulatedLedger, gas: GasBudget) -> TransactionSubmitter<SimulatedLedger> {
        TransactionSubmitter::new(
            ledger,
            ContractEndpoint::new("airdrop.testnet".parse().unwrap()),
            gas,
        )
    }

    #[tokio::test]
    async fn test_submit_success() {
        let ledger = SimulatedLedger::new();
        let gas = GasBudget { base: 5, per_participant: 2, ceiling: 100 };
        let submitter = submitter(ledger.clone(), gas);
        let input = participants(3);
        let batch = partition(&input, 3).unwrap().next().unwrap();

        let result = submitter.submit(&batch).await;

        assert_eq!(result.status(), SubmissionStatus::Success);
        assert_eq!(result.transaction_id(), Some("sim-1"));
        assert_eq!(result.error(), None);
        assert_eq!(result.attempts(), 1);

        let invocations = ledger.invocations();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].contract_id.as_str(), "airdrop.testnet");
        assert_eq!(invocations[0].method, "airdrop");
        assert_eq!(invocations[0].gas, 11);
        assert_eq!(invocations[0].args["participants"][2]["account"], "user2.testnet");
        assert_eq!(invocations[0].args["participants"][2]["amount"], "1000");
    }

    #[tokio::test]
    async fn test_submit_transient_failure() {
        let ledger = SimulatedLedger::new();
        ledger.push_failure(LedgerError::Timeout);
        let submitter = submitter(ledger, GasBudget::default());
        let input = participants(1);
        let batch = partition(&input, 1).unwrap().next().unwrap();

        let result = submitter.submit(&batch).await;

        assert_eq!(result.status(), SubmissionStatus::Failed);
        assert_eq!(result.transaction_id(), None);
        assert_eq!(result.error(), Some(&ErrorKind::TransientSubmission(LedgerError::Timeout)));
    }

    #[tokio::test]
    async fn test_submit_fatal_failure() {
        let ledger = SimulatedLedger::new();
        ledger.push_failure(LedgerError::Reverted("Contract: caller is not the owner".into()));
        let submitter = submitter(ledger, GasBudget::default());
        let input = participants(1);
        let batch = partition(&input, 1).unwrap().next().unwrap();

        let result = submitter.submit(&batch).await;

        assert!(matches!(
            result.error(),
            Some(ErrorKind::FatalSubmission(LedgerError::Reverted(_)))
        ));
    }

    #[tokio::test]
    async fn test_submit_over_gas_ceiling_is_not_sent() {
        let ledger = SimulatedLedger::new();
        let gas = GasBudget { base: 0, per_participant: 10, ceiling: 25 };
        let submitter = submitter(ledger.clone(), gas);
        let input = participants(3);
        let batch = partition(&input, 3).unwrap().next().unwrap();

        let result = submitter.submit(&batch).await;

        assert_eq!(
            result.error(),
            Some(&ErrorKind::Configuration(ConfigurationError::GasCeilingExceeded {
                size: 3,
                allowance: 30,
                ceiling: 25,
            }))
        );
        assert!(ledger.invocations().is_empty());
    }
}

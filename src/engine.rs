use std::collections::HashSet;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::{
    config::{AVAILABLE_BALANCE_METHOD, ContractEndpoint, DistributionConfig},
    error::{DistributionError, ErrorKind, LedgerError, ValidationError},
    ledger::Ledger,
    partition::partition,
    submitter::TransactionSubmitter,
    types::{
        Batch, BaseUnits, BatchIndex, Gas, ParticipantRecord, RunReport, SubmissionResult,
        ValidatedParticipant, common::serialize_base_units, participant::validate_records,
    },
};

/// Where the runner is in the batch sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Pending(BatchIndex),
    Submitting { index: BatchIndex, attempt: u32 },
    Succeeded(BatchIndex),
    FailedRetryable { index: BatchIndex, attempt: u32 },
    FailedFatal(BatchIndex),
    Done,
}

/// A batch as it would be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedBatch {
    pub index: BatchIndex,
    pub size: usize,
    pub gas: Gas,
    #[serde(serialize_with = "serialize_base_units")]
    pub amount: BaseUnits,
}

/// What a run would do, computed without touching the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionPlan {
    pub participants: usize,
    #[serde(serialize_with = "serialize_base_units")]
    pub total_amount: BaseUnits,
    pub total_gas: Gas,
    pub batches: Vec<PlannedBatch>,
}

/// Drives a distribution: partitions the participants and submits the batches strictly one
/// after another.
///
/// Transient failures are retried with exponential backoff. A fatal failure, or a transient one
/// that outlives its retries, halts the run so that no later batch is paid out. A timeout can
/// hide a transaction that was in fact finalized; retrying it may then pay that batch twice
/// unless the contract ignores repeated payouts. Set `max_retries` to zero where it does not.
///
/// Cancellation is only observed between batches. A batch that has been dispatched is always
/// resolved first.
#[derive(Debug)]
pub struct DistributionRunner<L> {
    submitter: TransactionSubmitter<L>,
    config: DistributionConfig,
    cancel: CancellationToken,
}

/// Validates and converts raw records. Any rejected record aborts the whole distribution.
pub fn prepare<I>(
    records: I,
    config: &DistributionConfig,
) -> Result<Vec<ValidatedParticipant>, DistributionError>
where
    I: IntoIterator<Item = ParticipantRecord>,
{
    config.validate()?;
    validate_records(records, config.decimals).map_err(|errors| {
        for err in &errors {
            warn!(line = err.line, %err, "Rejected input record");
        }
        DistributionError::InvalidRecords(errors)
    })
}

/// Computes the batches, their gas and totals without touching a ledger.
pub fn plan(
    participants: &[ValidatedParticipant],
    config: &DistributionConfig,
) -> Result<DistributionPlan, DistributionError> {
    config.validate()?;

    let batches = partition(participants, config.chunk_size)?
        .map(|batch| -> Result<PlannedBatch, DistributionError> {
            Ok(PlannedBatch {
                index: batch.index(),
                size: batch.size(),
                gas: config.gas.allowance(batch.size())?,
                amount: batch.total_amount().ok_or(ValidationError::TotalOverflow)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let total_amount = batches
        .iter()
        .try_fold(0u128, |acc, b| acc.checked_add(b.amount))
        .ok_or(ValidationError::TotalOverflow)?;
    let total_gas = batches.iter().map(|b| b.gas).fold(0, Gas::saturating_add);

    Ok(DistributionPlan { participants: participants.len(), total_amount, total_gas, batches })
}

impl<L: Ledger> DistributionRunner<L> {
    /// Creates a runner whose submitter attaches gas according to `config.gas`.
    pub fn new(ledger: L, endpoint: ContractEndpoint, config: DistributionConfig) -> Self {
        DistributionRunner {
            submitter: TransactionSubmitter::new(ledger, endpoint, config.gas),
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn submitter(&self) -> &TransactionSubmitter<L> {
        &self.submitter
    }

    pub fn config(&self) -> &DistributionConfig {
        &self.config
    }

    pub fn prepare<I>(&self, records: I) -> Result<Vec<ValidatedParticipant>, DistributionError>
    where
        I: IntoIterator<Item = ParticipantRecord>,
    {
        prepare(records, &self.config)
    }

    pub fn plan(
        &self,
        participants: &[ValidatedParticipant],
    ) -> Result<DistributionPlan, DistributionError> {
        plan(participants, &self.config)
    }

    /// Checks everything that can be checked before the first transaction.
    async fn preflight(&self, plan: &DistributionPlan) -> Result<(), DistributionError> {
        if !self.config.check_balance {
            return Ok(());
        }

        let endpoint = self.submitter.endpoint();
        let response = self
            .submitter
            .ledger()
            .view(&endpoint.contract_id, AVAILABLE_BALANCE_METHOD, b"{}")
            .await?;
        let available = parse_balance(&response)?;

        if plan.total_amount > available {
            return Err(ValidationError::InsufficientBalance {
                required: plan.total_amount,
                available,
            }
            .into());
        }
        info!(
            available = %available,
            required = %plan.total_amount,
            "Contract balance covers the distribution"
        );
        Ok(())
    }

    /// Runs the distribution and reports the outcome of every attempted batch.
    ///
    /// Returns an error only if the run was aborted before anything was submitted.
    #[instrument(skip_all, fields(
        participants = participants.len(),
        chunk_size = self.config.chunk_size,
    ))]
    pub async fn run(
        &self,
        participants: &[ValidatedParticipant],
    ) -> Result<RunReport, DistributionError> {
        let plan = self.plan(participants)?;
        self.preflight(&plan).await?;

        let batches: Vec<Batch> = partition(participants, self.config.chunk_size)?.collect();
        let total_batches = batches.len();
        info!(total_batches, total_gas = plan.total_gas, "Starting distribution");

        let retry = self.config.retry;
        let mut results = Vec::with_capacity(total_batches);
        let mut confirmed = HashSet::new();
        let mut cancelled_at = None;
        let mut state = if batches.is_empty() { RunState::Done } else { RunState::Pending(0) };

        loop {
            state = match state {
                RunState::Pending(index) => {
                    if self.cancel.is_cancelled() {
                        warn!(batch_index = index, "Distribution cancelled");
                        cancelled_at = Some(index);
                        RunState::Done
                    } else if confirmed.contains(&index) {
                        RunState::Succeeded(index)
                    } else {
                        RunState::Submitting { index, attempt: 1 }
                    }
                }
                RunState::Submitting { index, attempt } => {
                    let batch = &batches[index];
                    let result = self.submitter.submit_attempt(batch, attempt).await;

                    match result.error().cloned() {
                        None => {
                            info!(
                                batch_index = index,
                                size = batch.size(),
                                transaction_id = result.transaction_id(),
                                attempt,
                                "Batch confirmed"
                            );
                            confirmed.insert(index);
                            results.push(result);
                            RunState::Succeeded(index)
                        }
                        Some(kind) if kind.is_retryable() && attempt <= retry.max_retries => {
                            RunState::FailedRetryable { index, attempt }
                        }
                        Some(ErrorKind::TransientSubmission(last)) => {
                            results.push(SubmissionResult::failed(
                                index,
                                ErrorKind::RetriesExhausted { attempts: attempt, last },
                                attempt,
                            ));
                            RunState::FailedFatal(index)
                        }
                        Some(_) => {
                            results.push(result);
                            RunState::FailedFatal(index)
                        }
                    }
                }
                RunState::FailedRetryable { index, attempt } => {
                    let delay = retry.delay(attempt);
                    warn!(
                        batch_index = index,
                        attempt,
                        max_retries = retry.max_retries,
                        ?delay,
                        "Transient failure, retrying batch"
                    );
                    tokio::time::sleep(delay).await;
                    RunState::Submitting { index, attempt: attempt + 1 }
                }
                RunState::Succeeded(index) if index + 1 < total_batches => {
                    RunState::Pending(index + 1)
                }
                RunState::Succeeded(_) => RunState::Done,
                RunState::FailedFatal(index) => {
                    error!(
                        batch_index = index,
                        remaining = total_batches - index - 1,
                        "Batch failed, halting distribution"
                    );
                    RunState::Done
                }
                RunState::Done => break,
            };
        }

        let report = RunReport::new(results, total_batches, cancelled_at);
        info!(
            completed = report.completed(),
            succeeded = report.succeeded().count(),
            total_batches,
            gas_burnt = report.gas_burnt(),
            "Distribution finished"
        );
        Ok(report)
    }
}

/// Reads a balance from a raw view response.
///
/// A `u128` balance is returned as a bare JSON number, a `U128` one as a decimal string. Both
/// are decoded straight into [`BaseUnits`]; going through `serde_json::Value` would round
/// numbers above `u64::MAX` to `f64`.
fn parse_balance(response: &[u8]) -> Result<BaseUnits, LedgerError> {
    let malformed = || {
        LedgerError::MalformedResponse(format!(
            "expected a balance, got {}",
            String::from_utf8_lossy(response)
        ))
    };

    match serde_json::from_slice::<String>(response) {
        Ok(text) => text.parse().map_err(|_| malformed()),
        Err(_) => serde_json::from_slice::<BaseUnits>(response).map_err(|_| malformed()),
    }
}

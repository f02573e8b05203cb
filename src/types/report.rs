use serde::Serialize;

use crate::{
    error::ErrorKind,
    types::common::{BatchIndex, Gas},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Success,
    Failed,
}

/// Final outcome of one batch.
///
/// `transaction_id` is set iff the batch succeeded, `error` iff it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionResult {
    batch_index: BatchIndex,
    status: SubmissionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gas_burnt: Option<Gas>,
    /// Number of submissions made for this batch, including the last one.
    attempts: u32,
}

impl SubmissionResult {
    pub fn success(
        batch_index: BatchIndex,
        transaction_id: String,
        gas_burnt: Gas,
        attempts: u32,
    ) -> Self {
        SubmissionResult {
            batch_index,
            status: SubmissionStatus::Success,
            transaction_id: Some(transaction_id),
            error: None,
            gas_burnt: Some(gas_burnt),
            attempts,
        }
    }

    pub fn failed(batch_index: BatchIndex, error: ErrorKind, attempts: u32) -> Self {
        SubmissionResult {
            batch_index,
            status: SubmissionStatus::Failed,
            transaction_id: None,
            error: Some(error),
            gas_burnt: None,
            attempts,
        }
    }

    pub fn batch_index(&self) -> BatchIndex {
        self.batch_index
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == SubmissionStatus::Success
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn error(&self) -> Option<&ErrorKind> {
        self.error.as_ref()
    }

    pub fn gas_burnt(&self) -> Option<Gas> {
        self.gas_burnt
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Outcome of a whole distribution run. This, not the logs, is the record of what was paid out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    results: Vec<SubmissionResult>,
    total_batches: usize,
    completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_failure_index: Option<BatchIndex>,
    /// First batch that was not dispatched because the run was cancelled.
    #[serde(skip_serializing_if = "Option::is_none")]
    cancelled_at: Option<BatchIndex>,
}

impl RunReport {
    pub(crate) fn new(
        results: Vec<SubmissionResult>,
        total_batches: usize,
        cancelled_at: Option<BatchIndex>,
    ) -> Self {
        let first_failure_index = results.iter().find(|r| !r.is_success()).map(|r| r.batch_index);
        let completed = results.len() == total_batches && first_failure_index.is_none();

        RunReport { results, total_batches, completed, first_failure_index, cancelled_at }
    }

    /// One entry per attempted batch, in batch order.
    pub fn results(&self) -> &[SubmissionResult] {
        &self.results
    }

    pub fn total_batches(&self) -> usize {
        self.total_batches
    }

    /// Whether every batch of the run was confirmed.
    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn first_failure_index(&self) -> Option<BatchIndex> {
        self.first_failure_index
    }

    pub fn cancelled_at(&self) -> Option<BatchIndex> {
        self.cancelled_at
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &SubmissionResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    /// Total gas burnt by the confirmed batches.
    pub fn gas_burnt(&self) -> Gas {
        self.results.iter().filter_map(|r| r.gas_burnt).fold(0, Gas::saturating_add)
    }
}

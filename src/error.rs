use serde::{Serialize, Serializer};

use crate::types::common::{BaseUnits, Gas};

/// Errors produced while turning a raw decimal amount into base units.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// The amount column was empty.
    #[error("amount is empty")]
    Empty,
    /// The amount carried a minus sign.
    #[error("amount `{0}` is negative")]
    Negative(String),
    /// The amount contained something other than digits and a single decimal point.
    #[error("amount `{0}` is not a decimal number")]
    Malformed(String),
    /// The amount has more fractional digits than the token supports.
    ///
    /// Truncating would silently change what the recipient receives, so this is rejected.
    #[error("amount `{amount}` has {found} fractional digits, the token supports {max}")]
    TooPrecise {
        /// The offending amount.
        amount: String,
        /// Number of fractional digits found.
        found: usize,
        /// Token precision.
        max: u32,
    },
    /// The amount does not fit into a ledger balance.
    #[error("amount `{0}` exceeds the largest representable balance")]
    Overflow(String),
}

/// Errors for input that is well-formed but not acceptable to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The account id violates the ledger's account naming rules.
    #[error("account id `{account}` is invalid: {reason}")]
    InvalidAccountId {
        /// The rejected account id.
        account: String,
        /// Which rule was violated.
        reason: &'static str,
    },
    /// The sum of all amounts does not fit into a ledger balance.
    #[error("distribution total overflows a ledger balance")]
    TotalOverflow,
    /// The contract cannot cover the distribution.
    #[error("distribution requires {required} base units but the contract has {available}")]
    InsufficientBalance {
        /// Sum of all participant amounts.
        required: BaseUnits,
        /// Balance reported by the contract.
        available: BaseUnits,
    },
}

/// Invalid run configuration. Always detected before anything is submitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("chunk size must be a positive integer")]
    ZeroChunkSize,
    #[error("gas allowance {allowance} for a batch of {size} exceeds the ceiling {ceiling}")]
    GasCeilingExceeded { size: usize, allowance: Gas, ceiling: Gas },
    #[error("gas allowance for a batch of {size} overflows")]
    GasOverflow { size: usize },
    #[error("backoff multiplier must be at least 1")]
    InvalidBackoffMultiplier,
    #[error("token precision {0} is larger than a ledger balance can hold")]
    DecimalsTooLarge(u32),
}

/// Failures reported by the ledger session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("request timed out before the transaction was finalized")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("transaction ran out of gas")]
    InsufficientGas,
    #[error("signer balance is too low to cover the transaction")]
    InsufficientBalance,
    #[error("contract reverted: {0}")]
    Reverted(String),
    #[error("signer is not authorized to call the contract")]
    Unauthorized,
    #[error("malformed ledger response: {0}")]
    MalformedResponse(String),
}

impl LedgerError {
    /// Whether re-sending the same call may succeed.
    ///
    /// A timeout may hide a transaction that was in fact finalized, see the notes on
    /// [`crate::engine::DistributionRunner`].
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Transport(_))
    }
}

/// Why a batch ended up [`Failed`](crate::types::report::SubmissionStatus::Failed).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// Retryable failure, e.g. a timeout or a dropped connection.
    #[error("transient submission error: {0}")]
    TransientSubmission(LedgerError),
    /// The ledger rejected the call and retrying will not help.
    #[error("fatal submission error: {0}")]
    FatalSubmission(LedgerError),
    /// The batch cannot be submitted with the current configuration.
    #[error("configuration error: {0}")]
    Configuration(ConfigurationError),
    /// The call arguments could not be encoded.
    #[error("failed to encode call arguments: {0}")]
    Payload(String),
    /// A transient failure persisted through every allowed attempt.
    #[error("gave up after {attempts} attempts, last error: {last}")]
    RetriesExhausted { attempts: u32, last: LedgerError },
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientSubmission(_))
    }
}

impl From<LedgerError> for ErrorKind {
    fn from(err: LedgerError) -> Self {
        if err.is_transient() { Self::TransientSubmission(err) } else { Self::FatalSubmission(err) }
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A rejected input row.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {kind}")]
pub struct RecordError {
    /// 1-based line in the source file.
    pub line: u64,
    pub kind: RecordErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordErrorKind {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Errors that abort a distribution before or instead of producing a report.
#[derive(Debug, thiserror::Error)]
pub enum DistributionError {
    /// One or more input rows were rejected. Nothing was submitted.
    #[error("{} input record(s) rejected", .0.len())]
    InvalidRecords(Vec<RecordError>),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A preflight query against the ledger failed.
    #[error("preflight query failed: {0}")]
    Ledger(#[from] LedgerError),
}

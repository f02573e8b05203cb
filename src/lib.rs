//! # Airdrop batcher
//!
//! Distributes tokens to a list of accounts by calling a contract's batch entry point, a
//! bounded number of participants per transaction.
//!
//! Records are read from CSV ([`ingest`]), converted to base units ([`amount`]), split into
//! batches ([`partition`]) and submitted one transaction at a time ([`submitter`]) by the
//! [`engine::DistributionRunner`], which retries transient failures and halts on fatal ones.
//! The signed ledger session is provided by the caller through the [`ledger::Ledger`] trait.

pub mod amount;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod ledger;
pub mod partition;
pub mod submitter;
pub mod types;

pub use config::{ContractEndpoint, DistributionConfig, GasBudget, Network, RetryPolicy};
pub use engine::{DistributionPlan, DistributionRunner};
pub use error::{DistributionError, ErrorKind, LedgerError};
pub use ledger::{FinalizedOutcome, Ledger, SimulatedLedger};
pub use submitter::TransactionSubmitter;

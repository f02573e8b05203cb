//! The ledger session consumed by the submitter.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::LedgerError,
    types::{AccountId, BaseUnits, Gas},
};

/// A finalized, successful function call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedOutcome {
    pub transaction_id: String,
    pub gas_burnt: Gas,
}

/// A connected, authenticated session bound to one network and one signing account.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Signs and sends a state-changing call to `method` on `contract_id` and waits until the
    /// transaction is finalized or rejected.
    async fn invoke(
        &self,
        contract_id: &AccountId,
        method: &str,
        args: &[u8],
        gas: Gas,
    ) -> Result<FinalizedOutcome, LedgerError>;

    /// Calls a read-only contract method and returns the raw JSON result.
    ///
    /// The bytes are handed back untouched so that callers can decode integers wider than 64
    /// bits exactly.
    async fn view(
        &self,
        contract_id: &AccountId,
        method: &str,
        args: &[u8],
    ) -> Result<Vec<u8>, LedgerError>;
}

/// A call received by the [`SimulatedLedger`].
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub contract_id: AccountId,
    pub method: String,
    pub args: Value,
    pub gas: Gas,
}

#[derive(Debug, Default)]
struct SimulatedState {
    invocations: Vec<Invocation>,
    failures: VecDeque<Option<LedgerError>>,
    available_balance: Option<BaseUnits>,
}

/// In-process ledger used for dry runs and tests.
///
/// Every call is recorded. Calls succeed with a deterministic transaction id unless a failure
/// was queued with [`SimulatedLedger::push_failure`]. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct SimulatedLedger {
    state: Arc<Mutex<SimulatedState>>,
}

impl SimulatedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance returned by the contract's available balance view.
    pub fn with_available_balance(self, balance: BaseUnits) -> Self {
        self.state().available_balance = Some(balance);
        self
    }

    /// Makes the next not yet scripted call fail with `error`.
    pub fn push_failure(&self, error: LedgerError) {
        self.state().failures.push_back(Some(error));
    }

    /// Lets the next not yet scripted call succeed.
    pub fn push_success(&self) {
        self.state().failures.push_back(None);
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.state().invocations.clone()
    }

    fn state(&self) -> MutexGuard<'_, SimulatedState> {
        // The state stays consistent even if a holder panicked.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Ledger for SimulatedLedger {
    async fn invoke(
        &self,
        contract_id: &AccountId,
        method: &str,
        args: &[u8],
        gas: Gas,
    ) -> Result<FinalizedOutcome, LedgerError> {
        let args: Value = serde_json::from_slice(args)
            .map_err(|err| LedgerError::Reverted(format!("cannot deserialize arguments: {err}")))?;

        let mut state = self.state();
        state.invocations.push(Invocation {
            contract_id: contract_id.clone(),
            method: method.to_owned(),
            args,
            gas,
        });

        if let Some(Some(err)) = state.failures.pop_front() {
            return Err(err);
        }

        Ok(FinalizedOutcome {
            transaction_id: format!("sim-{}", state.invocations.len()),
            gas_burnt: gas,
        })
    }

    async fn view(
        &self,
        _contract_id: &AccountId,
        method: &str,
        _args: &[u8],
    ) -> Result<Vec<u8>, LedgerError> {
        // A `u128` balance comes back as a bare JSON number.
        match self.state().available_balance {
            Some(balance) => Ok(balance.to_string().into_bytes()),
            None => Err(LedgerError::Reverted(format!("method `{method}` not found"))),
        }
    }
}

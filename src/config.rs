//! Run configuration and defaults.

use std::time::Duration;

use serde::Serialize;

use crate::{
    amount::{MAX_DECIMALS, NEAR_DECIMALS},
    error::ConfigurationError,
    types::{AccountId, Gas},
};

/// 1 TGas.
pub const TGAS: Gas = 1_000_000_000_000;

/// Participants per transaction.
pub const DEFAULT_CHUNK_SIZE: usize = 300;
/// Protocol limit on gas attached to a single function call.
pub const DEFAULT_GAS_CEILING: Gas = 300 * TGAS;
/// Gas for the call itself, independent of the number of participants.
pub const DEFAULT_GAS_BASE: Gas = 10 * TGAS;
/// Gas for one transfer inside the batch call.
pub const DEFAULT_GAS_PER_PARTICIPANT: Gas = 900_000_000_000;
/// Name of the contract's batch distribution entry point.
pub const DEFAULT_METHOD: &str = "airdrop";
/// Contract view method returning the balance available for distribution.
pub const AVAILABLE_BALANCE_METHOD: &str = "available_withdraw";

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_RETRY_MULTIPLIER: u32 = 2;
pub const DEFAULT_RETRY_MAX_DELAY: Duration = Duration::from_secs(30);

/// Network the distributing account lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Localnet,
}

impl Network {
    pub fn rpc_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://rpc.mainnet.near.org",
            Network::Testnet => "https://rpc.testnet.near.org",
            Network::Localnet => "http://localhost:3030",
        }
    }
}

/// Target of the batch calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractEndpoint {
    pub contract_id: AccountId,
    pub method: String,
}

impl ContractEndpoint {
    pub fn new(contract_id: AccountId) -> Self {
        ContractEndpoint { contract_id, method: DEFAULT_METHOD.to_owned() }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }
}

/// How much gas to attach to a batch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GasBudget {
    pub base: Gas,
    pub per_participant: Gas,
    pub ceiling: Gas,
}

impl Default for GasBudget {
    fn default() -> Self {
        GasBudget {
            base: DEFAULT_GAS_BASE,
            per_participant: DEFAULT_GAS_PER_PARTICIPANT,
            ceiling: DEFAULT_GAS_CEILING,
        }
    }
}

impl GasBudget {
    /// Gas to attach for a batch of `size` participants.
    ///
    /// Fails if the allowance would exceed the ceiling, in which case the chunk size has to
    /// be lowered.
    pub fn allowance(&self, size: usize) -> Result<Gas, ConfigurationError> {
        let allowance = Gas::try_from(size)
            .ok()
            .and_then(|size| self.per_participant.checked_mul(size))
            .and_then(|gas| gas.checked_add(self.base))
            .ok_or(ConfigurationError::GasOverflow { size })?;

        if allowance > self.ceiling {
            return Err(ConfigurationError::GasCeilingExceeded {
                size,
                allowance,
                ceiling: self.ceiling,
            });
        }
        Ok(allowance)
    }
}

/// Exponential backoff between attempts of the same batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one. Zero disables retries.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub multiplier: u32,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_RETRY_BASE_DELAY,
            multiplier: DEFAULT_RETRY_MULTIPLIER,
            max_delay: DEFAULT_RETRY_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): `base_delay * multiplier^(retry - 1)`,
    /// capped at `max_delay`.
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = self.multiplier.checked_pow(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Everything the runner needs besides the ledger session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionConfig {
    pub chunk_size: usize,
    /// Token precision used to convert input amounts.
    pub decimals: u32,
    pub gas: GasBudget,
    pub retry: RetryPolicy,
    /// Query the contract's available balance before submitting anything.
    pub check_balance: bool,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        DistributionConfig {
            chunk_size: DEFAULT_CHUNK_SIZE,
            decimals: NEAR_DECIMALS,
            gas: GasBudget::default(),
            retry: RetryPolicy::default(),
            check_balance: false,
        }
    }
}

impl DistributionConfig {
    /// Checks the configuration on its own, independent of any input.
    ///
    /// A full batch must fit within the gas ceiling.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.chunk_size == 0 {
            return Err(ConfigurationError::ZeroChunkSize);
        }
        if self.decimals > MAX_DECIMALS {
            return Err(ConfigurationError::DecimalsTooLarge(self.decimals));
        }
        if self.retry.multiplier == 0 {
            return Err(ConfigurationError::InvalidBackoffMultiplier);
        }
        self.gas.allowance(self.chunk_size)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(DistributionConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_gas_allowance_scales_with_size() {
        let gas = GasBudget { base: 10, per_participant: 3, ceiling: 100 };
        assert_eq!(gas.allowance(1), Ok(13));
        assert_eq!(gas.allowance(30), Ok(100));
        assert_eq!(
            gas.allowance(31),
            Err(ConfigurationError::GasCeilingExceeded { size: 31, allowance: 103, ceiling: 100 })
        );
    }

    #[test]
    fn test_gas_allowance_overflow() {
        let gas = GasBudget { base: 1, per_participant: Gas::MAX, ceiling: Gas::MAX };
        assert_eq!(gas.allowance(2), Err(ConfigurationError::GasOverflow { size: 2 }));
    }

    #[test]
    fn test_default_full_batch_fits_ceiling() {
        let gas = GasBudget::default();
        assert_eq!(gas.allowance(DEFAULT_CHUNK_SIZE), Ok(280 * TGAS));
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let config = DistributionConfig { chunk_size: 0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigurationError::ZeroChunkSize));
    }

    #[test]
    fn test_validate_rejects_chunk_size_over_gas_ceiling() {
        let config = DistributionConfig { chunk_size: 400, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::GasCeilingExceeded { size: 400, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_retry_and_precision() {
        let mut config = DistributionConfig::default();
        config.retry.multiplier = 0;
        assert_eq!(config.validate(), Err(ConfigurationError::InvalidBackoffMultiplier));

        let config = DistributionConfig { decimals: 39, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigurationError::DecimalsTooLarge(39)));
    }

    #[test]
    fn test_retry_delay_is_exponential_and_capped() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay: Duration::from_millis(100),
            multiplier: 3,
            max_delay: Duration::from_secs(2),
        };
        assert_eq!(policy.delay(1), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(300));
        assert_eq!(policy.delay(3), Duration::from_millis(900));
        assert_eq!(policy.delay(4), Duration::from_secs(2));
        assert_eq!(policy.delay(60), Duration::from_secs(2));
    }

    #[test]
    fn test_network_rpc_url() {
        assert_eq!(Network::Testnet.rpc_url(), "https://rpc.testnet.near.org");
        assert_eq!(Network::Localnet.rpc_url(), "http://localhost:3030");
    }
}

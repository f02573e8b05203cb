use serde::{Deserialize, Serializer};

/// An amount in the token's smallest denomination.
pub type BaseUnits = u128;
/// Ledger gas units.
pub type Gas = u64;
pub type BatchIndex = usize;

/// One row of the participants file, mapped by position.
#[derive(Debug, Deserialize)]
pub struct CsvRow {
    pub account: String,
    pub amount: String,
}

/// Serializes a balance as a decimal string, the encoding the contract expects for `U128`.
pub fn serialize_base_units<S: Serializer>(
    amount: &BaseUnits,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(amount)
}

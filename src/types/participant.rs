use serde::Serialize;

use crate::{
    amount,
    error::{RecordError, RecordErrorKind},
    types::{
        account::AccountId,
        common::{BaseUnits, CsvRow, serialize_base_units},
    },
};

/// One input row as read from the source, before any validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRecord {
    /// 1-based line in the source file.
    pub line: u64,
    pub account_id: String,
    pub amount_raw: String,
}

impl ParticipantRecord {
    pub fn new(line: u64, account_id: impl Into<String>, amount_raw: impl Into<String>) -> Self {
        ParticipantRecord { line, account_id: account_id.into(), amount_raw: amount_raw.into() }
    }

    pub fn from_csv_row(line: u64, row: CsvRow) -> Self {
        ParticipantRecord { line, account_id: row.account, amount_raw: row.amount }
    }

    /// Checks the account id and converts the amount to base units.
    pub fn validate(&self, decimals: u32) -> Result<ValidatedParticipant, RecordError> {
        let to_record_error = |kind: RecordErrorKind| RecordError { line: self.line, kind };

        let account = self
            .account_id
            .parse::<AccountId>()
            .map_err(|err| to_record_error(err.into()))?;
        let amount = amount::convert(&self.amount_raw, decimals)
            .map_err(|err| to_record_error(err.into()))?;

        Ok(ValidatedParticipant { account, amount })
    }
}

/// A recipient that passed validation. Serializes to the shape the contract's
/// `airdrop(participants)` entry point takes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedParticipant {
    pub account: AccountId,
    #[serde(serialize_with = "serialize_base_units")]
    pub amount: BaseUnits,
}

/// Validates every record, collecting all rejections rather than stopping at the first one.
pub fn validate_records<I>(
    records: I,
    decimals: u32,
) -> Result<Vec<ValidatedParticipant>, Vec<RecordError>>
where
    I: IntoIterator<Item = ParticipantRecord>,
{
    let mut validated = Vec::new();
    let mut errors = Vec::new();

    for record in records {
        match record.validate(decimals) {
            Ok(participant) => validated.push(participant),
            Err(err) => errors.push(err),
        }
    }

    if errors.is_empty() { Ok(validated) } else { Err(errors) }
}

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const MIN_ACCOUNT_ID_LEN: usize = 2;
pub const MAX_ACCOUNT_ID_LEN: usize = 64;

/// A ledger account id, e.g. `alice.testnet`.
///
/// Only lowercase ASCII letters, digits and the separators `-`, `_`, `.` are allowed. An id
/// neither starts nor ends with a separator and never contains two separators in a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct AccountId(String);

impl AccountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> Result<(), &'static str> {
        if id.len() < MIN_ACCOUNT_ID_LEN {
            return Err("too short");
        }
        if id.len() > MAX_ACCOUNT_ID_LEN {
            return Err("too long");
        }

        let mut last_was_separator = true;
        for c in id.chars() {
            match c {
                'a'..='z' | '0'..='9' => last_was_separator = false,
                '-' | '_' | '.' => {
                    if last_was_separator {
                        return Err("separator at the start or next to another separator");
                    }
                    last_was_separator = true;
                }
                _ => return Err("contains a character other than a-z, 0-9, `-`, `_` or `.`"),
            }
        }

        if last_was_separator {
            return Err("ends with a separator");
        }
        Ok(())
    }
}

impl TryFrom<String> for AccountId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match Self::validate(&value) {
            Ok(()) => Ok(AccountId(value)),
            Err(reason) => Err(ValidationError::InvalidAccountId { account: value, reason }),
        }
    }
}

impl FromStr for AccountId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Sender used for mining reward transactions
pub const REWARD_SENDER: &str = "0";

/// Errors that can occur during transaction operations
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// A transferred amount, keeping the form it was given in
///
/// `5` and `5.0` are different amounts to the hasher: integers encode
/// without a fractional part, decimals always with one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Integer(i64),
    Decimal(f64),
}

impl Amount {
    /// Checks that the amount has a JSON representation
    pub fn is_finite(&self) -> bool {
        match self {
            Amount::Integer(_) => true,
            Amount::Decimal(value) => value.is_finite(),
        }
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Amount::Integer(value)
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount::Decimal(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Integer(value) => write!(f, "{}", value),
            Amount::Decimal(value) => write!(f, "{}", value),
        }
    }
}

/// Represents a transaction waiting in the pool or sealed in a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    /// Sender's address
    pub sender: String,

    /// Recipient's address
    pub recipient: String,

    /// Amount being transferred
    #[schema(value_type = f64, example = 5)]
    pub amount: Amount,
}

impl Transaction {
    /// Creates a new transaction
    ///
    /// # Arguments
    ///
    /// * `sender` - The address of the sender
    /// * `recipient` - The address of the recipient
    /// * `amount` - The amount to transfer
    ///
    /// # Returns
    ///
    /// A new Transaction, or an error if the amount has no JSON representation
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: impl Into<Amount>,
    ) -> Result<Self, TransactionError> {
        let amount = amount.into();
        if !amount.is_finite() {
            return Err(TransactionError::InvalidAmount(format!(
                "amount must be a finite number, got {}",
                amount
            )));
        }

        Ok(Transaction {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        })
    }
}

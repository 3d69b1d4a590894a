use chrono::Utc;
use log::{debug, info};
use thiserror::Error;

use super::block::Block;
use super::pow::valid_proof;
use super::transaction::{Amount, Transaction, TransactionError};

/// Errors that can occur during ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Chain is empty: {0}")]
    EmptyChain(&'static str),

    #[error("Transaction error: {0}")]
    TransactionError(#[from] TransactionError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid chain: {0}")]
    InvalidChain(String),
}

/// The chain of sealed blocks plus the pool of pending transactions
///
/// The ledger starts empty. The first block must be sealed with an explicit
/// previous hash; every later block defaults to the hash of its predecessor.
#[derive(Debug, Default)]
pub struct Ledger {
    /// The chain of blocks
    chain: Vec<Block>,

    /// Pending transactions to be included in the next block
    current_transactions: Vec<Transaction>,
}

impl Ledger {
    /// Creates an empty ledger
    pub fn new() -> Self {
        Ledger::default()
    }

    /// Adds a new transaction to the pool
    ///
    /// # Arguments
    ///
    /// * `sender` - The address of the sender
    /// * `recipient` - The address of the recipient
    /// * `amount` - The amount to transfer
    ///
    /// # Returns
    ///
    /// Result with the index of the block that will include this transaction
    pub fn new_transaction(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: impl Into<Amount>,
    ) -> Result<u64, LedgerError> {
        let next_index = self
            .chain
            .last()
            .map(|block| block.index + 1)
            .ok_or(LedgerError::EmptyChain("no block to append transactions after"))?;

        let transaction = Transaction::new(sender, recipient, amount)?;
        debug!(
            "Pooled transaction {} -> {} ({}) for block {}",
            transaction.sender, transaction.recipient, transaction.amount, next_index
        );
        self.current_transactions.push(transaction);

        Ok(next_index)
    }

    /// Seals the pool into a new block and appends it to the chain
    ///
    /// # Arguments
    ///
    /// * `proof` - The proof of work for the new block
    /// * `previous_hash` - Hash of the previous block; defaults to the hash of
    ///   the last block, which requires a non-empty chain
    ///
    /// # Returns
    ///
    /// Result with the newly appended block
    pub fn new_block(&mut self, proof: u64, previous_hash: Option<String>) -> Result<Block, LedgerError> {
        let previous_hash = match previous_hash {
            Some(hash) => hash,
            None => Ledger::hash(self.last_block()?)?,
        };

        // Wall clocks can step backwards; never seal a block older than its predecessor.
        let now = Utc::now();
        let timestamp = match self.chain.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };

        let block = Block::new(
            self.chain.len() as u64 + 1,
            timestamp,
            std::mem::take(&mut self.current_transactions),
            proof,
            previous_hash,
        );
        self.chain.push(block.clone());

        info!(
            "Sealed block {} with {} transactions (proof {})",
            block.index,
            block.transactions.len(),
            block.proof
        );

        Ok(block)
    }

    /// Gets the last block in the chain
    pub fn last_block(&self) -> Result<&Block, LedgerError> {
        self.chain
            .last()
            .ok_or(LedgerError::EmptyChain("no block has been sealed yet"))
    }

    /// Hashes a block
    ///
    /// # Returns
    ///
    /// The SHA-256 hash of the block as a hexadecimal string
    pub fn hash(block: &Block) -> Result<String, LedgerError> {
        Ok(block.calculate_hash()?)
    }

    /// Gets the sealed blocks, oldest first
    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    /// Number of sealed blocks
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Checks if no block has been sealed yet
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Gets the transactions waiting for the next block
    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.current_transactions
    }

    /// Validates the blockchain
    ///
    /// # Returns
    ///
    /// true if the blockchain is valid, false otherwise
    pub fn is_valid(&self) -> bool {
        validate_chain(&self.chain).is_ok()
    }
}

/// Validates a sequence of blocks
///
/// Checks gapless indices starting at 1, non-decreasing timestamps, the
/// previous-hash link and the proof of work between consecutive blocks. The
/// first block is accepted as given.
pub fn validate_chain(chain: &[Block]) -> Result<(), LedgerError> {
    for (position, block) in chain.iter().enumerate() {
        let expected = position as u64 + 1;
        if block.index != expected {
            return Err(LedgerError::InvalidChain(format!(
                "block at position {} has index {}, expected {}",
                position, block.index, expected
            )));
        }
    }

    for pair in chain.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);

        if current.timestamp < previous.timestamp {
            return Err(LedgerError::InvalidChain(format!(
                "block {} is older than its predecessor",
                current.index
            )));
        }

        if current.previous_hash != Ledger::hash(previous)? {
            return Err(LedgerError::InvalidChain(format!(
                "block {} does not link to the hash of block {}",
                current.index, previous.index
            )));
        }

        if !valid_proof(previous.proof, current.proof) {
            return Err(LedgerError::InvalidChain(format!(
                "block {} has an invalid proof {}",
                current.index, current.proof
            )));
        }
    }

    Ok(())
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{info, warn};
use thiserror::Error;

use super::block::Block;
use super::ledger::{LedgerError, Ledger};
use super::pow;
use super::transaction::{Amount, Transaction, REWARD_SENDER};

/// Errors that can occur during node operations
#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    LedgerError(#[from] LedgerError),

    #[error("Invalid proof {proof} for last proof {last_proof}")]
    InvalidProof { last_proof: u64, proof: u64 },

    #[error("Previous hash {got} does not match the last block's hash {expected}")]
    PreviousHashMismatch { expected: String, got: String },

    #[error("Proof search timed out after {0:?}")]
    MiningTimeout(Duration),

    #[error("Proof search was cancelled")]
    MiningCancelled,

    #[error("System error: {0}")]
    SystemError(String),
}

/// A ledger node: one ledger behind one lock, plus the mining policy
///
/// Every read or write of the chain and pool goes through the same lock, so
/// pooling a transaction and sealing a block never interleave. Proof search
/// runs on a blocking worker without holding the lock.
#[derive(Debug)]
pub struct Node {
    /// The ledger, guarded as one unit
    ledger: Mutex<Ledger>,

    /// Identifier of this node, credited with mining rewards
    identifier: String,

    /// Amount paid to this node for each mined block
    mining_reward: Amount,

    /// Upper bound on a single proof search
    mining_timeout: Duration,
}

impl Node {
    /// Creates a node around an empty ledger
    ///
    /// # Arguments
    ///
    /// * `identifier` - The node identifier (mining reward recipient)
    /// * `mining_reward` - The amount paid for each mined block
    /// * `mining_timeout` - Maximum time a proof search may run
    pub fn new(
        identifier: impl Into<String>,
        mining_reward: impl Into<Amount>,
        mining_timeout: Duration,
    ) -> Self {
        Node {
            ledger: Mutex::new(Ledger::new()),
            identifier: identifier.into(),
            mining_reward: mining_reward.into(),
            mining_timeout,
        }
    }

    /// Gets the node identifier
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ledger>, NodeError> {
        self.ledger
            .lock()
            .map_err(|_| NodeError::SystemError("ledger lock poisoned".to_string()))
    }

    /// Seeds the first block if the chain is still empty
    ///
    /// # Returns
    ///
    /// The first block of the chain, sealed now or earlier
    pub fn seed_genesis(&self, proof: u64, previous_hash: &str) -> Result<Block, NodeError> {
        let mut ledger = self.lock()?;

        if let Some(first) = ledger.chain().first() {
            return Ok(first.clone());
        }

        let block = ledger.new_block(proof, Some(previous_hash.to_string()))?;
        info!("Seeded genesis block with proof {}", block.proof);

        Ok(block)
    }

    /// Adds a transaction to the pool
    ///
    /// # Returns
    ///
    /// The index of the block that will include the transaction
    pub fn submit_transaction(
        &self,
        sender: &str,
        recipient: &str,
        amount: impl Into<Amount>,
    ) -> Result<u64, NodeError> {
        Ok(self.lock()?.new_transaction(sender, recipient, amount)?)
    }

    /// Seals the pool into a new block without checking the proof
    pub fn seal_block(&self, proof: u64, previous_hash: Option<String>) -> Result<Block, NodeError> {
        Ok(self.lock()?.new_block(proof, previous_hash)?)
    }

    /// Seals the pool into a new block after checking, under the same lock,
    /// the proof against the last block's proof and any given previous hash
    /// against the last block's hash
    pub fn submit_block(&self, proof: u64, previous_hash: Option<String>) -> Result<Block, NodeError> {
        let mut ledger = self.lock()?;

        if let Some(last) = ledger.chain().last() {
            if !pow::valid_proof(last.proof, proof) {
                return Err(NodeError::InvalidProof {
                    last_proof: last.proof,
                    proof,
                });
            }

            if let Some(given) = &previous_hash {
                let expected = Ledger::hash(last)?;
                if *given != expected {
                    return Err(NodeError::PreviousHashMismatch {
                        expected,
                        got: given.clone(),
                    });
                }
            }
        }

        Ok(ledger.new_block(proof, previous_hash)?)
    }

    /// Searches for a proof on a blocking worker
    ///
    /// The search stops when it finds a proof, when the mining timeout
    /// elapses, or when the returned future is dropped.
    pub async fn search_proof(&self, last_proof: u64) -> Result<u64, NodeError> {
        let cancel = CancelOnDrop::new();
        let flag = cancel.flag();

        let search = tokio::task::spawn_blocking(move || pow::proof_of_work_cancellable(last_proof, &flag));

        match tokio::time::timeout(self.mining_timeout, search).await {
            Ok(Ok(Some(proof))) => Ok(proof),
            Ok(Ok(None)) => Err(NodeError::MiningCancelled),
            Ok(Err(err)) => Err(NodeError::SystemError(format!("proof search failed: {}", err))),
            Err(_) => {
                warn!("Proof search against {} timed out", last_proof);
                Err(NodeError::MiningTimeout(self.mining_timeout))
            }
        }
    }

    /// Checks a proof against a previous proof
    pub fn check_proof(last_proof: u64, proof: u64) -> bool {
        pow::valid_proof(last_proof, proof)
    }

    /// Mines a new block
    ///
    /// Finds a proof against the last block, then pays this node the mining
    /// reward and seals the pool. If another block was sealed while the
    /// search ran, the search starts over against the new last block.
    pub async fn mine(&self) -> Result<Block, NodeError> {
        loop {
            let (height, last_proof) = {
                let ledger = self.lock()?;
                (ledger.len(), ledger.last_block()?.proof)
            };

            let proof = self.search_proof(last_proof).await?;

            let mut ledger = self.lock()?;
            if ledger.len() != height {
                warn!(
                    "Chain advanced to {} blocks while mining on block {}, searching again",
                    ledger.len(),
                    height
                );
                continue;
            }

            ledger.new_transaction(REWARD_SENDER, self.identifier.as_str(), self.mining_reward)?;

            return Ok(ledger.new_block(proof, None)?);
        }
    }

    /// Gets a snapshot of the chain
    pub fn get_chain(&self) -> Result<Vec<Block>, NodeError> {
        Ok(self.lock()?.chain().to_vec())
    }

    /// Number of sealed blocks
    pub fn chain_length(&self) -> Result<usize, NodeError> {
        Ok(self.lock()?.len())
    }

    /// Gets a snapshot of the pending transactions
    pub fn get_pending_transactions(&self) -> Result<Vec<Transaction>, NodeError> {
        Ok(self.lock()?.pending_transactions().to_vec())
    }

    /// Validates the chain
    pub fn is_valid(&self) -> Result<bool, NodeError> {
        Ok(self.lock()?.is_valid())
    }
}

/// Cancellation flag that is raised when the owner goes away
struct CancelOnDrop(Arc<AtomicBool>);

impl CancelOnDrop {
    fn new() -> Self {
        CancelOnDrop(Arc::new(AtomicBool::new(false)))
    }

    fn flag(&self) -> Arc<AtomicBool> {
        self.0.clone()
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

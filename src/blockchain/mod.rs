// Blockchain module
//
// This module contains the ledger implementation:
// - Canonical hashing
// - Proof of work search and validation
// - Block and transaction records
// - The ledger (chain plus transaction pool)
// - The node that guards the ledger and drives mining

pub mod block;
pub mod hasher;
pub mod ledger;
pub mod node;
pub mod pow;
pub mod transaction;

pub use block::Block;
pub use ledger::{validate_chain, Ledger, LedgerError};
pub use node::{Node, NodeError};
pub use transaction::{Amount, Transaction};

//! A minimal append-only ledger secured by proof of work.
//!
//! The ledger lives in memory only. [`blockchain`] holds the core (hashing,
//! proof of work, the ledger and the node that guards it), [`api`] the HTTP
//! adapter and [`config`] the node settings.

pub mod api;
pub mod blockchain;
pub mod config;

//! Test infrastructure for the document lifecycle.
//!
//! Every test builds its own in-memory ledger through [`TestLedger::new`],
//! which registers two tenants and wires the four document services to a
//! subscriber registry.

#![allow(dead_code)]

pub mod fixtures;
pub mod subscribers;

// Re-export commonly used items
pub use fixtures::*;
pub use subscribers::*;

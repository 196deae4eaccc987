pub mod ledger_models;

pub use ledger_models::{FileColumn, LedgerSlot};

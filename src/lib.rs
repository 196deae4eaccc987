pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod ledger;
pub mod maintenance;
pub mod messaging;
pub mod services;
pub mod storage;

pub use error::Error;

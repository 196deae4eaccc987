pub mod admin;
pub mod relay;

pub use relay::{InboundPayload, Relay};

// Domain layer - Value types and pure functions
pub mod channel;
pub mod error;
pub mod snapshot;
pub mod tier;
pub mod window;

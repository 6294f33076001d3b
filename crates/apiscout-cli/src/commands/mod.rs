//! Command implementations for the apiscout CLI

mod discover;
mod extract;
mod partition;

pub use discover::execute as discover;
pub use extract::execute as extract;
pub use partition::execute as partition;

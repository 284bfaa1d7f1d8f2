//! Send history implementations.

mod memory;

pub use memory::InMemorySendHistory;

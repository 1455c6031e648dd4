pub mod memory;

pub use memory::{InMemoryStore, Record};

//! Turn memory store implementations for mindloop.

pub mod file_store;
pub mod in_memory;
pub mod observable;

pub use file_store::FileTurnStore;
pub use in_memory::InMemoryTurnStore;
pub use observable::ObservableTurnStore;

//! Session store and its storage backends.

pub mod file;
pub mod memory;
pub mod store;
pub mod traits;

pub use file::{FileBackend, LocalDir};
pub use memory::{MemoryBackend, MemorySink};
pub use store::SessionStore;
pub use traits::{FileSink, StoreBackend};

//! Storage adapters behind the `UserStore` port.
//!
//! Two implementations: an in-memory map for tests and ephemeral runs,
//! and a file-backed store that keeps one JSON document per user.

mod files;
mod memory;

pub use files::FileStore;
pub use memory::MemoryStore;

/// Bundled in-memory storage backend.
pub mod memory;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for repository operations.
pub mod storage;

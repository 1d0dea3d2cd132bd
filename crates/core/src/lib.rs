//! # Shoplist Core
//!
//! Domain types, repository traits, and error definitions for Shoplist.
//! This crate has **no storage or framework dependencies**; it defines the
//! data model that the store, security, and gateway crates implement against.
//!
//! ## Data model
//!
//! - [`List`]: a named list; at least one always exists after bootstrap
//! - [`Item`]: an entry owned by exactly one list
//! - [`MemoryEntry`]: a remembered name of a deleted item, offered as a suggestion

pub mod error;
pub mod item;
pub mod list;
pub mod memory;

// Re-export key types at crate root for ergonomics
pub use error::{AuthError, Error, InvariantViolation, Result, StoreError, ValidationError};
pub use item::{Item, ItemRepository, display_order};
pub use list::{DEFAULT_LIST_NAME, List, ListRepository, normalize_name};
pub use memory::{MemoryEntry, MemoryRepository};

/// Everything a backing store has to provide, usable as `Arc<dyn Store>`.
pub trait Store: ListRepository + ItemRepository + MemoryRepository {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn backend_name(&self) -> &str;
}

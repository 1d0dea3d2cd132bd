//! Lists: the named containers that own items and remembered suggestions.
//!
//! There is always at least one list once the store has been bootstrapped;
//! implementations refuse to delete the last one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Label used for the list created at bootstrap when none exist.
pub const DEFAULT_LIST_NAME: &str = "Main List";

/// A named shopping/checklist list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: i64,
    pub name: String,
}

/// Trim a user-supplied name, returning `None` when nothing is left.
///
/// Every repository stores and compares names in this trimmed form.
pub fn normalize_name(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// CRUD over lists.
///
/// Unknown ids are silent no-ops everywhere except where an `Option` is
/// returned to signal absence.
#[async_trait]
pub trait ListRepository: Send + Sync {
    /// All lists in creation order (id ascending).
    async fn list_all(&self) -> Result<Vec<List>>;

    /// Look up a single list.
    async fn get_list(&self, id: i64) -> Result<Option<List>>;

    /// Create a list. Fails with `ValidationError::EmptyName` on a blank name.
    async fn create_list(&self, name: &str) -> Result<List>;

    /// Rename a list in place. Blank names and unknown ids are ignored.
    async fn rename_list(&self, id: i64, name: &str) -> Result<()>;

    /// Delete a list together with its items and memory entries.
    ///
    /// Fails with `InvariantViolation::LastListProtected` when `id` is the
    /// only remaining list.
    async fn delete_list(&self, id: i64) -> Result<()>;

    /// Create the default list if no list exists and adopt orphaned items.
    ///
    /// Returns the list it created, or `None` when lists already existed.
    async fn ensure_default(&self, name: &str) -> Result<Option<List>>;
}

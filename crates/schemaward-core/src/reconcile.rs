//! Collection reconciliation.
//!
//! Pure functions computing the full replacement state of one named
//! collection. The remote service only accepts whole-collection writes, so
//! every mutation here returns the complete new collection rather than a
//! patch. Entry names are unique after every call.

use serde::{Deserialize, Serialize};

use crate::types::NamedEntry;

/// How `remove` closes the gap left by a deleted entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalOrder {
    /// Move the last entry into the vacated slot. Remaining order changes.
    #[default]
    Swap,
    /// Shift later entries down by one. Remaining order is preserved.
    Stable,
}

/// Position of the first entry named `name`.
pub fn position<T: NamedEntry>(collection: &[T], name: &str) -> Option<usize> {
    collection.iter().position(|e| e.name() == name)
}

/// True iff any entry is named `name`.
pub fn exists<T: NamedEntry>(collection: &[T], name: &str) -> bool {
    position(collection, name).is_some()
}

/// The entry named `name`, if present.
pub fn find<'a, T: NamedEntry>(collection: &'a [T], name: &str) -> Option<&'a T> {
    collection.iter().find(|e| e.name() == name)
}

/// Insert `desired`, or fully replace the entry sharing its name.
///
/// Replacement is whole-entry: nothing from the previous entry survives.
/// New names are appended; the relative order of other entries is kept.
pub fn upsert<T: NamedEntry>(mut collection: Vec<T>, desired: T) -> Vec<T> {
    match position(&collection, desired.name()) {
        Some(i) => {
            let name = desired.name().to_string();
            collection[i] = desired;
            // Later copies can only come from a server that broke uniqueness.
            let mut kept = false;
            collection.retain(|e| {
                if e.name() != name {
                    return true;
                }
                let keep = !kept;
                kept = true;
                keep
            });
        }
        None => collection.push(desired),
    }
    collection
}

/// Remove the entry named `name`. Absent names are a no-op.
pub fn remove<T: NamedEntry>(mut collection: Vec<T>, name: &str, order: RemovalOrder) -> Vec<T> {
    if let Some(i) = position(&collection, name) {
        match order {
            RemovalOrder::Swap => {
                collection.swap_remove(i);
            }
            RemovalOrder::Stable => {
                collection.remove(i);
            }
        }
    }
    collection
}

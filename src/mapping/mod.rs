//! Keyed child mapping - Ordered key → child records.
//!
//! A transition group keeps its children in a [`KeyedMapping`]: an ordered
//! associative container whose iteration order is the render order.
//!
//! - [`compute_mapping`] turns an ordered child list into a mapping
//! - [`merge_mappings`] unions the previous and next mappings so children that
//!   are leaving keep rendering, in a stable position, until they are evicted
//!
//! # Ordering
//!
//! ```text
//! prev:   a  b  c  d
//! next:   a     c     e
//! merged: a  b  c  e  d
//! ```
//!
//! Removed keys stay in front of the retained key that followed them in
//! `prev`. Removed keys after the last retained key go to the end.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::types::{ChildDescriptor, Key};

// =============================================================================
// KeyedMapping
// =============================================================================

/// Ordered mapping from [`Key`] to a child, or to nothing for placeholders.
#[derive(Clone, Debug)]
pub struct KeyedMapping<C> {
    entries: IndexMap<Key, Option<C>>,
}

impl<C> Default for KeyedMapping<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Equality is order-sensitive: two mappings with the same entries in a
/// different order render differently.
impl<C: PartialEq> PartialEq for KeyedMapping<C> {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.entries.iter().eq(other.entries.iter())
    }
}

impl<C> KeyedMapping<C> {
    pub fn new() -> Self {
        KeyedMapping {
            entries: IndexMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        KeyedMapping {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if the key has an entry, placeholder or not.
    pub fn contains_key(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    /// Child stored under `key`. `None` for absent keys and placeholders.
    pub fn get(&self, key: &Key) -> Option<&C> {
        self.entries.get(key).and_then(Option::as_ref)
    }

    /// True if the key has an entry holding a real child.
    pub fn has_child(&self, key: &Key) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace. A replaced key keeps its position.
    pub fn insert(&mut self, key: Key, child: Option<C>) -> Option<Option<C>> {
        self.entries.insert(key, child)
    }

    /// Remove a key, keeping the relative order of the remaining entries.
    pub fn remove(&mut self, key: &Key) -> Option<Option<C>> {
        self.entries.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, Option<&C>)> {
        self.entries.iter().map(|(key, child)| (key, child.as_ref()))
    }
}

// =============================================================================
// Mapping Construction
// =============================================================================

/// Build a mapping from an ordered child list.
///
/// Children without a key are keyed by position. Placeholders take a slot
/// with no child. If a key repeats, the first occurrence fixes the position
/// and the last occurrence provides the child.
pub fn compute_mapping<C: ChildDescriptor>(children: &[C]) -> KeyedMapping<C> {
    let mut mapping = KeyedMapping::with_capacity(children.len());

    for (index, child) in children.iter().enumerate() {
        let key = child.key().unwrap_or_else(|| Key::positional(index));
        let value = if child.is_placeholder() {
            None
        } else {
            Some(child.clone())
        };

        if mapping.insert(key.clone(), value).is_some() {
            tracing::warn!(%key, index, "duplicate child key; keeping first position");
        }
    }

    mapping
}

/// Union of `prev` and `next` that keeps removed children in place.
///
/// Every key of `next` appears in `next`'s order with `next`'s child. Keys
/// only in `prev` keep their `prev` child and are slotted in front of the
/// retained key that followed them in `prev`, or at the end if none did.
pub fn merge_mappings<C: Clone>(
    prev: &KeyedMapping<C>,
    next: &KeyedMapping<C>,
) -> KeyedMapping<C> {
    let value_for = |key: &Key| -> Option<C> {
        match next.entries.get(key) {
            Some(child) => child.clone(),
            None => prev.entries.get(key).cloned().flatten(),
        }
    };

    // Removed keys, grouped by the retained key they precede
    let mut pending_before: HashMap<&Key, Vec<&Key>> = HashMap::new();
    let mut pending: Vec<&Key> = Vec::new();

    for key in prev.keys() {
        if next.contains_key(key) {
            if !pending.is_empty() {
                pending_before.insert(key, std::mem::take(&mut pending));
            }
        } else {
            pending.push(key);
        }
    }

    let mut merged = KeyedMapping::with_capacity(prev.len().max(next.len()));

    for key in next.keys() {
        if let Some(leaving) = pending_before.remove(key) {
            for leaving_key in leaving {
                merged.insert(leaving_key.clone(), value_for(leaving_key));
            }
        }
        merged.insert(key.clone(), value_for(key));
    }

    for leaving_key in pending {
        merged.insert(leaving_key.clone(), value_for(leaving_key));
    }

    merged
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Child;

    fn keyed(keys: &[&str]) -> Vec<Child<String>> {
        keys.iter().map(|k| Child::keyed(*k, k.to_uppercase())).collect()
    }

    fn key_list<C>(mapping: &KeyedMapping<C>) -> Vec<&str> {
        mapping.keys().map(Key::as_str).collect()
    }

    #[test]
    fn test_compute_mapping_keeps_order() {
        let mapping = compute_mapping(&keyed(&["hello", "world", "click", "me"]));

        assert_eq!(key_list(&mapping), vec!["hello", "world", "click", "me"]);
        assert_eq!(
            mapping.get(&Key::from("world")).and_then(|c| c.content.clone()),
            Some("WORLD".to_string())
        );
    }

    #[test]
    fn test_compute_mapping_positional_fallback() {
        let children = vec![
            Child::unkeyed("a"),
            Child::keyed("x", "b"),
            Child::unkeyed("c"),
        ];
        let mapping = compute_mapping(&children);

        assert_eq!(key_list(&mapping), vec!["0", "x", "2"]);
    }

    #[test]
    fn test_compute_mapping_empty() {
        let mapping = compute_mapping::<Child<u8>>(&[]);
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_compute_mapping_duplicate_first_position_last_value() {
        let children = vec![
            Child::keyed("a", 1),
            Child::keyed("b", 2),
            Child::keyed("a", 3),
        ];
        let mapping = compute_mapping(&children);

        assert_eq!(key_list(&mapping), vec!["a", "b"]);
        assert_eq!(
            mapping.get(&Key::from("a")).and_then(|c| c.content),
            Some(3),
            "last duplicate should provide the value"
        );
    }

    #[test]
    fn test_compute_mapping_placeholder_has_no_child() {
        let children = vec![Child::keyed("a", 1), Child::placeholder("b")];
        let mapping = compute_mapping(&children);

        assert!(mapping.contains_key(&Key::from("b")));
        assert!(!mapping.has_child(&Key::from("b")));
        assert!(mapping.has_child(&Key::from("a")));
    }

    #[test]
    fn test_merge_keeps_removed_keys_in_place() {
        let prev = compute_mapping(&keyed(&["a", "b", "c", "d"]));
        let next = compute_mapping(&keyed(&["a", "c", "e"]));

        let merged = merge_mappings(&prev, &next);

        assert_eq!(key_list(&merged), vec!["a", "b", "c", "e", "d"]);
    }

    #[test]
    fn test_merge_removed_head() {
        let prev = compute_mapping(&keyed(&["hello", "world", "click", "me"]));
        let next = compute_mapping(&keyed(&["world", "click", "me"]));

        let merged = merge_mappings(&prev, &next);

        assert_eq!(key_list(&merged), vec!["hello", "world", "click", "me"]);
    }

    #[test]
    fn test_merge_prefers_next_values() {
        let prev = compute_mapping(&[Child::keyed("a", 1), Child::keyed("b", 2)]);
        let next = compute_mapping(&[Child::keyed("a", 10)]);

        let merged = merge_mappings(&prev, &next);

        assert_eq!(merged.get(&Key::from("a")).and_then(|c| c.content), Some(10));
        assert_eq!(
            merged.get(&Key::from("b")).and_then(|c| c.content),
            Some(2),
            "removed key should keep its previous value"
        );
    }

    #[test]
    fn test_merge_with_self_is_identity() {
        let mapping = compute_mapping(&keyed(&["c", "a", "b"]));
        let merged = merge_mappings(&mapping, &mapping);

        assert_eq!(merged, mapping);
        assert_eq!(key_list(&merged), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_merge_with_empty_sides() {
        let mapping = compute_mapping(&keyed(&["a", "b"]));
        let empty = KeyedMapping::new();

        assert_eq!(key_list(&merge_mappings(&empty, &mapping)), vec!["a", "b"]);
        assert_eq!(key_list(&merge_mappings(&mapping, &empty)), vec!["a", "b"]);
    }

    #[test]
    fn test_equality_is_order_sensitive() {
        let ab = compute_mapping(&keyed(&["a", "b"]));
        let ba = compute_mapping(&keyed(&["b", "a"]));

        assert_ne!(ab, ba);
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut mapping = compute_mapping(&keyed(&["a", "b", "c"]));
        mapping.remove(&Key::from("a"));

        assert_eq!(key_list(&mapping), vec!["b", "c"]);
    }
}

//! Per-type inverted index from tokens to the items that produced them.
//!
//! An index snapshot holds the dataset it was built from alongside the postings, and is
//! swapped in whole: readers holding the previous `Arc` keep a consistent view while a
//! rebuild is installed.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use crate::fields::{FieldTable, SearchItem};
use crate::tokenizer::{cap_chars, tokenize};

/// Immutable index of one entity type
#[derive(Debug)]
pub struct TypeIndex<T> {
    items: Vec<Arc<T>>,
    /// token -> positions in `items`
    postings: HashMap<String, HashSet<usize>>,
}

impl<T: SearchItem> TypeIndex<T> {
    pub fn build(
        entity: &str,
        items: Vec<Arc<T>>,
        table: &FieldTable,
        max_field_chars: usize,
    ) -> Self {
        let mut postings: HashMap<String, HashSet<usize>> = HashMap::new();

        for (position, item) in items.iter().enumerate() {
            for value in table.extract(entity, item.as_ref()) {
                let value = value.to_lowercase();
                for token in tokenize(cap_chars(&value, max_field_chars)) {
                    postings.entry(token).or_default().insert(position);
                }
            }
        }

        Self { items, postings }
    }

    /// Union of the postings of every token (OR semantics)
    pub fn lookup(&self, tokens: &HashSet<String>) -> HashSet<usize> {
        tokens
            .iter()
            .filter_map(|token| self.postings.get(token))
            .flatten()
            .copied()
            .collect()
    }

    pub fn item(&self, position: usize) -> Option<&Arc<T>> {
        self.items.get(position)
    }

    /// The dataset the index was built from, in its original order
    pub fn items(&self) -> &[Arc<T>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn token_count(&self) -> usize {
        self.postings.len()
    }
}

/// Indexes of every entity type
pub struct InvertedIndex<T> {
    table: Arc<FieldTable>,
    max_field_chars: usize,
    indexes: RwLock<HashMap<String, Arc<TypeIndex<T>>>>,
}

impl<T: SearchItem> InvertedIndex<T> {
    pub fn new(table: Arc<FieldTable>, max_field_chars: usize) -> Self {
        Self {
            table,
            max_field_chars,
            indexes: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the index of `entity`. Built outside the lock, installed in one swap.
    pub fn build_index(&self, entity: &str, items: Vec<Arc<T>>) -> Arc<TypeIndex<T>> {
        let index = Arc::new(TypeIndex::build(entity, items, &self.table, self.max_field_chars));
        log::debug!(
            "Built index for '{}': {} items, {} tokens",
            entity,
            index.len(),
            index.token_count()
        );

        let mut indexes = self.indexes.write().unwrap_or_else(PoisonError::into_inner);
        indexes.insert(entity.to_string(), Arc::clone(&index));
        index
    }

    pub fn get(&self, entity: &str) -> Option<Arc<TypeIndex<T>>> {
        let indexes = self.indexes.read().unwrap_or_else(PoisonError::into_inner);
        indexes.get(entity).cloned()
    }

    /// Items reachable from any of `tokens`, in dataset order
    pub fn lookup(&self, entity: &str, tokens: &HashSet<String>) -> Vec<Arc<T>> {
        let Some(index) = self.get(entity) else {
            return Vec::new();
        };

        let mut positions: Vec<usize> = index.lookup(tokens).into_iter().collect();
        positions.sort_unstable();
        positions
            .into_iter()
            .filter_map(|position| index.item(position).cloned())
            .collect()
    }

    pub fn remove(&self, entity: &str) -> bool {
        let mut indexes = self.indexes.write().unwrap_or_else(PoisonError::into_inner);
        indexes.remove(entity).is_some()
    }

    pub fn clear(&self) {
        let mut indexes = self.indexes.write().unwrap_or_else(PoisonError::into_inner);
        indexes.clear();
    }
}

//! Relevance scoring of a candidate against the raw query.
//!
//! Each searchable field contributes on its own: an exact match outranks a prefix match,
//! which outranks a plain substring match. Contributions add up across fields, so an item
//! whose name and code both match ranks above one that matches in a single field.

use crate::fields::{FieldTable, SearchItem};

pub const EXACT_MATCH_SCORE: u32 = 100;
pub const PREFIX_MATCH_SCORE: u32 = 50;
pub const SUBSTRING_MATCH_SCORE: u32 = 20;

/// Score of one lower-cased field value against a lower-cased query
pub fn field_score(field_lower: &str, query_lower: &str) -> u32 {
    if query_lower.is_empty() {
        0
    } else if field_lower == query_lower {
        EXACT_MATCH_SCORE
    } else if field_lower.starts_with(query_lower) {
        PREFIX_MATCH_SCORE
    } else if field_lower.contains(query_lower) {
        SUBSTRING_MATCH_SCORE
    } else {
        0
    }
}

/// Total relevance of `item` for `query_lower` across the searchable fields of `entity`
pub fn score<T: SearchItem>(table: &FieldTable, entity: &str, item: &T, query_lower: &str) -> u32 {
    table
        .extract(entity, item)
        .iter()
        .map(|value| field_score(&value.to_lowercase(), query_lower))
        .sum()
}

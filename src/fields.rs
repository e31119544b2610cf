//! Which fields of an item are searchable, per entity type.
//!
//! The same table drives both index construction and scoring so the two never disagree
//! about what a match is.

use std::collections::HashMap;

use serde_json::Value;

/// An item that can be indexed and scored by field name
pub trait SearchItem: Clone + Send + Sync + 'static {
    /// Text of a named field, if present and non-empty
    fn field_text(&self, field: &str) -> Option<String>;

    /// Every string-valued property; used for entity types without a field list
    fn string_fields(&self) -> Vec<String>;
}

impl SearchItem for Value {
    fn field_text(&self, field: &str) -> Option<String> {
        let mut current = self;
        for segment in field.split('.') {
            current = current.as_object()?.get(segment)?;
        }

        let text = match current {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn string_fields(&self) -> Vec<String> {
        let Some(object) = self.as_object() else {
            return Vec::new();
        };

        object
            .values()
            .filter_map(|value| value.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .collect()
    }
}

const BUILTIN_FIELDS: &[(&str, &[&str])] = &[
    ("customers", &["customer_name", "phone", "email", "city", "state", "gstin"]),
    ("products", &["product_name", "product_code", "hsn_code", "category", "manufacturer"]),
    ("suppliers", &["supplier_name", "phone", "email", "city", "state", "gstin"]),
    ("batches", &["batch_number", "product_name", "manufacturer"]),
];

/// Entity type -> ordered list of searchable fields
#[derive(Debug, Clone, PartialEq)]
pub struct FieldTable {
    fields: HashMap<String, Vec<String>>,
}

impl Default for FieldTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FieldTable {
    /// The catalogue entities the distributor front-end searches
    pub fn builtin() -> Self {
        let fields = BUILTIN_FIELDS
            .iter()
            .map(|(entity, fields)| {
                (entity.to_string(), fields.iter().map(|f| f.to_string()).collect())
            })
            .collect();
        Self { fields }
    }

    /// Built-in table with `overrides` replacing or adding entries
    pub fn with_overrides(overrides: &HashMap<String, Vec<String>>) -> Self {
        let mut table = Self::builtin();
        for (entity, fields) in overrides {
            table.fields.insert(entity.clone(), fields.clone());
        }
        table
    }

    /// Field list for `entity`, or `None` for types without one
    pub fn fields_for(&self, entity: &str) -> Option<&[String]> {
        self.fields.get(entity).map(Vec::as_slice)
    }

    /// Values of the searchable fields of `item`, in table order
    pub fn extract<T: SearchItem>(&self, entity: &str, item: &T) -> Vec<String> {
        match self.fields_for(entity) {
            Some(fields) => fields.iter().filter_map(|field| item.field_text(field)).collect(),
            None => item.string_fields(),
        }
    }
}

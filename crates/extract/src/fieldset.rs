//! Candidate field values pulled out of a single event.

use ridelens_rules::Field;
use std::collections::HashMap;

/// Raw candidate strings keyed by target field.
///
/// Ephemeral: produced by the extractor, consumed by the normalizer,
/// discarded afterwards. The first write to a field wins; later writes are
/// ignored, which is how rule priority is enforced at the container level.
#[derive(Debug, Clone, Default)]
pub struct FieldSet {
    values: HashMap<Field, String>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value for `field` unless one is already present.
    /// Returns whether the value was stored.
    pub fn set_if_absent(&mut self, field: Field, value: impl Into<String>) -> bool {
        use std::collections::hash_map::Entry;
        match self.values.entry(field) {
            Entry::Vacant(slot) => {
                slot.insert(value.into());
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.values.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

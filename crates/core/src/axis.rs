//! Tag-driven variable discovery.
//!
//! When each input row carries a pair of categorical key fields selecting
//! which variable its value belongs to, the set of variables must be known
//! before any cell is allocated. [`VariableAxis::discover`] performs that
//! pre-scan over the whole input and freezes the result.

use std::collections::HashMap;
use std::fmt;

use crate::error::Result;
use crate::io::RowSource;

/// The pair of tag fields identifying one variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagKey {
    pub first: String,
    pub second: String,
}

impl TagKey {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.first, self.second)
    }
}

/// Ordered set of distinct tag keys; a key's position is its value slot.
///
/// Keys keep first-occurrence order. There is no way to add a key once the
/// axis is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableAxis {
    keys: Vec<TagKey>,
    lookup: HashMap<String, HashMap<String, usize>>,
}

impl VariableAxis {
    /// Build an axis from keys in slot order. Duplicates keep their first slot.
    pub fn from_keys<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = TagKey>,
    {
        let mut axis = Self::default();
        for key in keys {
            axis.register(&key.first, &key.second);
        }
        axis
    }

    /// Pre-scan: read every row of `source` and collect the distinct values
    /// of the `tag` column pair in first-occurrence order. Rows missing
    /// either tag field are ignored.
    pub fn discover<S>(source: &S, tag: (usize, usize)) -> Result<Self>
    where
        S: RowSource + ?Sized,
    {
        let mut axis = Self::default();
        source.visit_rows(&mut |_line, fields| {
            if let (Some(first), Some(second)) = (fields.get(tag.0), fields.get(tag.1)) {
                axis.register(first, second);
            }
            Ok(())
        })?;
        Ok(axis)
    }

    fn register(&mut self, first: &str, second: &str) -> usize {
        if let Some(slot) = self.slot_of(first, second) {
            return slot;
        }
        let slot = self.keys.len();
        self.keys.push(TagKey::new(first, second));
        self.lookup
            .entry(first.to_string())
            .or_default()
            .insert(second.to_string(), slot);
        slot
    }

    /// Value slot of the `(first, second)` key, if it was discovered.
    pub fn slot_of(&self, first: &str, second: &str) -> Option<usize> {
        self.lookup.get(first)?.get(second).copied()
    }

    /// Key stored at `slot`.
    pub fn key(&self, slot: usize) -> Option<&TagKey> {
        self.keys.get(slot)
    }

    /// Keys in slot order.
    pub fn keys(&self) -> &[TagKey] {
        &self.keys
    }

    /// Number of variables, i.e. value slots per cell.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

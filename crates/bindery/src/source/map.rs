//! A source backed by an in-memory value tree.

use tracing::trace;

use super::Source;
use crate::error::LoadError;
use crate::key::{Key, Segment};
use crate::shape::Shape;
use crate::value::{Mapping, Value};

/// Resolves keys by walking a tree of mappings and sequences.
///
/// Name segments index mappings and index segments index sequences. Any
/// mismatch on the way (a scalar where a mapping was expected, a missing
/// entry, an index past the end, an explicit null) means the key is not
/// present.
///
/// ```rust,ignore
/// use bindery::MapSource;
/// use serde_json::json;
///
/// let defaults = MapSource::from_json(json!({
///     "server": { "listen": { "host": "127.0.0.1", "port": 8080 } },
/// }))
/// .named("defaults");
/// ```
#[derive(Debug, Clone)]
pub struct MapSource {
    name: String,
    root: Value,
}

impl MapSource {
    pub fn new(root: impl Into<Value>) -> Self {
        Self {
            name: "map".to_string(),
            root: root.into(),
        }
    }

    pub fn from_json(json: serde_json::Value) -> Self {
        Self::new(Value::from(json))
    }

    /// Sets the name reported in errors and provenance.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Walks the tree along `key` and returns the value found there.
    pub fn traverse(&self, key: &Key) -> Result<&Value, LoadError> {
        let mut head = &self.root;
        for segment in key.segments() {
            let next = match (segment, head) {
                (Segment::Name(name), Value::Mapping(map)) => map.get(name),
                (Segment::Index(index), Value::Sequence(items)) => items.get(*index),
                _ => None,
            };
            head = next.ok_or(LoadError::NotPresent)?;
        }

        if head.is_null() {
            return Err(LoadError::NotPresent);
        }
        Ok(head)
    }
}

impl Default for MapSource {
    fn default() -> Self {
        Self::new(Value::empty_mapping())
    }
}

impl From<Mapping> for MapSource {
    fn from(map: Mapping) -> Self {
        Self::new(map)
    }
}

impl Source for MapSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self, shape: &Shape, key: &Key) -> Result<Value, LoadError> {
        let found = self.traverse(key)?;
        trace!(source = %self.name, key = %key, kind = found.kind(), "map entry found");

        let value = match (shape, found) {
            (Shape::Record, Value::Mapping(_)) => Value::empty_mapping(),
            (Shape::Sequence, Value::Sequence(items)) => {
                Value::Sequence(vec![Value::Null; items.len()])
            }
            // Leaves, tables and mismatched shapes are coerced by the slot.
            _ => found.clone(),
        };
        Ok(value)
    }
}

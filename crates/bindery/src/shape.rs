//! Shape descriptors of destination slots.

use std::fmt;

/// What kind of value a destination slot holds.
///
/// Sources decide how to answer a lookup from the shape alone; they never see
/// the concrete Rust type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    String,
    Integer,
    Float,
    Boolean,
    /// A string-keyed map of primitives. Resolved as a single leaf.
    Table,
    /// A struct with declared fields.
    Record,
    /// A growable list of elements.
    Sequence,
}

impl Shape {
    /// Records and sequences expand into child nodes.
    pub fn is_structured(self) -> bool {
        matches!(self, Self::Record | Self::Sequence)
    }

    pub fn is_leaf(self) -> bool {
        !self.is_structured()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Table => "table",
            Self::Record => "record",
            Self::Sequence => "sequence",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

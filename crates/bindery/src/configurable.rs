//! The shape-descriptor trait every bindable slot implements.
//!
//! Records get their implementation from `#[derive(Configurable)]`; this module
//! covers primitives, `String`/`PathBuf`, `Vec`, `Option`, `Box` and maps of
//! primitives.
//!
//! # Implementing by hand
//!
//! ```rust,ignore
//! use bindery::{Children, Configurable, Field, Mismatch, Shape, Value};
//!
//! #[derive(Default)]
//! struct Listen {
//!     host: String,
//!     port: u16,
//! }
//!
//! impl Configurable for Listen {
//!     fn shape(&self) -> Shape {
//!         Shape::Record
//!     }
//!
//!     fn assign(&mut self, value: Value) -> Result<(), Mismatch> {
//!         bindery::configurable::reset_record(self, value)
//!     }
//!
//!     fn children(&mut self) -> Children<'_> {
//!         Children::Fields(vec![
//!             Field::undeclared("host", &mut self.host),
//!             Field::declared("port", "port,optional", &mut self.port),
//!         ])
//!     }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::path::PathBuf;

use crate::error::Mismatch;
use crate::key::Key;
use crate::shape::Shape;
use crate::value::Value;

/// A destination slot the engine can resolve and traverse.
pub trait Configurable {
    /// The shape sources are asked for.
    fn shape(&self) -> Shape;

    /// Stores a value produced by a source.
    ///
    /// Leaves coerce the value into their own type. Records and sequences
    /// treat it as an allocation step: they replace themselves with a fresh
    /// default instance (sized to the sequence length) whose children are
    /// resolved afterwards.
    fn assign(&mut self, value: Value) -> Result<(), Mismatch>;

    /// The next generation of slots below this one.
    fn children(&mut self) -> Children<'_> {
        Children::None
    }
}

/// Child slots returned by [`Configurable::children`].
pub enum Children<'a> {
    /// A leaf.
    None,
    /// Declared fields of a record, in declaration order.
    Fields(Vec<Field<'a>>),
    /// Elements of a sequence, in index order.
    Elements(Vec<&'a mut dyn Configurable>),
    /// A transparent wrapper around a single slot.
    Indirect(&'a mut dyn Configurable),
}

/// One record field: its identifier, its declaration and its storage.
pub struct Field<'a> {
    pub ident: &'static str,
    pub declaration: Option<&'static str>,
    pub slot: &'a mut dyn Configurable,
}

impl<'a> Field<'a> {
    pub fn declared(
        ident: &'static str,
        declaration: &'static str,
        slot: &'a mut dyn Configurable,
    ) -> Self {
        Self {
            ident,
            declaration: Some(declaration),
            slot,
        }
    }

    /// A field bound under its kebab-cased identifier.
    pub fn undeclared(ident: &'static str, slot: &'a mut dyn Configurable) -> Self {
        Self {
            ident,
            declaration: None,
            slot,
        }
    }

    /// The field's own key, or `None` when it is excluded.
    pub fn key(&self) -> Option<Key> {
        Key::for_field(self.ident, self.declaration)
    }
}

/// Record allocation: accepts a mapping and resets the record to its default.
pub fn reset_record<T: Default>(slot: &mut T, value: Value) -> Result<(), Mismatch> {
    match value {
        Value::Mapping(_) => {
            *slot = T::default();
            Ok(())
        }
        other => Err(Mismatch::new(Shape::Record, &other)),
    }
}

// =============================================================================
// Leaves
// =============================================================================

impl Configurable for String {
    fn shape(&self) -> Shape {
        Shape::String
    }

    fn assign(&mut self, value: Value) -> Result<(), Mismatch> {
        match value {
            Value::String(s) => {
                *self = s;
                Ok(())
            }
            other => Err(Mismatch::new(Shape::String, &other)),
        }
    }
}

impl Configurable for PathBuf {
    fn shape(&self) -> Shape {
        Shape::String
    }

    fn assign(&mut self, value: Value) -> Result<(), Mismatch> {
        match value {
            Value::String(s) => {
                *self = PathBuf::from(s);
                Ok(())
            }
            other => Err(Mismatch::new(Shape::String, &other)),
        }
    }
}

impl Configurable for bool {
    fn shape(&self) -> Shape {
        Shape::Boolean
    }

    fn assign(&mut self, value: Value) -> Result<(), Mismatch> {
        match value {
            Value::Boolean(b) => {
                *self = b;
                Ok(())
            }
            other => Err(Mismatch::new(Shape::Boolean, &other)),
        }
    }
}

macro_rules! impl_integer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Configurable for $ty {
                fn shape(&self) -> Shape {
                    Shape::Integer
                }

                fn assign(&mut self, value: Value) -> Result<(), Mismatch> {
                    match value {
                        Value::Integer(n) => {
                            *self = <$ty>::try_from(n).map_err(|_| {
                                Mismatch::out_of_range(Shape::Integer, n, stringify!($ty))
                            })?;
                            Ok(())
                        }
                        other => Err(Mismatch::new(Shape::Integer, &other)),
                    }
                }
            }
        )*
    };
}

impl_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! impl_float {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Configurable for $ty {
                fn shape(&self) -> Shape {
                    Shape::Float
                }

                fn assign(&mut self, value: Value) -> Result<(), Mismatch> {
                    match value {
                        Value::Float(f) => {
                            *self = f as $ty;
                            Ok(())
                        }
                        Value::Integer(n) => {
                            *self = n as $ty;
                            Ok(())
                        }
                        other => Err(Mismatch::new(Shape::Float, &other)),
                    }
                }
            }
        )*
    };
}

impl_float!(f32, f64);

// =============================================================================
// Tables
// =============================================================================

fn table_entries<V>(value: Value) -> Result<Vec<(String, V)>, Mismatch>
where
    V: Configurable + Default,
{
    let map = match value {
        Value::Mapping(map) => map,
        other => return Err(Mismatch::new(Shape::Table, &other)),
    };

    let mut entries = Vec::with_capacity(map.len());
    for (name, raw) in map {
        let mut entry = V::default();
        if entry.shape().is_structured() {
            return Err(Mismatch {
                expected: Shape::Table,
                found: format!("{} entry `{name}`", entry.shape()),
            });
        }
        entry.assign(raw).map_err(|e| Mismatch {
            expected: Shape::Table,
            found: format!("{} in entry `{name}`", e.found),
        })?;
        entries.push((name, entry));
    }
    Ok(entries)
}

impl<V, S> Configurable for HashMap<String, V, S>
where
    V: Configurable + Default,
    S: BuildHasher + Default,
{
    fn shape(&self) -> Shape {
        Shape::Table
    }

    fn assign(&mut self, value: Value) -> Result<(), Mismatch> {
        *self = table_entries(value)?.into_iter().collect();
        Ok(())
    }
}

impl<V> Configurable for BTreeMap<String, V>
where
    V: Configurable + Default,
{
    fn shape(&self) -> Shape {
        Shape::Table
    }

    fn assign(&mut self, value: Value) -> Result<(), Mismatch> {
        *self = table_entries(value)?.into_iter().collect();
        Ok(())
    }
}

// =============================================================================
// Sequences and indirections
// =============================================================================

impl<T> Configurable for Vec<T>
where
    T: Configurable + Default,
{
    fn shape(&self) -> Shape {
        Shape::Sequence
    }

    fn assign(&mut self, value: Value) -> Result<(), Mismatch> {
        match value {
            Value::Sequence(items) => {
                *self = items.iter().map(|_| T::default()).collect();
                Ok(())
            }
            other => Err(Mismatch::new(Shape::Sequence, &other)),
        }
    }

    fn children(&mut self) -> Children<'_> {
        Children::Elements(
            self.iter_mut()
                .map(|element| element as &mut dyn Configurable)
                .collect(),
        )
    }
}

impl<T> Configurable for Option<T>
where
    T: Configurable + Default,
{
    fn shape(&self) -> Shape {
        match self {
            Some(inner) => inner.shape(),
            None => T::default().shape(),
        }
    }

    fn assign(&mut self, value: Value) -> Result<(), Mismatch> {
        let mut inner = T::default();
        inner.assign(value)?;
        *self = Some(inner);
        Ok(())
    }

    fn children(&mut self) -> Children<'_> {
        match self {
            Some(inner) => Children::Indirect(inner),
            None => Children::None,
        }
    }
}

impl<T: Configurable> Configurable for Box<T> {
    fn shape(&self) -> Shape {
        (**self).shape()
    }

    fn assign(&mut self, value: Value) -> Result<(), Mismatch> {
        (**self).assign(value)
    }

    fn children(&mut self) -> Children<'_> {
        Children::Indirect(&mut **self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_leaf() {
        let mut s = String::new();
        s.assign(Value::from("hello")).unwrap();
        assert_eq!(s, "hello");

        let err = s.assign(Value::Integer(3)).unwrap_err();
        assert_eq!(err.expected, Shape::String);
        assert_eq!(err.found, "integer");
        assert_eq!(s, "hello");
    }

    #[test]
    fn test_integer_range_checked() {
        let mut port = 0u16;
        port.assign(Value::Integer(8080)).unwrap();
        assert_eq!(port, 8080);

        let err = port.assign(Value::Integer(70_000)).unwrap_err();
        assert!(err.found.contains("out of range for u16"));

        let err = port.assign(Value::Integer(-1)).unwrap_err();
        assert!(err.found.contains("-1"));
    }

    #[test]
    fn test_float_accepts_integers() {
        let mut ratio = 0.0f64;
        ratio.assign(Value::Integer(2)).unwrap();
        assert_eq!(ratio, 2.0);
        ratio.assign(Value::Float(0.25)).unwrap();
        assert_eq!(ratio, 0.25);
        assert!(ratio.assign(Value::from("x")).is_err());
    }

    #[test]
    fn test_bool_rejects_strings() {
        let mut flag = false;
        assert!(flag.assign(Value::from("true")).is_err());
        flag.assign(Value::Boolean(true)).unwrap();
        assert!(flag);
    }

    #[test]
    fn test_vec_allocates_defaults() {
        let mut items = vec![String::from("stale")];
        items
            .assign(Value::from(json!(["a", "b", "c"])))
            .unwrap();
        assert_eq!(items, vec![String::new(), String::new(), String::new()]);

        match items.children() {
            Children::Elements(elements) => assert_eq!(elements.len(), 3),
            _ => panic!("expected elements"),
        }
    }

    #[test]
    fn test_option_indirection() {
        let mut slot: Option<u32> = None;
        assert_eq!(slot.shape(), Shape::Integer);
        assert!(matches!(slot.children(), Children::None));

        slot.assign(Value::Integer(5)).unwrap();
        assert_eq!(slot, Some(5));

        let mut slot: Option<u32> = None;
        assert!(slot.assign(Value::from("five")).is_err());
        assert_eq!(slot, None);
    }

    #[test]
    fn test_box_delegates() {
        let mut boxed = Box::new(String::new());
        assert_eq!(boxed.shape(), Shape::String);
        boxed.assign(Value::from("inner")).unwrap();
        assert_eq!(*boxed, "inner");
        assert!(matches!(boxed.children(), Children::Indirect(_)));
    }

    #[test]
    fn test_table_of_primitives() {
        let mut table: BTreeMap<String, u32> = BTreeMap::new();
        table
            .assign(Value::from(json!({"a": 1, "b": 2})))
            .unwrap();
        assert_eq!(table.get("a"), Some(&1));
        assert_eq!(table.get("b"), Some(&2));

        let err = table.assign(Value::from(json!({"a": "x"}))).unwrap_err();
        assert_eq!(err.expected, Shape::Table);
        assert!(err.found.contains("entry `a`"));

        let mut tables: HashMap<String, Vec<String>> = HashMap::new();
        assert!(tables.assign(Value::from(json!({"a": []}))).is_err());
    }

    #[test]
    fn test_reset_record_requires_mapping() {
        let mut value = 7u8;
        reset_record(&mut value, Value::empty_mapping()).unwrap();
        assert_eq!(value, 0);
        assert!(reset_record(&mut value, Value::from("x")).is_err());
    }
}

//! Procedural macros for the bindery configuration binder.
//!
//! This crate provides:
//!
//! - `#[derive(Configurable)]` - Describes a struct as a bindable record
//!
//! The macros are re-exported by `bindery`; depend on that crate instead of
//! this one.

mod configurable;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives `bindery::Configurable` for a struct with named fields.
///
/// The struct becomes a record: sources are asked to allocate it, after which
/// each field is resolved under its own key. Allocation resets the struct to
/// `Default::default()`, so the struct must implement `Default`.
///
/// # Field Attributes
///
/// | Attribute                         | Key                               |
/// |-----------------------------------|-----------------------------------|
/// | *(none)*                          | kebab-cased field name, required  |
/// | `#[config("a.b")]`                | `a.b`, required                   |
/// | `#[config("a.b,optional")]`       | `a.b`, optional                   |
/// | `#[config(",optional")]`          | kebab-cased field name, optional  |
/// | `#[config("-")]`                  | not bound                         |
///
/// Excluded fields need not implement `Configurable`.
///
/// # Example
///
/// ```rust,ignore
/// use bindery::Configurable;
///
/// #[derive(Default, Configurable)]
/// pub struct Spec {
///     #[config("container.image")]
///     pub image: String,
///     #[config("volumes,optional")]
///     pub volumes: Vec<Volume>,
///     pub replica_count: u32,
///     #[config("-")]
///     pub cache: Option<Handle>,
/// }
/// ```
#[proc_macro_derive(Configurable, attributes(config))]
pub fn derive_configurable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match configurable::derive_configurable(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

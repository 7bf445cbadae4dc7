//! `#[derive(Configurable)]` implementation.
//!
//! Generates `impl ::bindery::Configurable` with:
//!
//! 1. `shape()` - always `Shape::Record`
//! 2. `assign()` - resets the struct to its default on a mapping
//! 3. `children()` - one `Field` per non-excluded field, in declaration order
//!
//! Declarations are validated here so that a malformed key is a compile error
//! rather than a silently dropped segment at bind time.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Fields, GenericParam, LitStr, parse_quote, spanned::Spanned,
};

const EXCLUDED: &str = "-";

// ============================================================================
// Field declarations
// ============================================================================

/// What a field's `#[config(...)]` attribute says.
enum Declaration {
    /// No attribute: bound under the derived name.
    Derived,
    /// `#[config("...")]` with a key declaration.
    Explicit(LitStr),
    /// `#[config("-")]`
    Excluded,
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<Declaration> {
    let mut declaration = Declaration::Derived;
    let mut seen = false;

    for attr in attrs {
        if !attr.path().is_ident("config") {
            continue;
        }
        if seen {
            return Err(syn::Error::new(
                attr.span(),
                "duplicate #[config] attribute on field",
            ));
        }
        seen = true;

        let lit: LitStr = attr.parse_args()?;
        let value = lit.value();
        declaration = if value.trim() == EXCLUDED {
            Declaration::Excluded
        } else {
            validate(&lit, &value)?;
            Declaration::Explicit(lit)
        };
    }

    Ok(declaration)
}

/// Rejects empty path segments such as `a..b` or `.a`. An empty path as a
/// whole (`",optional"`) is allowed and means "derived name".
fn validate(lit: &LitStr, value: &str) -> syn::Result<()> {
    let path = value.split(',').next().unwrap_or_default().trim();
    if path.is_empty() {
        return Ok(());
    }
    if path.split('.').any(|segment| segment.trim().is_empty()) {
        return Err(syn::Error::new(
            lit.span(),
            format!("invalid key `{value}`: empty path segment"),
        ));
    }
    if path.split('.').any(|segment| segment.trim() == EXCLUDED) {
        return Err(syn::Error::new(
            lit.span(),
            format!("invalid key `{value}`: `-` excludes a field and takes no options"),
        ));
    }
    Ok(())
}

// ============================================================================
// Entry point
// ============================================================================

pub fn derive_configurable(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new(
                    input.span(),
                    "Configurable cannot be derived for tuple structs; fields need names to form keys",
                ));
            }
        },
        Data::Enum(_) => {
            return Err(syn::Error::new(
                input.span(),
                "Configurable cannot be derived for enums. Implement it by hand as a string leaf instead.",
            ));
        }
        Data::Union(_) => {
            return Err(syn::Error::new(
                input.span(),
                "Configurable cannot be derived for unions",
            ));
        }
    };

    let mut entries = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(ident) = &field.ident else {
            continue;
        };
        let ident_str = LitStr::new(&ident.to_string(), ident.span());

        match parse_field_attrs(&field.attrs)? {
            Declaration::Excluded => {}
            Declaration::Derived => entries.push(quote! {
                ::bindery::Field::undeclared(#ident_str, &mut self.#ident)
            }),
            Declaration::Explicit(declaration) => entries.push(quote! {
                ::bindery::Field::declared(#ident_str, #declaration, &mut self.#ident)
            }),
        }
    }

    let mut generics = input.generics.clone();
    for param in &mut generics.params {
        if let GenericParam::Type(ty) = param {
            ty.bounds.push(parse_quote!(::bindery::Configurable));
        }
    }
    generics
        .make_where_clause()
        .predicates
        .push(parse_quote!(Self: ::core::default::Default));
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::bindery::Configurable for #name #ty_generics #where_clause {
            fn shape(&self) -> ::bindery::Shape {
                ::bindery::Shape::Record
            }

            fn assign(
                &mut self,
                value: ::bindery::Value,
            ) -> ::core::result::Result<(), ::bindery::Mismatch> {
                ::bindery::configurable::reset_record(self, value)
            }

            fn children(&mut self) -> ::bindery::Children<'_> {
                ::bindery::Children::Fields(::std::vec![#(#entries),*])
            }
        }
    })
}

//! Generic parameter and trait bound handling.
//!
//! The generated impl gains one extra type parameter for the masker's
//! estimator. Bounds are added per masked field type rather than per generic
//! parameter, so fields that pass through (including `PhantomData<T>`) never
//! constrain the struct's generics:
//!
//! ```ignore
//! struct Row<T, U> {
//!     #[mask]
//!     count: T,              // T: Maskable<Estimator>
//!     label: U,              // no bound
//!     _marker: PhantomData<U>,
//! }
//! ```

use proc_macro2::TokenStream;
use syn::{parse_quote, Ident};

/// Adds the estimator parameter and a `Maskable` bound for each masked field type.
pub(crate) fn add_estimator_param(
    mut generics: syn::Generics,
    estimator: &Ident,
    crate_root: &TokenStream,
    masked_types: &[syn::Type],
) -> syn::Generics {
    generics
        .params
        .push(parse_quote!(#estimator: #crate_root::CardinalityEstimate));

    let where_clause = generics.make_where_clause();
    for ty in masked_types {
        where_clause
            .predicates
            .push(parse_quote!(#ty: #crate_root::Maskable<#estimator>));
    }
    generics
}

//! Derive macros for `disclosure`.
//!
//! This crate generates the traversal code behind `#[derive(MaskRecord)]`. It:
//! - reads `#[mask(...)]` container and field attributes
//! - emits a `MaskRecord` implementation that asks the masker, per field,
//!   whether the field's metric is masked for the row's datasource
//!
//! It does **not** decide what is masked or how. Those rules live in the main
//! `disclosure` crate and are applied at runtime.

// <https://doc.rust-lang.org/rustc/lints/listing/allowed-by-default.html>
#![warn(
    anonymous_parameters,
    bare_trait_objects,
    elided_lifetimes_in_paths,
    missing_copy_implementations,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces
)]
// <https://rust-lang.github.io/rust-clippy/stable>
#![warn(
    clippy::all,
    clippy::cargo,
    clippy::dbg_macro,
    clippy::float_cmp_const,
    clippy::get_unwrap,
    clippy::mem_forget,
    clippy::nursery,
    clippy::pedantic,
    clippy::todo,
    clippy::unwrap_used,
    clippy::uninlined_format_args
)]
// Allow some clippy lints
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::multiple_crate_versions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::cargo_common_metadata,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::option_if_let_else
)]
// Allow some lints while testing
#![cfg_attr(test, allow(clippy::unwrap_used))]

#[allow(unused_extern_crates)]
extern crate proc_macro;

use proc_macro2::TokenStream;
use proc_macro_crate::{crate_name, FoundCrate};
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, Data, DeriveInput, Result};

mod container;
mod derive_struct;
mod generics;
mod strategy;
use container::{parse_container_options, ContainerOptions};
use derive_struct::derive_struct;
use generics::add_estimator_param;

/// Derives `disclosure::MaskRecord` for structs.
///
/// The generated `mask_fields` masks a `#[mask]` field only when
/// `PrivacyMasker::should_mask(datasource, metric_name, stage)` holds, so the
/// same row type can be used for masked and unmasked tables.
///
/// # Container Attributes
///
/// - `#[mask(rename_all = "...")]` - Derive metric names from field names with a
///   case rule: `camelCase`, `PascalCase`, `snake_case`, `kebab-case`,
///   `SCREAMING_SNAKE_CASE`, `lowercase` or `UPPERCASE`.
///
/// # Field Attributes
///
/// - **No annotation**: The field passes through unchanged.
/// - `#[mask]`: The field is masked through `disclosure::Maskable` when its
///   metric is selected. The metric name is the field name (after `rename_all`).
/// - `#[mask(name = "...")]`: As `#[mask]`, with an explicit metric name.
///   Required on tuple struct fields.
///
/// The impl is generic over the masker's estimator type, bounded by
/// `FieldType: Maskable<Estimator>` for every masked field.
///
/// Enums and unions are rejected at compile time.
#[proc_macro_derive(MaskRecord, attributes(mask))]
pub fn derive_mask_record(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

/// Returns the token stream to reference the disclosure crate root.
///
/// Handles crate renaming (e.g., `masking = { package = "disclosure", ... }`)
/// and internal usage (when derive is used inside the disclosure crate itself).
fn crate_root() -> TokenStream {
    match crate_name("disclosure") {
        Ok(FoundCrate::Itself) => quote! { crate },
        Ok(FoundCrate::Name(name)) => {
            let ident = format_ident!("{}", name);
            quote! { ::#ident }
        }
        Err(_) => quote! { ::disclosure },
    }
}

fn expand(input: DeriveInput) -> Result<TokenStream> {
    let DeriveInput {
        ident,
        generics,
        data,
        attrs,
        ..
    } = input;

    let ContainerOptions { rename_all } = parse_container_options(&attrs)?;
    let crate_root = crate_root();

    let data = match data {
        Data::Struct(data) => data,
        Data::Enum(data) => {
            return Err(syn::Error::new(
                data.enum_token.span(),
                "`MaskRecord` can only be derived for structs",
            ));
        }
        Data::Union(data) => {
            return Err(syn::Error::new(
                data.union_token.span(),
                "`MaskRecord` cannot be derived for unions",
            ));
        }
    };

    let output = derive_struct(data, rename_all, &crate_root)?;

    let estimator = format_ident!("__DisclosureEstimator");
    let record_generics =
        add_estimator_param(generics.clone(), &estimator, &crate_root, &output.masked_types);
    let (impl_generics, _, where_clause) = record_generics.split_for_impl();
    let (_, ty_generics, _) = generics.split_for_impl();
    let body = &output.body;

    Ok(quote! {
        impl #impl_generics #crate_root::MaskRecord<#estimator> for #ident #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn mask_fields(
                self,
                __disclosure_masker: &#crate_root::PrivacyMasker<#estimator>,
                __disclosure_datasource: ::core::option::Option<&#crate_root::DataSourceRef>,
                __disclosure_stage: #crate_root::MaskingStage,
            ) -> Self {
                #body
            }
        }
    })
}

//! Struct-specific `MaskRecord` derivation.
//!
//! This module generates the per-field masking logic and collects the field
//! types that need a `Maskable` bound.

use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote, quote_spanned};
use syn::{ext::IdentExt, spanned::Spanned, DataStruct, Fields, Ident, Result};

use crate::{
    container::RenameRule,
    strategy::{parse_field_strategy, Strategy},
};

pub(crate) struct StructDeriveOutput {
    pub(crate) body: TokenStream,
    pub(crate) masked_types: Vec<syn::Type>,
}

pub(crate) fn derive_struct(
    data: DataStruct,
    rename_all: Option<RenameRule>,
    crate_root: &TokenStream,
) -> Result<StructDeriveOutput> {
    match data.fields {
        Fields::Named(fields) => derive_named_struct(fields, rename_all, crate_root),
        Fields::Unnamed(fields) => derive_unnamed_struct(fields, crate_root),
        Fields::Unit => Ok(StructDeriveOutput {
            body: quote! { self },
            masked_types: Vec::new(),
        }),
    }
}

/// Emits the statement that rebinds `binding` to its masked value when the
/// masker selects `metric` for the row's datasource.
fn generate_field_mask(
    binding: &Ident,
    metric: &str,
    span: Span,
    crate_root: &TokenStream,
) -> TokenStream {
    quote_spanned! { span =>
        let #binding = if __disclosure_masker.should_mask(
            __disclosure_datasource,
            #metric,
            __disclosure_stage,
        ) {
            #crate_root::Maskable::mask_with(#binding, __disclosure_masker)
        } else {
            #binding
        };
    }
}

fn derive_named_struct(
    fields: syn::FieldsNamed,
    rename_all: Option<RenameRule>,
    crate_root: &TokenStream,
) -> Result<StructDeriveOutput> {
    let mut patterns = Vec::new();
    let mut transforms = Vec::new();
    let mut masked_types = Vec::new();

    for (index, field) in fields.named.into_iter().enumerate() {
        let span = field.span();
        let strategy = parse_field_strategy(&field.attrs)?;
        let Some(ident) = field.ident else {
            return Err(syn::Error::new(span, "named field without an identifier"));
        };
        let binding = format_ident!("__field_{index}");

        if let Strategy::Mask { name } = strategy {
            let metric = name.unwrap_or_else(|| {
                let field_name = ident.unraw().to_string();
                rename_all.map_or_else(|| field_name.clone(), |rule| rule.apply(&field_name))
            });
            transforms.push(generate_field_mask(&binding, &metric, span, crate_root));
            masked_types.push(field.ty);
        }
        patterns.push(quote! { #ident: #binding });
    }

    Ok(StructDeriveOutput {
        body: quote! {
            let Self { #(#patterns),* } = self;
            #(#transforms)*
            Self { #(#patterns),* }
        },
        masked_types,
    })
}

fn derive_unnamed_struct(
    fields: syn::FieldsUnnamed,
    crate_root: &TokenStream,
) -> Result<StructDeriveOutput> {
    let mut bindings = Vec::new();
    let mut transforms = Vec::new();
    let mut masked_types = Vec::new();

    for (index, field) in fields.unnamed.into_iter().enumerate() {
        let span = field.span();
        let strategy = parse_field_strategy(&field.attrs)?;
        let binding = format_ident!("__field_{index}");

        match strategy {
            Strategy::PassThrough => {}
            Strategy::Mask { name: Some(metric) } => {
                transforms.push(generate_field_mask(&binding, &metric, span, crate_root));
                masked_types.push(field.ty);
            }
            Strategy::Mask { name: None } => {
                return Err(syn::Error::new(
                    span,
                    "tuple struct fields need an explicit metric name: #[mask(name = \"...\")]",
                ));
            }
        }
        bindings.push(binding);
    }

    Ok(StructDeriveOutput {
        body: quote! {
            let Self ( #(#bindings),* ) = self;
            #(#transforms)*
            Self ( #(#bindings),* )
        },
        masked_types,
    })
}

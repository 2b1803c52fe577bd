//! Parsing of `#[mask(...)]` field attributes.
//!
//! This module maps attribute syntax to masking decisions and produces
//! structured errors for invalid forms.

use proc_macro2::Span;
use syn::{spanned::Spanned, Attribute, LitStr, Meta, Result};

/// Field masking strategy based on `#[mask(...)]` attributes.
///
/// ## Strategy Mapping
///
/// | Attribute | Strategy | Behavior |
/// |-----------|----------|----------|
/// | None | `PassThrough` | Field passes through unchanged |
/// | `#[mask]` | `Mask { name: None }` | Masked under the field's own metric name |
/// | `#[mask(name = "m")]` | `Mask { name: Some("m") }` | Masked under metric `m` |
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Strategy {
    /// No annotation: pass through unchanged.
    PassThrough,
    /// Mask through `Maskable` when the masker selects the metric.
    Mask {
        /// Explicit metric name; `None` derives it from the field name.
        name: Option<String>,
    },
}

fn set_strategy(target: &mut Option<Strategy>, next: Strategy, span: Span) -> Result<()> {
    if target.is_some() {
        return Err(syn::Error::new(
            span,
            "multiple #[mask] attributes specified on the same field",
        ));
    }
    *target = Some(next);
    Ok(())
}

fn parse_metric_name(value: &LitStr) -> Result<String> {
    let name = value.value();
    if name.trim().is_empty() {
        return Err(syn::Error::new(value.span(), "metric name must not be empty"));
    }
    Ok(name)
}

pub(crate) fn parse_field_strategy(attrs: &[Attribute]) -> Result<Strategy> {
    let mut strategy: Option<Strategy> = None;
    for attr in attrs {
        if !attr.path().is_ident("mask") {
            continue;
        }

        match &attr.meta {
            Meta::Path(_) => {
                set_strategy(&mut strategy, Strategy::Mask { name: None }, attr.span())?;
            }
            Meta::List(list) => {
                let mut name = None;
                list.parse_nested_meta(|meta| {
                    if meta.path.is_ident("name") {
                        if name.is_some() {
                            return Err(meta.error("duplicate `name` option"));
                        }
                        let value: LitStr = meta.value()?.parse()?;
                        name = Some(parse_metric_name(&value)?);
                        Ok(())
                    } else {
                        Err(meta.error("unknown field option; expected `name = \"...\"`"))
                    }
                })?;
                set_strategy(&mut strategy, Strategy::Mask { name }, attr.span())?;
            }
            Meta::NameValue(_) => {
                return Err(syn::Error::new(
                    attr.span(),
                    "name-value syntax is not supported for #[mask]; use #[mask(name = \"...\")]",
                ));
            }
        }
    }

    Ok(strategy.unwrap_or(Strategy::PassThrough))
}

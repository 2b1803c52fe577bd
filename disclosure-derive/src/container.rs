//! Container-level attribute parsing for `#[derive(MaskRecord)]`.
//!
//! This module handles attributes on the struct itself, not on fields.

use syn::{Attribute, LitStr, Meta, Result};

/// Case rule that turns a field name into a metric name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RenameRule {
    CamelCase,
    PascalCase,
    SnakeCase,
    KebabCase,
    ScreamingSnakeCase,
    LowerCase,
    UpperCase,
}

impl RenameRule {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "camelCase" => Some(Self::CamelCase),
            "PascalCase" => Some(Self::PascalCase),
            "snake_case" => Some(Self::SnakeCase),
            "kebab-case" => Some(Self::KebabCase),
            "SCREAMING_SNAKE_CASE" => Some(Self::ScreamingSnakeCase),
            "lowercase" => Some(Self::LowerCase),
            "UPPERCASE" => Some(Self::UpperCase),
            _ => None,
        }
    }

    /// Applies the rule to a snake_case field name.
    pub(crate) fn apply(self, field: &str) -> String {
        match self {
            Self::SnakeCase => field.to_string(),
            Self::KebabCase => field.replace('_', "-"),
            Self::ScreamingSnakeCase | Self::UpperCase => field.to_ascii_uppercase(),
            Self::LowerCase => field.to_ascii_lowercase(),
            Self::PascalCase => field.split('_').map(capitalize).collect(),
            Self::CamelCase => {
                let pascal: String = field.split('_').map(capitalize).collect();
                let mut chars = pascal.chars();
                chars.next().map_or_else(String::new, |first| {
                    first.to_lowercase().chain(chars).collect()
                })
            }
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Options parsed from container-level `#[mask(...)]` attributes.
#[derive(Clone, Debug, Default)]
pub(crate) struct ContainerOptions {
    /// Case rule for metric names derived from field names.
    pub(crate) rename_all: Option<RenameRule>,
}

/// Parses container-level `#[mask(...)]` attributes.
pub(crate) fn parse_container_options(attrs: &[Attribute]) -> Result<ContainerOptions> {
    let mut options = ContainerOptions::default();

    for attr in attrs {
        if !attr.path().is_ident("mask") {
            continue;
        }

        match &attr.meta {
            Meta::Path(_) => {
                // Bare #[mask] on container - currently no meaning, ignore
            }
            Meta::List(list) => {
                list.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename_all") {
                        let value: LitStr = meta.value()?.parse()?;
                        let rule = RenameRule::from_name(&value.value()).ok_or_else(|| {
                            syn::Error::new(
                                value.span(),
                                format!("unknown rename rule `{}`", value.value()),
                            )
                        })?;
                        options.rename_all = Some(rule);
                        Ok(())
                    } else {
                        Err(meta.error(format!(
                            "unknown container option `{}`; expected `rename_all`",
                            meta.path
                                .get_ident()
                                .map_or_else(|| "?".to_string(), ToString::to_string)
                        )))
                    }
                })?;
            }
            Meta::NameValue(nv) => {
                return Err(syn::Error::new_spanned(
                    nv,
                    "name-value syntax is not supported for container-level #[mask]",
                ));
            }
        }
    }

    Ok(options)
}

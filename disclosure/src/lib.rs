//! Disclosure control for aggregate query results.
//!
//! This crate sits between a query engine and its clients and decides what a
//! client is allowed to see:
//! - **Masking**: numeric aggregates and distinct-count sketches are
//!   extrapolated and floor-censored, so small counts are never returned verbatim.
//! - **Reveal**: hidden-in-plain-sight metrics (names ending in `_hip_`) are
//!   dropped unless the request presents the configured reveal key.
//!
//! Every decision reads one immutable [`PolicyConfig`]. Hosts build it once (or
//! publish replacements through [`SharedPolicy`]) and pass it in explicitly;
//! nothing here reads environment or global state at decision time.
//!
//! Key rules:
//! - Only table datasources are masked. Derived sources push masking to their
//!   leaf tables.
//! - A true zero stays zero when `mask_zero_counts` is off.
//! - Values of unknown kind pass through [`PrivacyMasker::do_mask`] unchanged.
//! - Revealing requires the flag, a strong key, and an exact credential match.
//!
//! What this crate does not do:
//! - execute queries or parse requests
//! - provide k-anonymity or differential privacy
//! - keep an audit trail
//!
//! Result rows can derive [`MaskRecord`] to mask their `#[mask]` fields:
//!
//! ```rust
//! # #[allow(unused_imports)]
//! # use disclosure::*;
//! use disclosure::{DataSourceRef, MaskRecord, MaskingStage, PolicySettings, PrivacyMasker};
//!
//! #[derive(MaskRecord)]
//! struct TripRow {
//!     region: String,
//!     #[mask]
//!     riders: i64,
//! }
//!
//! # fn main() {
//! let config = PolicySettings {
//!     mask_at_query_time: true,
//!     privacy_threshold: 21,
//!     extrapolation_factor: 1.4,
//!     masked_field_keys: ["trips.riders".to_string()].into_iter().collect(),
//!     ..PolicySettings::default()
//! }
//! .build()
//! .unwrap();
//! let masker: PrivacyMasker = PrivacyMasker::new(config);
//!
//! let row = TripRow { region: "north".into(), riders: 3 };
//! let masked = row.mask_fields(&masker, Some(&DataSourceRef::table("trips")), MaskingStage::Query);
//! assert_eq!(masked.riders, 21);
//! assert_eq!(masked.region, "north");
//! # }
//! ```

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
    clippy::struct_excessive_bools,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::option_if_let_else
)]
// Allow some lints while testing
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::cast_precision_loss))]

pub use disclosure_derive::MaskRecord;

#[allow(unused_extern_crates)]
extern crate self as disclosure;

// Module declarations
mod error;
mod estimator;
mod handle;
#[cfg(feature = "json")]
mod json;
mod masking;
mod policy;
mod reveal;
#[cfg(feature = "slog")]
pub mod slog;

// Re-exports
pub use error::{ConfigError, GateError, KeyValidationError, SketchError};
pub use estimator::{
    build_synthetic, synthetic_id, CardinalityEstimate, HyperLogLog, SYNTHETIC_ID_PREFIX,
};
pub use handle::{PolicySnapshot, SharedPolicy};
pub use masking::{
    apply_privacy_censor, extrapolate, DataSourceKind, DataSourceRef, MaskRecord, MaskScalar,
    Maskable, MetricValue, PrivacyMasker,
};
pub use policy::{
    parse_masked_keys, MaskingStage, PolicyConfig, PolicySettings, DEFAULT_EXTRAPOLATION_FACTOR,
    DEFAULT_PRIVACY_THRESHOLD, EXTRAPOLATION_FACTOR_KEY, MASKED_METRICS_KEY, MASK_AT_INDEX_KEY,
    MASK_AT_QUERY_KEY, MASK_ZERO_COUNTS_KEY, PRIVACY_THRESHOLD_KEY, REDACTED_PLACEHOLDER,
    REVEAL_HIDDEN_KEY, REVEAL_KEY_KEY,
};
pub use reveal::{
    is_hidden_metric, validate_reveal_key, RevealGate, HIDDEN_METRIC_SUFFIX, MIN_REVEAL_KEY_LEN,
    REVEAL_HEADER,
};

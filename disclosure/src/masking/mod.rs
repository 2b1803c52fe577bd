//! Masking decisions, numeric censoring, and traversal.
//!
//! - **`censor`**: pure numeric steps (`extrapolate`, `apply_privacy_censor`)
//! - **`datasource`**: which plan node a value comes from (`DataSourceRef`)
//! - **`masker`**: decisions bound to one policy snapshot (`PrivacyMasker`)
//! - **`value`**: the tagged union dispatched by `do_mask` (`MetricValue`)
//! - **`maskable`**: traversal of containers and records (`Maskable`, `MaskRecord`)

mod censor;
mod datasource;
mod maskable;
mod masker;
mod value;

pub use censor::{apply_privacy_censor, extrapolate, MaskScalar};
pub use datasource::{DataSourceKind, DataSourceRef};
pub use maskable::{MaskRecord, Maskable};
pub use masker::PrivacyMasker;
pub use value::MetricValue;

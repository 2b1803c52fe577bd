//! Adapters for reporting policy state through `slog`.
//!
//! This module is responsible for:
//! - Emitting a [`PolicyConfig`] as structured JSON with the reveal key redacted.
//! - The startup report hosts log once a policy is loaded, including the
//!   warning when hidden metrics cannot be revealed.
//!
//! It does not configure `slog`; the host supplies the `Logger`. Nothing in the
//! decision functions logs.

use serde::Serialize;
use serde_json::Value as JsonValue;
use slog::{info, warn, Key, Logger, Record, Result as SlogResult, Serializer, Value as SlogValue};

use crate::{
    error::GateError,
    policy::{PolicyConfig, REDACTED_PLACEHOLDER},
    reveal::RevealGate,
};

#[derive(Serialize)]
struct PolicySummary<'a> {
    mask_at_query_time: bool,
    mask_at_index_time: bool,
    mask_zero_counts: bool,
    extrapolation_factor: f64,
    privacy_threshold: i64,
    masked_field_keys: Vec<&'a str>,
    reveal_enabled: bool,
    reveal_key: Option<&'static str>,
}

impl<'a> From<&'a PolicyConfig> for PolicySummary<'a> {
    fn from(config: &'a PolicyConfig) -> Self {
        let settings = config.settings();
        let mut masked_field_keys: Vec<&str> =
            settings.masked_field_keys.iter().map(String::as_str).collect();
        masked_field_keys.sort_unstable();
        Self {
            mask_at_query_time: settings.mask_at_query_time,
            mask_at_index_time: settings.mask_at_index_time,
            mask_zero_counts: settings.mask_zero_counts,
            extrapolation_factor: settings.extrapolation_factor,
            privacy_threshold: settings.privacy_threshold,
            masked_field_keys,
            reveal_enabled: settings.reveal_enabled,
            reveal_key: settings.reveal_key.as_ref().map(|_| REDACTED_PLACEHOLDER),
        }
    }
}

/// Emits the policy as nested JSON. The reveal key is never serialized.
///
/// If the summary cannot be converted to JSON, a JSON string placeholder is
/// emitted instead of an error.
impl SlogValue for PolicyConfig {
    fn serialize(
        &self,
        record: &Record<'_>,
        key: Key,
        serializer: &mut dyn Serializer,
    ) -> SlogResult {
        let summary = serde_json::to_value(PolicySummary::from(self))
            .unwrap_or_else(|_| JsonValue::String("Failed to serialize policy".to_string()));
        SlogValue::serialize(&slog::Serde(summary), record, key, serializer)
    }
}

impl SlogValue for GateError {
    fn serialize(
        &self,
        _record: &Record<'_>,
        key: Key,
        serializer: &mut dyn Serializer,
    ) -> SlogResult {
        serializer.emit_arguments(key, &format_args!("{self}"))
    }
}

/// Logs the loaded policy at info level.
pub fn log_policy(logger: &Logger, config: &PolicyConfig) {
    info!(logger, "disclosure policy loaded"; "policy" => config);
}

/// Reports whether hidden metrics can be revealed, for use at startup.
///
/// Failures are logged as a warning and reported as `false`; they never stop
/// the host. Callers keep revealing disabled when this returns `false`.
pub fn check_reveal_at_startup(logger: &Logger, gate: &RevealGate) -> bool {
    match gate.can_reveal() {
        Ok(()) => {
            info!(logger, "hidden metrics can be revealed to credentialed requests");
            true
        }
        Err(err) => {
            warn!(logger, "hidden metrics will not be revealed"; "reason" => err);
            false
        }
    }
}

//! Masking and reveal filtering for JSON result rows.
//!
//! This is the shape most serving layers hand results around in just before
//! they are written to the client: one `serde_json` object per row, keyed by
//! metric name.

use serde_json::{Map, Number, Value};

use crate::{
    estimator::CardinalityEstimate,
    masking::{DataSourceRef, PrivacyMasker},
    policy::MaskingStage,
    reveal::{is_hidden_metric, RevealGate},
};

impl<E: CardinalityEstimate> PrivacyMasker<E> {
    /// Masks a JSON number to an integer; every other kind passes through.
    pub fn mask_json(&self, value: Value) -> Value {
        match value {
            Value::Number(number) => Value::Number(Number::from(self.mask_json_number(&number))),
            other => other,
        }
    }

    /// Masks the entries of `row` that the policy selects for `datasource`.
    pub fn mask_json_row(
        &self,
        row: &mut Map<String, Value>,
        datasource: Option<&DataSourceRef>,
        stage: MaskingStage,
    ) {
        for (metric, value) in row.iter_mut() {
            if self.should_mask(datasource, metric, stage) {
                *value = self.mask_json(std::mem::take(value));
            }
        }
    }

    fn mask_json_number(&self, number: &Number) -> i64 {
        if let Some(value) = number.as_i64() {
            self.mask_scalar(value)
        } else if let Some(value) = number.as_u64() {
            self.mask_scalar(value)
        } else {
            self.mask_scalar(number.as_f64().unwrap_or_default())
        }
    }
}

impl RevealGate {
    /// Drops hidden metrics from `row` unless `credential` is authorized.
    pub fn retain_visible(&self, row: &mut Map<String, Value>, credential: Option<&str>) {
        let authorized = credential.is_some_and(|presented| self.authorize_request(presented));
        if !authorized {
            row.retain(|metric, _| !is_hidden_metric(metric));
        }
    }
}

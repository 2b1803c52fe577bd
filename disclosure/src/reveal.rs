//! Gated reveal of hidden-in-plain-sight (HIP) metrics.
//!
//! A metric whose name ends in [`HIDDEN_METRIC_SUFFIX`] is left out of normal
//! responses. A request may see it only when the process has revealing enabled,
//! the configured key passes [`validate_reveal_key`], and the request presents
//! that exact key (typically in the [`REVEAL_HEADER`] header).

use std::sync::Arc;

use crate::{
    error::{GateError, KeyValidationError},
    policy::PolicyConfig,
};

/// Name suffix that marks a metric as hidden.
pub const HIDDEN_METRIC_SUFFIX: &str = "_hip_";

/// Request header that carries the reveal credential.
pub const REVEAL_HEADER: &str = "X-Hip-Reveal";

/// Minimum reveal key length, in characters.
pub const MIN_REVEAL_KEY_LEN: usize = 20;

/// Returns `true` if `name` is non-blank and carries the hidden suffix.
pub fn is_hidden_metric(name: &str) -> bool {
    !name.trim().is_empty() && name.ends_with(HIDDEN_METRIC_SUFFIX)
}

/// Checks a reveal key against the strength rules.
///
/// A key must be at least [`MIN_REVEAL_KEY_LEN`] characters and mix upper and
/// lower case, a digit, and a character outside `[A-Za-z0-9]`. The first
/// violated rule is reported.
pub fn validate_reveal_key(key: &str) -> Result<(), KeyValidationError> {
    if key.trim().is_empty() {
        return Err(KeyValidationError::Empty);
    }
    if key.chars().count() < MIN_REVEAL_KEY_LEN {
        return Err(KeyValidationError::TooShort);
    }
    if key == key.to_lowercase() {
        return Err(KeyValidationError::NoUppercase);
    }
    if key == key.to_uppercase() {
        return Err(KeyValidationError::NoLowercase);
    }
    if !key.chars().any(|ch| ch.is_ascii_digit()) {
        return Err(KeyValidationError::NoDigit);
    }
    if key.chars().all(|ch| ch.is_ascii_alphanumeric()) {
        return Err(KeyValidationError::NoSymbol);
    }
    Ok(())
}

/// Per-snapshot reveal decisions.
#[derive(Clone, Debug)]
pub struct RevealGate {
    config: Arc<PolicyConfig>,
}

impl RevealGate {
    pub fn new(config: impl Into<Arc<PolicyConfig>>) -> Self {
        Self {
            config: config.into(),
        }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Succeeds when this process may reveal hidden metrics at all.
    pub fn can_reveal(&self) -> Result<(), GateError> {
        if !self.config.reveal_enabled() {
            return Err(GateError::NotConfigured);
        }
        validate_reveal_key(self.config.reveal_key().unwrap_or_default())?;
        Ok(())
    }

    /// Returns `true` when `presented` unlocks hidden metrics for a request.
    ///
    /// The comparison is exact: case-sensitive and untrimmed.
    pub fn authorize_request(&self, presented: &str) -> bool {
        self.can_reveal().is_ok() && self.config.reveal_key() == Some(presented)
    }

    /// Returns `true` if `metric` may be included in a response for a request
    /// presenting `credential`.
    pub fn is_visible(&self, metric: &str, credential: Option<&str>) -> bool {
        !is_hidden_metric(metric)
            || credential.is_some_and(|presented| self.authorize_request(presented))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicySettings;

    const GOOD_KEY: &str = "aA11aA11aA11aA11aA11#";

    fn gate(reveal_enabled: bool, reveal_key: Option<&str>) -> RevealGate {
        let config = PolicySettings {
            reveal_enabled,
            reveal_key: reveal_key.map(ToString::to_string),
            ..PolicySettings::default()
        }
        .build()
        .unwrap();
        RevealGate::new(config)
    }

    #[test]
    fn hidden_metric_detection() {
        assert!(is_hidden_metric("abc_hip_"));
        assert!(!is_hidden_metric("abc"));
        assert!(!is_hidden_metric(" "));
        assert!(!is_hidden_metric(""));
        assert!(!is_hidden_metric("_hip_abc"));
    }

    #[test]
    fn key_validation_rejects_each_weakness() {
        assert_eq!(validate_reveal_key(""), Err(KeyValidationError::Empty));
        assert_eq!(validate_reveal_key("    "), Err(KeyValidationError::Empty));
        assert_eq!(
            validate_reveal_key("aA#1aA#1aA#1aA#1aA#"),
            Err(KeyValidationError::TooShort)
        );
        assert_eq!(
            validate_reveal_key("aA##aA##aA##aA##aA##"),
            Err(KeyValidationError::NoDigit)
        );
        assert_eq!(
            validate_reveal_key("a1##a1##a1##a1##a1##"),
            Err(KeyValidationError::NoUppercase)
        );
        assert_eq!(
            validate_reveal_key("A#11A#11A#11A#11A#11"),
            Err(KeyValidationError::NoLowercase)
        );
        assert_eq!(
            validate_reveal_key("aA11aA11aA11aA11aA11"),
            Err(KeyValidationError::NoSymbol)
        );
        assert_eq!(validate_reveal_key(GOOD_KEY), Ok(()));
    }

    #[test]
    fn key_validation_is_deterministic() {
        let first = validate_reveal_key("short");
        assert_eq!(first, validate_reveal_key("short"));
    }

    #[test]
    fn can_reveal_requires_enabled_flag() {
        assert_eq!(gate(false, Some(GOOD_KEY)).can_reveal(), Err(GateError::NotConfigured));
    }

    #[test]
    fn can_reveal_propagates_bad_key() {
        assert_eq!(
            gate(true, None).can_reveal(),
            Err(GateError::BadKey(KeyValidationError::Empty))
        );
        assert_eq!(
            gate(true, Some("aA11aA11aA11aA11aA11")).can_reveal(),
            Err(GateError::BadKey(KeyValidationError::NoSymbol))
        );
    }

    #[test]
    fn can_reveal_with_good_key() {
        assert_eq!(gate(true, Some(GOOD_KEY)).can_reveal(), Ok(()));
    }

    #[test]
    fn authorize_request_requires_exact_match() {
        let gate = gate(true, Some(GOOD_KEY));
        assert!(gate.authorize_request(GOOD_KEY));
        assert!(!gate.authorize_request(""));
        assert!(!gate.authorize_request("AA11aA11aA11aA11aA11#"));
        assert!(!gate.authorize_request(" aA11aA11aA11aA11aA11#"));
    }

    #[test]
    fn authorize_request_fails_when_gate_is_closed() {
        assert!(!gate(false, Some(GOOD_KEY)).authorize_request(GOOD_KEY));
        let weak = "aA11aA11aA11aA11aA11";
        assert!(!gate(true, Some(weak)).authorize_request(weak));
    }

    #[test]
    fn visibility_of_plain_and_hidden_metrics() {
        let gate = gate(true, Some(GOOD_KEY));
        assert!(gate.is_visible("trips", None));
        assert!(!gate.is_visible("trips_hip_", None));
        assert!(!gate.is_visible("trips_hip_", Some("wrong")));
        assert!(gate.is_visible("trips_hip_", Some(GOOD_KEY)));
    }
}

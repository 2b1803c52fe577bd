//! The immutable policy snapshot every masking and reveal decision reads.
//!
//! A [`PolicyConfig`] is built once from [`PolicySettings`] (or from a key/value
//! source via [`PolicyConfig::from_lookup`]) and is never mutated afterwards.
//! Hosts that reconfigure at runtime publish a new snapshot instead, see
//! [`crate::SharedPolicy`].

use std::{collections::HashSet, fmt, str::FromStr};

use crate::error::ConfigError;

/// Enables masking of query results.
pub const MASK_AT_QUERY_KEY: &str = "DISCLOSURE_MASK_AT_QUERY";
/// Enables masking while ingesting/indexing.
pub const MASK_AT_INDEX_KEY: &str = "DISCLOSURE_MASK_AT_INDEX";
/// Whether a true zero is masked like any other value.
pub const MASK_ZERO_COUNTS_KEY: &str = "DISCLOSURE_MASK_ZERO_COUNTS";
/// Multiplier applied before censoring.
pub const EXTRAPOLATION_FACTOR_KEY: &str = "DISCLOSURE_EXTRAPOLATION_FACTOR";
/// Smallest value ever disclosed.
pub const PRIVACY_THRESHOLD_KEY: &str = "DISCLOSURE_PRIVACY_THRESHOLD";
/// Comma-separated `table.field` keys.
pub const MASKED_METRICS_KEY: &str = "DISCLOSURE_MASKED_METRICS";
/// Enables revealing hidden metrics.
pub const REVEAL_HIDDEN_KEY: &str = "DISCLOSURE_REVEAL_HIDDEN";
/// The shared secret for revealing hidden metrics.
pub const REVEAL_KEY_KEY: &str = "DISCLOSURE_REVEAL_KEY";

pub const DEFAULT_EXTRAPOLATION_FACTOR: f64 = 1.35;
pub const DEFAULT_PRIVACY_THRESHOLD: i64 = 200;

/// Placeholder printed instead of the reveal key.
pub const REDACTED_PLACEHOLDER: &str = "[REDACTED]";

/// The pipeline stage a masking decision is made for.
///
/// Both stages share the same rule; each has its own enable flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaskingStage {
    /// Results are being assembled for a client.
    Query,
    /// Rows are being ingested.
    Index,
}

impl MaskingStage {
    #[must_use]
    pub fn from_index_time(at_index_time: bool) -> Self {
        if at_index_time {
            Self::Index
        } else {
            Self::Query
        }
    }
}

/// Unvalidated policy values.
///
/// Fill in the fields you need and call [`PolicySettings::build`]:
///
/// ```rust
/// use disclosure::PolicySettings;
///
/// let config = PolicySettings {
///     mask_at_query_time: true,
///     privacy_threshold: 21,
///     extrapolation_factor: 1.4,
///     ..PolicySettings::default()
/// }
/// .build()
/// .unwrap();
/// assert_eq!(config.privacy_threshold(), 21);
/// ```
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct PolicySettings {
    pub mask_at_query_time: bool,
    pub mask_at_index_time: bool,
    pub mask_zero_counts: bool,
    pub extrapolation_factor: f64,
    pub privacy_threshold: i64,
    /// Keys formatted as `"<table>.<field>"`.
    pub masked_field_keys: HashSet<String>,
    pub reveal_enabled: bool,
    pub reveal_key: Option<String>,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            mask_at_query_time: false,
            mask_at_index_time: false,
            mask_zero_counts: true,
            extrapolation_factor: DEFAULT_EXTRAPOLATION_FACTOR,
            privacy_threshold: DEFAULT_PRIVACY_THRESHOLD,
            masked_field_keys: HashSet::new(),
            reveal_enabled: false,
            reveal_key: None,
        }
    }
}

impl PolicySettings {
    /// Validates the settings and freezes them into a snapshot.
    ///
    /// The reveal key is not checked here: a weak key only disables revealing,
    /// it never prevents the policy from being built.
    pub fn build(self) -> Result<PolicyConfig, ConfigError> {
        if !self.extrapolation_factor.is_finite() || self.extrapolation_factor <= 0.0 {
            return Err(ConfigError::InvalidFactor(self.extrapolation_factor));
        }
        if self.privacy_threshold < 0 {
            return Err(ConfigError::NegativeThreshold(self.privacy_threshold));
        }
        Ok(PolicyConfig { settings: self })
    }
}

impl fmt::Debug for PolicySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicySettings")
            .field("mask_at_query_time", &self.mask_at_query_time)
            .field("mask_at_index_time", &self.mask_at_index_time)
            .field("mask_zero_counts", &self.mask_zero_counts)
            .field("extrapolation_factor", &self.extrapolation_factor)
            .field("privacy_threshold", &self.privacy_threshold)
            .field("masked_field_keys", &self.masked_field_keys)
            .field("reveal_enabled", &self.reveal_enabled)
            .field(
                "reveal_key",
                &self.reveal_key.as_ref().map(|_| REDACTED_PLACEHOLDER),
            )
            .finish()
    }
}

/// Read-only policy snapshot.
///
/// `Debug` never prints the reveal key.
#[derive(Clone, PartialEq, Default)]
pub struct PolicyConfig {
    settings: PolicySettings,
}

impl PolicyConfig {
    /// Reads every policy key from `lookup`.
    ///
    /// Missing or blank values fall back to their defaults.
    pub fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut settings = PolicySettings::default();

        if let Some(raw) = read_trimmed(&mut lookup, MASK_AT_QUERY_KEY) {
            settings.mask_at_query_time = parse_bool(MASK_AT_QUERY_KEY, &raw)?;
        }
        if let Some(raw) = read_trimmed(&mut lookup, MASK_AT_INDEX_KEY) {
            settings.mask_at_index_time = parse_bool(MASK_AT_INDEX_KEY, &raw)?;
        }
        if let Some(raw) = read_trimmed(&mut lookup, MASK_ZERO_COUNTS_KEY) {
            settings.mask_zero_counts = parse_bool(MASK_ZERO_COUNTS_KEY, &raw)?;
        }
        if let Some(raw) = read_trimmed(&mut lookup, EXTRAPOLATION_FACTOR_KEY) {
            settings.extrapolation_factor = parse_number(EXTRAPOLATION_FACTOR_KEY, &raw)?;
        }
        if let Some(raw) = read_trimmed(&mut lookup, PRIVACY_THRESHOLD_KEY) {
            settings.privacy_threshold = parse_number(PRIVACY_THRESHOLD_KEY, &raw)?;
        }
        if let Some(raw) = read_trimmed(&mut lookup, MASKED_METRICS_KEY) {
            settings.masked_field_keys = parse_masked_keys(&raw);
        }
        if let Some(raw) = read_trimmed(&mut lookup, REVEAL_HIDDEN_KEY) {
            settings.reveal_enabled = parse_bool(REVEAL_HIDDEN_KEY, &raw)?;
        }
        // The key is compared verbatim, so only blank values are discarded.
        settings.reveal_key = lookup(REVEAL_KEY_KEY).filter(|key| !key.trim().is_empty());

        settings.build()
    }

    /// Reads the policy from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Returns the validated settings this snapshot was built from.
    pub fn settings(&self) -> &PolicySettings {
        &self.settings
    }

    pub fn masking_enabled(&self, stage: MaskingStage) -> bool {
        match stage {
            MaskingStage::Query => self.settings.mask_at_query_time,
            MaskingStage::Index => self.settings.mask_at_index_time,
        }
    }

    pub fn mask_zero_counts(&self) -> bool {
        self.settings.mask_zero_counts
    }

    pub fn extrapolation_factor(&self) -> f64 {
        self.settings.extrapolation_factor
    }

    pub fn privacy_threshold(&self) -> i64 {
        self.settings.privacy_threshold
    }

    pub fn masked_field_keys(&self) -> &HashSet<String> {
        &self.settings.masked_field_keys
    }

    /// Returns `true` if `"<table>.<field>"` is a masked key.
    pub fn is_masked_field(&self, table: &str, field: &str) -> bool {
        self.settings
            .masked_field_keys
            .contains(&format!("{table}.{field}"))
    }

    pub fn reveal_enabled(&self) -> bool {
        self.settings.reveal_enabled
    }

    pub fn reveal_key(&self) -> Option<&str> {
        self.settings.reveal_key.as_deref()
    }
}

impl fmt::Debug for PolicyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PolicyConfig").field(&self.settings).finish()
    }
}

impl TryFrom<PolicySettings> for PolicyConfig {
    type Error = ConfigError;

    fn try_from(settings: PolicySettings) -> Result<Self, Self::Error> {
        settings.build()
    }
}

/// Splits a comma-separated key list, trimming entries and dropping empty ones.
pub fn parse_masked_keys(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn read_trimmed<F>(lookup: &mut F, key: &str) -> Option<String>
where
    F: FnMut(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    if raw.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ConfigError::InvalidBool {
            key,
            value: raw.to_string(),
        })
    }
}

fn parse_number<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl FnMut(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_source_uses_defaults() {
        let config = PolicyConfig::from_lookup(|_| None).unwrap();
        assert!(!config.masking_enabled(MaskingStage::Query));
        assert!(!config.masking_enabled(MaskingStage::Index));
        assert!(config.mask_zero_counts());
        assert!((config.extrapolation_factor() - 1.35).abs() < f64::EPSILON);
        assert_eq!(config.privacy_threshold(), 200);
        assert!(config.masked_field_keys().is_empty());
        assert!(!config.reveal_enabled());
        assert_eq!(config.reveal_key(), None);
        assert_eq!(config, PolicyConfig::default());
    }

    #[test]
    fn lookup_reads_every_key() {
        let config = PolicyConfig::from_lookup(lookup_from(&[
            (MASK_AT_QUERY_KEY, "TRUE"),
            (MASK_AT_INDEX_KEY, " true "),
            (MASK_ZERO_COUNTS_KEY, "false"),
            (EXTRAPOLATION_FACTOR_KEY, "1.4"),
            (PRIVACY_THRESHOLD_KEY, "21"),
            (MASKED_METRICS_KEY, "test.hello, test2.bye,,"),
            (REVEAL_HIDDEN_KEY, "true"),
            (REVEAL_KEY_KEY, "aA11aA11aA11aA11aA11#"),
        ]))
        .unwrap();

        assert!(config.masking_enabled(MaskingStage::Query));
        assert!(config.masking_enabled(MaskingStage::Index));
        assert!(!config.mask_zero_counts());
        assert!((config.extrapolation_factor() - 1.4).abs() < f64::EPSILON);
        assert_eq!(config.privacy_threshold(), 21);
        assert_eq!(config.masked_field_keys().len(), 2);
        assert!(config.is_masked_field("test", "hello"));
        assert!(config.is_masked_field("test2", "bye"));
        assert!(config.reveal_enabled());
        assert_eq!(config.reveal_key(), Some("aA11aA11aA11aA11aA11#"));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = PolicyConfig::from_lookup(lookup_from(&[
            (PRIVACY_THRESHOLD_KEY, "   "),
            (REVEAL_KEY_KEY, "  "),
        ]))
        .unwrap();
        assert_eq!(config.privacy_threshold(), DEFAULT_PRIVACY_THRESHOLD);
        assert_eq!(config.reveal_key(), None);
    }

    #[test]
    fn reveal_key_is_not_trimmed() {
        let config =
            PolicyConfig::from_lookup(lookup_from(&[(REVEAL_KEY_KEY, " aA11aA11aA11aA11aA11# ")]))
                .unwrap();
        assert_eq!(config.reveal_key(), Some(" aA11aA11aA11aA11aA11# "));
    }

    #[test]
    fn invalid_bool_is_rejected() {
        let err = PolicyConfig::from_lookup(lookup_from(&[(MASK_AT_QUERY_KEY, "yes")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidBool {
                key: MASK_AT_QUERY_KEY,
                value: "yes".to_string(),
            }
        );
    }

    #[test]
    fn invalid_number_is_rejected() {
        let err =
            PolicyConfig::from_lookup(lookup_from(&[(PRIVACY_THRESHOLD_KEY, "2e")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { key, .. } if key == PRIVACY_THRESHOLD_KEY));
    }

    #[test]
    fn build_rejects_bad_factor_and_threshold() {
        let zero_factor = PolicySettings {
            extrapolation_factor: 0.0,
            ..PolicySettings::default()
        };
        assert_eq!(zero_factor.build(), Err(ConfigError::InvalidFactor(0.0)));

        let nan_factor = PolicySettings {
            extrapolation_factor: f64::NAN,
            ..PolicySettings::default()
        };
        assert!(matches!(nan_factor.build(), Err(ConfigError::InvalidFactor(_))));

        let negative = PolicySettings {
            privacy_threshold: -1,
            ..PolicySettings::default()
        };
        assert_eq!(negative.build(), Err(ConfigError::NegativeThreshold(-1)));
    }

    #[test]
    fn debug_never_prints_reveal_key() {
        let config = PolicySettings {
            reveal_key: Some("aA11aA11aA11aA11aA11#".to_string()),
            ..PolicySettings::default()
        }
        .build()
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("aA11"));
        assert!(debug.contains(REDACTED_PLACEHOLDER));
    }

    #[test]
    fn stage_from_index_time() {
        assert_eq!(MaskingStage::from_index_time(true), MaskingStage::Index);
        assert_eq!(MaskingStage::from_index_time(false), MaskingStage::Query);
    }
}

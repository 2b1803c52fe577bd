//! The masking decisions bound to one policy snapshot.

use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use super::{
    censor::{apply_privacy_censor, extrapolate, MaskScalar},
    datasource::DataSourceRef,
    value::MetricValue,
};
use crate::{
    estimator::{build_synthetic, CardinalityEstimate, HyperLogLog},
    policy::{MaskingStage, PolicyConfig},
};

/// Turns raw aggregates into values a client may see.
///
/// A masker owns its [`PolicyConfig`] and the synthetic "floor" estimator for
/// that policy's privacy threshold. The floor is built on first use and shared
/// read-only afterwards; callers receive clones, never the cached value itself.
///
/// ```rust
/// use disclosure::{MaskingStage, PolicySettings, PrivacyMasker};
///
/// let config = PolicySettings {
///     privacy_threshold: 21,
///     extrapolation_factor: 1.4,
///     ..PolicySettings::default()
/// }
/// .build()
/// .unwrap();
/// let masker: PrivacyMasker = PrivacyMasker::new(config);
///
/// assert_eq!(masker.mask_scalar(1i64), 21);
/// assert_eq!(masker.mask_scalar(22i64), 31);
/// ```
#[derive(Clone)]
pub struct PrivacyMasker<E = HyperLogLog> {
    config: Arc<PolicyConfig>,
    floor: OnceLock<E>,
}

impl<E: CardinalityEstimate> PrivacyMasker<E> {
    pub fn new(config: impl Into<Arc<PolicyConfig>>) -> Self {
        Self {
            config: config.into(),
            floor: OnceLock::new(),
        }
    }

    /// Builds a masker for a new policy snapshot.
    ///
    /// The cached floor estimator is carried over only when the privacy
    /// threshold is unchanged; otherwise it is rebuilt on next use.
    #[must_use]
    pub fn reconfigure(&self, config: impl Into<Arc<PolicyConfig>>) -> Self {
        let config = config.into();
        let floor = match self.floor.get() {
            Some(cached) if config.privacy_threshold() == self.config.privacy_threshold() => {
                OnceLock::from(cached.clone())
            }
            _ => OnceLock::new(),
        };
        Self { config, floor }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn shared_config(&self) -> Arc<PolicyConfig> {
        Arc::clone(&self.config)
    }

    /// Decides whether `field_name` of `datasource` is masked at `stage`.
    ///
    /// Only a table datasource can match. For derived sources, call this for
    /// each of [`DataSourceRef::leaf_tables`] instead.
    pub fn should_mask(
        &self,
        datasource: Option<&DataSourceRef>,
        field_name: &str,
        stage: MaskingStage,
    ) -> bool {
        if !self.config.masking_enabled(stage) || field_name.is_empty() {
            return false;
        }
        match datasource {
            Some(DataSourceRef::Table { name }) => self.config.is_masked_field(name, field_name),
            Some(DataSourceRef::Derived { .. }) | None => false,
        }
    }

    /// Extrapolates and censors a scalar.
    ///
    /// A true zero is returned as `0` when the policy does not mask zero counts.
    pub fn mask_scalar<S: MaskScalar>(&self, value: S) -> i64 {
        if value.is_zero() && !self.config.mask_zero_counts() {
            return 0;
        }
        apply_privacy_censor(
            extrapolate(value, self.config.extrapolation_factor()),
            self.config.privacy_threshold(),
        )
    }

    /// Replaces an estimator with a synthetic one of the disclosed size.
    ///
    /// Estimates below `1.0` count as "nobody observed" and are returned as-is
    /// when the policy does not mask zero counts.
    ///
    /// # Performance
    ///
    /// Below the threshold the cached floor is cloned. Above it, a fresh
    /// estimator is built from one SHA-256 digest per disclosed identity, so the
    /// cost is linear in the extrapolated count: an estimate of 10^7 at factor
    /// 1.35 hashes about 1.35 * 10^7 identities. Hosts masking large distinct
    /// counts per cell should budget for that or mask off the request path.
    pub fn mask_cardinality(&self, estimate: E) -> E {
        let observed = estimate.estimated_count();
        if observed < 1.0 && !self.config.mask_zero_counts() {
            return estimate;
        }
        let extrapolated = extrapolate(observed, self.config.extrapolation_factor());
        if extrapolated < self.config.privacy_threshold() {
            return self.floor_estimate().clone();
        }
        build_synthetic(u64::try_from(extrapolated).unwrap_or(0))
    }

    /// Masks a value according to its kind.
    ///
    /// Scalars come back as [`MetricValue::Long`]; `Other` is returned as is.
    pub fn do_mask<T>(&self, value: MetricValue<E, T>) -> MetricValue<E, T> {
        match value {
            MetricValue::Long(value) => MetricValue::Long(self.mask_scalar(value)),
            MetricValue::Double(value) => MetricValue::Long(self.mask_scalar(value)),
            MetricValue::Float(value) => MetricValue::Long(self.mask_scalar(value)),
            MetricValue::Cardinality(estimate) => {
                MetricValue::Cardinality(self.mask_cardinality(estimate))
            }
            MetricValue::Other(other) => MetricValue::Other(other),
        }
    }

    /// The synthetic estimator for exactly `privacy_threshold` identities.
    pub fn floor_estimate(&self) -> &E {
        self.floor.get_or_init(|| {
            build_synthetic(u64::try_from(self.config.privacy_threshold()).unwrap_or(0))
        })
    }

    /// Returns `true` once the floor estimator has been built.
    pub fn is_floor_cached(&self) -> bool {
        self.floor.get().is_some()
    }
}

impl<E> fmt::Debug for PrivacyMasker<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivacyMasker")
            .field("config", &self.config)
            .field("floor_cached", &self.floor.get().is_some())
            .finish()
    }
}

//! Atomic publication of policy snapshots for hosts that reconfigure live.
//!
//! Decisions never read a policy that is being changed: a reader takes one
//! [`PolicySnapshot`] and uses it for the whole request, while
//! [`SharedPolicy::publish`] swaps in a complete replacement.

use std::sync::{Arc, PoisonError, RwLock};

use crate::{
    estimator::{CardinalityEstimate, HyperLogLog},
    masking::PrivacyMasker,
    policy::PolicyConfig,
    reveal::RevealGate,
};

/// A masker and a reveal gate built from the same [`PolicyConfig`].
#[derive(Debug)]
pub struct PolicySnapshot<E = HyperLogLog> {
    masker: PrivacyMasker<E>,
    gate: RevealGate,
}

impl<E: CardinalityEstimate> PolicySnapshot<E> {
    pub fn new(config: impl Into<Arc<PolicyConfig>>) -> Self {
        let config = config.into();
        Self {
            masker: PrivacyMasker::new(Arc::clone(&config)),
            gate: RevealGate::new(config),
        }
    }

    pub fn config(&self) -> &PolicyConfig {
        self.masker.config()
    }

    pub fn masker(&self) -> &PrivacyMasker<E> {
        &self.masker
    }

    pub fn gate(&self) -> &RevealGate {
        &self.gate
    }
}

/// The current policy snapshot of a process, replaceable at runtime.
#[derive(Debug)]
pub struct SharedPolicy<E = HyperLogLog> {
    current: RwLock<Arc<PolicySnapshot<E>>>,
}

impl<E: CardinalityEstimate> SharedPolicy<E> {
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(PolicySnapshot::new(config))),
        }
    }

    /// Returns the snapshot to use for one request.
    pub fn load(&self) -> Arc<PolicySnapshot<E>> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }

    /// Replaces the current snapshot and returns the new one.
    ///
    /// The cached floor estimator survives only if the privacy threshold is
    /// unchanged.
    pub fn publish(&self, config: PolicyConfig) -> Arc<PolicySnapshot<E>> {
        let config = Arc::new(config);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(PolicySnapshot {
            masker: current.masker.reconfigure(Arc::clone(&config)),
            gate: RevealGate::new(config),
        });
        *current = Arc::clone(&next);
        next
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::policy::PolicySettings;

    fn config(threshold: i64, factor: f64) -> PolicyConfig {
        PolicySettings {
            privacy_threshold: threshold,
            extrapolation_factor: factor,
            ..PolicySettings::default()
        }
        .build()
        .unwrap()
    }

    #[test]
    fn snapshot_parts_share_one_config() {
        let snapshot: PolicySnapshot = PolicySnapshot::new(config(21, 1.4));
        assert!(std::ptr::eq(snapshot.masker().config(), snapshot.gate().config()));
    }

    #[test]
    fn publish_replaces_snapshot() {
        let shared: SharedPolicy = SharedPolicy::new(config(21, 1.4));
        let before = shared.load();
        shared.publish(config(50, 1.0));
        let after = shared.load();
        assert_eq!(before.config().privacy_threshold(), 21);
        assert_eq!(after.config().privacy_threshold(), 50);
        assert_eq!(after.masker().mask_scalar(1i64), 50);
    }

    #[test]
    fn publish_keeps_floor_only_for_same_threshold() {
        let shared: SharedPolicy = SharedPolicy::new(config(21, 1.4));
        shared.load().masker().floor_estimate();

        let same = shared.publish(config(21, 2.0));
        assert!(same.masker().is_floor_cached());

        let changed = shared.publish(config(30, 2.0));
        assert!(!changed.masker().is_floor_cached());
        let floor = changed.masker().floor_estimate().estimated_count();
        assert!((floor - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn readers_never_see_mixed_snapshots() {
        let shared: SharedPolicy = SharedPolicy::new(config(21, 1.4));
        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..200 {
                        let snapshot = shared.load();
                        let threshold = snapshot.config().privacy_threshold();
                        assert_eq!(snapshot.masker().mask_scalar(1i64), threshold);
                        assert!(std::ptr::eq(
                            snapshot.masker().config(),
                            snapshot.gate().config()
                        ));
                    }
                });
            }
            scope.spawn(|| {
                for threshold in 2..50 {
                    shared.publish(config(threshold, 1.4));
                }
            });
        });
    }
}

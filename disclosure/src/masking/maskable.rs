//! Traversal of values and result records for masking.
//!
//! - [`Maskable`]: a value that *is* a maskable aggregate (or a container of them)
//! - [`MaskRecord`]: a result row whose fields are masked per table policy
//!
//! `#[derive(MaskRecord)]` generates the record impl. Fields marked `#[mask]`
//! must implement `Maskable`; unmarked fields pass through unchanged.
//!
//! ## Container Implementations
//!
//! `Option`, `Vec`, `Box` and map values are walked, masking every element.
//! Map keys are never masked.

use std::{
    collections::{BTreeMap, HashMap},
    hash::{BuildHasher, Hash},
};

use super::{censor::MaskScalar, datasource::DataSourceRef, masker::PrivacyMasker, value::MetricValue};
use crate::{
    estimator::{CardinalityEstimate, HyperLogLog},
    policy::MaskingStage,
};

/// A value that can be masked by a [`PrivacyMasker`] over estimator `E`.
///
/// Scalars keep their type: `f64` fields come back as whole numbers in `f64`.
/// A custom estimator type implements `Maskable<Self>` by delegating to
/// [`PrivacyMasker::mask_cardinality`].
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be masked by a `PrivacyMasker<{E}>`",
    label = "this field type is not a maskable aggregate",
    note = "numeric primitives and the masker's estimator type are maskable",
    note = "remove `#[mask]` to pass the field through unchanged"
)]
pub trait Maskable<E: CardinalityEstimate>: Sized {
    #[must_use]
    fn mask_with(self, masker: &PrivacyMasker<E>) -> Self;
}

/// A result row whose fields are masked according to the table's policy.
///
/// Each field is masked only when
/// [`PrivacyMasker::should_mask`] holds for its metric name.
pub trait MaskRecord<E: CardinalityEstimate>: Sized {
    #[must_use]
    fn mask_fields(
        self,
        masker: &PrivacyMasker<E>,
        datasource: Option<&DataSourceRef>,
        stage: MaskingStage,
    ) -> Self;
}

macro_rules! impl_maskable_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<E: CardinalityEstimate> Maskable<E> for $ty {
                fn mask_with(self, masker: &PrivacyMasker<E>) -> Self {
                    <$ty as MaskScalar>::from_masked(masker.mask_scalar(self))
                }
            }
        )*
    };
}

impl_maskable_scalar!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl Maskable<HyperLogLog> for HyperLogLog {
    fn mask_with(self, masker: &PrivacyMasker<HyperLogLog>) -> Self {
        masker.mask_cardinality(self)
    }
}

impl<E: CardinalityEstimate, T> Maskable<E> for MetricValue<E, T> {
    fn mask_with(self, masker: &PrivacyMasker<E>) -> Self {
        masker.do_mask(self)
    }
}

impl<E, T> Maskable<E> for Option<T>
where
    E: CardinalityEstimate,
    T: Maskable<E>,
{
    fn mask_with(self, masker: &PrivacyMasker<E>) -> Self {
        self.map(|value| value.mask_with(masker))
    }
}

impl<E, T> Maskable<E> for Vec<T>
where
    E: CardinalityEstimate,
    T: Maskable<E>,
{
    fn mask_with(self, masker: &PrivacyMasker<E>) -> Self {
        self.into_iter().map(|value| value.mask_with(masker)).collect()
    }
}

impl<E, T> Maskable<E> for Box<T>
where
    E: CardinalityEstimate,
    T: Maskable<E>,
{
    fn mask_with(self, masker: &PrivacyMasker<E>) -> Self {
        Box::new((*self).mask_with(masker))
    }
}

impl<E, K, V, S> Maskable<E> for HashMap<K, V, S>
where
    E: CardinalityEstimate,
    K: Hash + Eq,
    V: Maskable<E>,
    S: BuildHasher + Clone,
{
    fn mask_with(self, masker: &PrivacyMasker<E>) -> Self {
        let hasher = self.hasher().clone();
        let mut result = HashMap::with_hasher(hasher);
        result.extend(self.into_iter().map(|(k, v)| (k, v.mask_with(masker))));
        result
    }
}

impl<E, K, V> Maskable<E> for BTreeMap<K, V>
where
    E: CardinalityEstimate,
    K: Ord,
    V: Maskable<E>,
{
    fn mask_with(self, masker: &PrivacyMasker<E>) -> Self {
        self.into_iter()
            .map(|(k, v)| (k, v.mask_with(masker)))
            .collect()
    }
}

impl<E, R> MaskRecord<E> for Vec<R>
where
    E: CardinalityEstimate,
    R: MaskRecord<E>,
{
    fn mask_fields(
        self,
        masker: &PrivacyMasker<E>,
        datasource: Option<&DataSourceRef>,
        stage: MaskingStage,
    ) -> Self {
        self.into_iter()
            .map(|row| row.mask_fields(masker, datasource, stage))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use super::{MaskRecord, Maskable};
    use crate::{
        build_synthetic, CardinalityEstimate, DataSourceRef, HyperLogLog, MaskingStage,
        PolicySettings, PrivacyMasker,
    };

    fn masker() -> PrivacyMasker {
        let config = PolicySettings {
            mask_at_query_time: true,
            extrapolation_factor: 1.4,
            privacy_threshold: 21,
            masked_field_keys: ["trips.riders".to_string()].into_iter().collect(),
            ..PolicySettings::default()
        }
        .build()
        .unwrap();
        PrivacyMasker::new(config)
    }

    #[test]
    fn scalars_keep_their_type() {
        let masker = masker();
        assert_eq!(3u8.mask_with(&masker), 21u8);
        assert_eq!(22i32.mask_with(&masker), 31i32);
        assert!((22.4f64.mask_with(&masker) - 31.0).abs() < f64::EPSILON);
    }

    #[test]
    fn estimator_is_masked_to_floor() {
        let masker = masker();
        let masked = build_synthetic::<HyperLogLog>(2).mask_with(&masker);
        assert!((masked.estimated_count() - 21.0).abs() < f64::EPSILON);
    }

    #[test]
    fn containers_mask_every_element() {
        let masker = masker();
        assert_eq!(Some(1i64).mask_with(&masker), Some(21));
        assert_eq!(None::<i64>.mask_with(&masker), None);
        assert_eq!(vec![1i64, 22].mask_with(&masker), vec![21, 31]);
        assert_eq!(*Box::new(22u32).mask_with(&masker), 31);
    }

    #[test]
    fn maps_mask_values_not_keys() {
        let masker = masker();
        let mut map: HashMap<i64, i64> = HashMap::new();
        map.insert(1, 1);
        let masked = map.mask_with(&masker);
        assert_eq!(masked[&1], 21);

        let mut tree: BTreeMap<String, u64> = BTreeMap::new();
        tree.insert("riders".to_string(), 100);
        assert_eq!(tree.mask_with(&masker)["riders"], 140);
    }

    struct Row {
        riders: i64,
    }

    impl MaskRecord<HyperLogLog> for Row {
        fn mask_fields(
            self,
            masker: &PrivacyMasker<HyperLogLog>,
            datasource: Option<&DataSourceRef>,
            stage: MaskingStage,
        ) -> Self {
            let riders = if masker.should_mask(datasource, "riders", stage) {
                self.riders.mask_with(masker)
            } else {
                self.riders
            };
            Self { riders }
        }
    }

    #[test]
    fn record_vectors_mask_each_row() {
        let masker = masker();
        let table = DataSourceRef::table("trips");
        let rows = vec![Row { riders: 1 }, Row { riders: 50 }];
        let masked = rows.mask_fields(&masker, Some(&table), MaskingStage::Query);
        assert_eq!(masked.iter().map(|row| row.riders).collect::<Vec<_>>(), [21, 70]);
    }
}

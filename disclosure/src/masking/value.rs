/// An aggregate value tagged with its kind, as handed to
/// [`super::PrivacyMasker::do_mask`].
///
/// `Other` carries anything the masker does not understand; it is returned
/// untouched.
#[derive(Clone, Debug, PartialEq)]
pub enum MetricValue<E, T> {
    Long(i64),
    Double(f64),
    Float(f32),
    Cardinality(E),
    Other(T),
}

impl<E, T> MetricValue<E, T> {
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(value) => Some(*value),
            _ => None,
        }
    }
}

impl<E, T> From<i64> for MetricValue<E, T> {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl<E, T> From<f64> for MetricValue<E, T> {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl<E, T> From<f32> for MetricValue<E, T> {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

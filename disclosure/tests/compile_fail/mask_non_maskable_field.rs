//! Test: Marking a field whose type is not a maskable aggregate.
//!
//! `SystemTime` does not implement `Maskable`. Remove `#[mask]` to pass it
//! through unchanged.

use std::time::SystemTime;

use disclosure::{MaskRecord, MaskingStage, PolicyConfig, PrivacyMasker};

#[derive(MaskRecord)]
struct Trip {
    #[mask]
    started_at: SystemTime,
}

fn main() {
    let masker: PrivacyMasker = PrivacyMasker::new(PolicyConfig::default());
    let trip = Trip {
        started_at: SystemTime::now(),
    };
    // ERROR: `SystemTime` cannot be masked by a `PrivacyMasker<HyperLogLog>`
    let _ = trip.mask_fields(&masker, None, MaskingStage::Query);
}

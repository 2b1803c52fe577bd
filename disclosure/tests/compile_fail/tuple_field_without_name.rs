//! Test: A tuple struct field marked `#[mask]` without a metric name.
//!
//! Tuple fields have no name to look up in the masked keys, so the metric
//! must be given explicitly: `#[mask(name = "riders")]`.

use disclosure::MaskRecord;

#[derive(MaskRecord)]
struct Pair(
    String,
    // ERROR: tuple struct fields need an explicit metric name
    #[mask] i64,
);

fn main() {}

//! Test: Deriving MaskRecord on a union.
//!
//! A union has no single active field to mask.

use disclosure::MaskRecord;

// ERROR: `MaskRecord` cannot be derived for unions
#[derive(MaskRecord)]
union Bits {
    riders: i64,
    distance: f64,
}

fn main() {}

//! Test: Deriving MaskRecord on an enum.
//!
//! Only structs are result rows. Derive on the struct that holds the enum.

use disclosure::MaskRecord;

// ERROR: `MaskRecord` can only be derived for structs
#[derive(MaskRecord)]
enum Reading {
    Riders(#[mask(name = "riders")] i64),
    Missing,
}

fn main() {}

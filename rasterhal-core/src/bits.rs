//! Bit-scan and power-of-two helpers used by the sprite tiler.
//!
//! All helpers are defined for every `u32`, zero included.

/// Index of the most significant set bit, 0 for 0.
#[inline]
pub(crate) fn msb(value: u32) -> u32 {
    if value == 0 {
        0
    } else {
        31 - value.leading_zeros()
    }
}

/// Largest power of two not above `value` (0 for 0).
#[inline]
pub(crate) fn prev_power_of_two(value: u32) -> u32 {
    if value == 0 {
        0
    } else {
        1 << msb(value)
    }
}

/// Smallest power of two not below `value`, saturating at `1 << 31`.
#[inline]
pub(crate) fn next_power_of_two(value: u32) -> u32 {
    if value <= 1 {
        1
    } else if value > 1 << 31 {
        1 << 31
    } else {
        value.next_power_of_two()
    }
}

//! Single-digit ticket count input.
//!
//! The ticket form shows one digit per ticket type with +/- buttons. Whatever
//! the user types or clicks is squeezed into `0..=9` here before it reaches
//! the engine.

/// Largest count the digit input can show
pub const MAX_DIGIT: u32 = 9;

/// Clamp any integer into `0..=9`
#[must_use]
pub fn clamp_digit(value: i64) -> u32 {
    u32::try_from(value.clamp(0, i64::from(MAX_DIGIT))).unwrap_or(0)
}

/// Interpret raw text typed into the digit box
///
/// Only the last character counts, so typing `3` into a box showing `2`
/// (raw text `23`) yields 3. Empty input and non-digits yield 0.
#[must_use]
pub fn parse_digit_input(input: &str) -> u32 {
    input
        .chars()
        .next_back()
        .and_then(|c| c.to_digit(10))
        .unwrap_or(0)
}

/// Whether the `+` button is enabled
#[must_use]
pub const fn can_increment(count: u32) -> bool {
    count < MAX_DIGIT
}

/// Whether the `-` button is enabled
#[must_use]
pub const fn can_decrement(count: u32) -> bool {
    count > 0
}

/// Apply a `+`/`-` step and clamp
#[must_use]
pub fn adjust(count: u32, delta: i64) -> u32 {
    clamp_digit(i64::from(count).saturating_add(delta))
}

pub mod aggregate;
pub mod distribution;
pub mod finance;
pub mod folder_tree;
pub mod report;
pub mod rubric;
pub mod scoring;

/// Nearest integer, halves rounded up.
pub(crate) fn round_nearest(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    (value + 0.5).floor() as i64
}

/// One decimal place, halves rounded up.
pub(crate) fn round_one_decimal(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 10.0 + 0.5).floor() / 10.0
}

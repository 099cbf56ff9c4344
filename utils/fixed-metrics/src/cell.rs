use std::sync::atomic::{AtomicI64, Ordering};

/// A decimal value stored as an `i64` scaled by `10^precision`.
///
/// Every write truncates toward zero, so the observable value is correct to
/// within `1 / scale` per write. Nothing here detects overflow: the scale
/// factor and `fetch_add` wrap, and `f64 -> i64` casts saturate (NaN becomes 0).
/// Scaling a whole-unit delta saturates so its sign never flips.
#[derive(Debug)]
pub(crate) struct FixedCell {
    value: AtomicI64,
    scale: i64,
    precision: u32,
}

impl FixedCell {
    pub(crate) fn new(precision: u32) -> Self {
        Self {
            value: AtomicI64::new(0),
            scale: 10i64.wrapping_pow(precision),
            precision,
        }
    }

    pub(crate) fn precision(&self) -> u32 {
        self.precision
    }

    /// Truncates `value` to a whole number first, then scales it.
    pub(crate) fn set(&self, value: f64) {
        self.value
            .store((value as i64).wrapping_mul(self.scale), Ordering::Release);
    }

    /// Scales `delta` first, then truncates it.
    pub(crate) fn add(&self, delta: f64) {
        self.value
            .fetch_add((delta * self.scale as f64) as i64, Ordering::AcqRel);
    }

    /// Adds a whole number of units without going through `f64`.
    pub(crate) fn add_whole(&self, delta: i64) {
        self.value
            .fetch_add(delta.saturating_mul(self.scale), Ordering::AcqRel);
    }

    /// Raises the stored value to at least `value` whole units.
    pub(crate) fn raise_to_whole(&self, value: i64) {
        self.value
            .fetch_max(value.saturating_mul(self.scale), Ordering::AcqRel);
    }

    pub(crate) fn get(&self) -> f64 {
        self.raw() as f64 / self.scale as f64
    }

    pub(crate) fn raw(&self) -> i64 {
        self.value.load(Ordering::Acquire)
    }
}

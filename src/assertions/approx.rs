//! Tolerant floating point comparison.

use std::cmp::Ordering;
use std::fmt;

/// A floating point value compared with a relative tolerance.
///
/// `x == Approx::new(y)` holds when
/// `|x - y| < epsilon * (scale + max(|x|, |y|))`.
#[derive(Clone, Copy)]
pub struct Approx {
    value: f64,
    epsilon: f64,
    scale: f64,
}

impl Approx {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            epsilon: f32::EPSILON as f64 * 100.0,
            scale: 1.0,
        }
    }

    /// Same tolerance, different target value.
    pub fn with_value(&self, value: f64) -> Self {
        Self { value, ..*self }
    }

    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    fn matches(&self, other: f64) -> bool {
        (other - self.value).abs()
            < self.epsilon * (self.scale + other.abs().max(self.value.abs()))
    }
}

impl fmt::Display for Approx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Approx( {} )", self.value)
    }
}

impl fmt::Debug for Approx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl PartialEq<Approx> for f64 {
    fn eq(&self, other: &Approx) -> bool {
        other.matches(*self)
    }
}

impl PartialEq<f64> for Approx {
    fn eq(&self, other: &f64) -> bool {
        self.matches(*other)
    }
}

// Ordering is "strictly beyond the tolerance band, or inside it".

impl PartialOrd<Approx> for f64 {
    fn partial_cmp(&self, other: &Approx) -> Option<Ordering> {
        if other.matches(*self) {
            Some(Ordering::Equal)
        } else {
            self.partial_cmp(&other.value)
        }
    }
}

impl PartialOrd<f64> for Approx {
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        if self.matches(*other) {
            Some(Ordering::Equal)
        } else {
            self.value.partial_cmp(other)
        }
    }
}

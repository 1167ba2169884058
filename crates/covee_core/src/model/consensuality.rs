//! Consensuality value object.
//!
//! # Responsibility
//! - Hold one agreement score in `[0, 1]` per review topic.
//!
//! # Invariants
//! - Values within `1e-8` of 0 are floored to `1e-8`; downstream consumers
//!   divide by consensuality and must never see a hard zero.
//! - `is_consensual()` means `value >= 0.8`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Smallest representable consensuality; see module invariants.
pub const CONSENSUALITY_FLOOR: f64 = 1e-8;

/// Threshold above which a topic counts as consensual.
pub const CONSENSUAL_THRESHOLD: f64 = 0.8;

pub type ConsensualityResult<T> = Result<T, ConsensualityError>;

/// Construction error for out-of-range consensuality values.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsensualityError {
    OutOfRange(f64),
}

impl Display for ConsensualityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange(value) => {
                write!(f, "consensuality must be in [0, 1], got {value}")
            }
        }
    }
}

impl Error for ConsensualityError {}

/// Unit-decimal agreement score for one review topic. 1.0 is full consensus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Consensuality(f64);

impl Consensuality {
    /// Builds a consensuality from an already-ranged value.
    ///
    /// # Errors
    /// - `OutOfRange` when the value is NaN, infinite or outside `[0, 1]`.
    pub fn new(value: f64) -> ConsensualityResult<Self> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(ConsensualityError::OutOfRange(value));
        }
        Ok(Self(value.max(CONSENSUALITY_FLOOR)))
    }

    /// Builds a consensuality from a raw computed score, clamping it into
    /// `[CONSENSUALITY_FLOOR, 1]`.
    ///
    /// The deviation normalizers can overshoot on adversarial matrices and
    /// produce values slightly below 0 or above 1; computers always construct
    /// through this clamp.
    pub fn clamped(raw: f64) -> Self {
        let value = if raw.is_nan() { CONSENSUALITY_FLOOR } else { raw };
        Self(value.clamp(CONSENSUALITY_FLOOR, 1.0))
    }

    /// Returns the inner value, guaranteed in `[CONSENSUALITY_FLOOR, 1]`.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Whether reviewers agree enough to skip a manager review.
    pub fn is_consensual(&self) -> bool {
        self.0 >= CONSENSUAL_THRESHOLD
    }
}

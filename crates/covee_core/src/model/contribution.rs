//! Contribution value object.
//!
//! # Responsibility
//! - Record one participant's share of credit for one review topic.
//!
//! # Invariants
//! - `amount` is in `[0, 1]`; over a topic all amounts sum to ~1.
//! - Contributions are never mutated after the computer creates them.

use crate::model::ids::{ReviewTopicId, RoleId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ContributionResult<T> = Result<T, ContributionError>;

/// Construction error for out-of-range contribution amounts.
#[derive(Debug, Clone, PartialEq)]
pub enum ContributionError {
    AmountOutOfRange(f64),
}

impl Display for ContributionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AmountOutOfRange(amount) => {
                write!(f, "contribution amount must be in [0, 1], got {amount}")
            }
        }
    }
}

impl Error for ContributionError {}

/// One participant's relative contribution share for one review topic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub role_id: RoleId,
    pub review_topic_id: ReviewTopicId,
    pub amount: f64,
}

impl Contribution {
    /// Builds a validated contribution share.
    ///
    /// Amounts straying from `[0, 1]` by no more than `1e-9` are treated as
    /// floating residue of the normalization and snapped back into range.
    ///
    /// # Errors
    /// - `AmountOutOfRange` when the amount is NaN, infinite or outside the
    ///   tolerated range.
    pub fn new(
        role_id: RoleId,
        review_topic_id: ReviewTopicId,
        amount: f64,
    ) -> ContributionResult<Self> {
        const TOLERANCE: f64 = 1e-9;
        if !amount.is_finite() || amount < -TOLERANCE || amount > 1.0 + TOLERANCE {
            return Err(ContributionError::AmountOutOfRange(amount));
        }
        Ok(Self {
            role_id,
            review_topic_id,
            amount: amount.clamp(0.0, 1.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Contribution, ContributionError};
    use crate::model::ids::{ReviewTopicId, RoleId};

    #[test]
    fn floating_residue_is_snapped_into_range() {
        let c = Contribution::new(RoleId::new(), ReviewTopicId::new(), -1e-12)
            .expect("tiny negative residue is tolerated");
        assert_eq!(c.amount, 0.0);
    }

    #[test]
    fn genuinely_out_of_range_amounts_fail() {
        let err = Contribution::new(RoleId::new(), ReviewTopicId::new(), 1.01)
            .expect_err("1.01 must fail");
        assert_eq!(err, ContributionError::AmountOutOfRange(1.01));
    }
}

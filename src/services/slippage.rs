use std::fmt;

use num_bigint::BigUint;
use num_traits::Zero;
use rust_decimal::Decimal;

const PERCENT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlippageError {
    OutOfRange(Decimal),
}

impl fmt::Display for SlippageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlippageError::OutOfRange(percent) => {
                write!(f, "slippage percent must be within 0..=100, got {}", percent)
            }
        }
    }
}

impl std::error::Error for SlippageError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlippageDecision {
    Accept {
        minimum_output: BigUint,
    },
    Reject {
        minimum_output: BigUint,
        reason: String,
    },
}

impl SlippageDecision {
    pub fn minimum_output(&self) -> &BigUint {
        match self {
            SlippageDecision::Accept { minimum_output }
            | SlippageDecision::Reject { minimum_output, .. } => minimum_output,
        }
    }

    pub fn is_accept(&self) -> bool {
        matches!(self, SlippageDecision::Accept { .. })
    }
}

/// `floor(estimated * (1 - slippage_percent / 100))`, computed on integers.
///
/// The percent is taken apart into mantissa and scale so the factor is an
/// exact fraction: 1.5% becomes `(1000 - 15) / 1000`.
pub fn minimum_output(
    estimated: &BigUint,
    slippage_percent: Decimal,
) -> Result<BigUint, SlippageError> {
    if slippage_percent.is_sign_negative() && !slippage_percent.is_zero() {
        return Err(SlippageError::OutOfRange(slippage_percent));
    }
    if slippage_percent > Decimal::from(PERCENT) {
        return Err(SlippageError::OutOfRange(slippage_percent));
    }

    let normalized = slippage_percent.normalize();
    let mantissa = BigUint::from(normalized.mantissa().unsigned_abs());
    let denominator = BigUint::from(10u32).pow(normalized.scale()) * BigUint::from(PERCENT);
    let kept = &denominator - mantissa;

    Ok((estimated * kept) / denominator)
}

/// Pre-check run before anything is submitted.
///
/// Rejects routes whose floor would protect nothing, and routes whose
/// reported price impact already exceeds the tolerance.
pub fn check_slippage(
    estimated: &BigUint,
    slippage_percent: Decimal,
    price_impact_percent: Option<Decimal>,
) -> Result<SlippageDecision, SlippageError> {
    let minimum = minimum_output(estimated, slippage_percent)?;

    if estimated.is_zero() {
        return Ok(SlippageDecision::Reject {
            minimum_output: minimum,
            reason: "route estimates zero output".to_string(),
        });
    }
    if minimum.is_zero() {
        return Ok(SlippageDecision::Reject {
            minimum_output: minimum,
            reason: format!(
                "minimum output rounds to zero at {}% slippage",
                slippage_percent
            ),
        });
    }
    if let Some(impact) = price_impact_percent {
        if impact.abs() > slippage_percent {
            return Ok(SlippageDecision::Reject {
                minimum_output: minimum,
                reason: format!(
                    "price impact {}% exceeds slippage tolerance {}%",
                    impact, slippage_percent
                ),
            });
        }
    }

    Ok(SlippageDecision::Accept {
        minimum_output: minimum,
    })
}

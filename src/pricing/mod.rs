//! Pricing core: per-line source resolution, line arithmetic and document
//! aggregation. Everything here is pure or read-only; persistence is the
//! service layer's job.

pub mod line;
pub mod source;
pub mod totals;

use rust_decimal::{Decimal, RoundingStrategy};

/// Monetary rounding: 2 decimal places, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Percentage rounding: 2 decimal places, half away from zero.
pub fn round_percentage(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn money_rounds_half_up() {
        assert_eq!(round_money(dec!(1.005)), dec!(1.01));
        assert_eq!(round_money(dec!(1.004)), dec!(1.00));
        assert_eq!(round_money(dec!(2.675)), dec!(2.68));
    }
}

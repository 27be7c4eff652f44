//! Line-item arithmetic.
//!
//! All monetary outputs are rounded to 2 decimal places half-up; percentage
//! fields likewise. A unit cost of zero is legal (supplier lines before a
//! purchase price is recorded) and yields a zero margin percentage.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{round_money, round_percentage};
use crate::errors::ServiceError;

/// Inputs for one line computation.
#[derive(Debug, Clone, Copy)]
pub struct LineInput {
    pub unit_price: Decimal,
    pub quantity: i32,
    /// Absolute discount amount over the whole line
    pub discount: Decimal,
    pub unit_cost: Decimal,
    /// Tax rate as a decimal fraction (0.18 = Peru IGV)
    pub tax_rate: Decimal,
}

/// Computed monetary figures for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTotals {
    pub subtotal: Decimal,
    pub discount_percentage: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub total_cost: Decimal,
    pub unit_margin: Decimal,
    pub total_margin: Decimal,
    pub margin_percentage: Decimal,
}

/// Computes subtotal, tax, margin and totals for one quotation line.
pub fn compute_line(input: LineInput) -> Result<LineTotals, ServiceError> {
    if input.quantity < 1 {
        return Err(ServiceError::ValidationError(
            "quantity must be at least 1".to_string(),
        ));
    }
    if input.unit_price < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "unit price cannot be negative".to_string(),
        ));
    }
    if input.discount < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "discount cannot be negative".to_string(),
        ));
    }
    if input.unit_cost < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "unit cost cannot be negative".to_string(),
        ));
    }

    let quantity = Decimal::from(input.quantity);
    let gross = input.unit_price * quantity;
    let subtotal = round_money(gross - input.discount);
    if subtotal < Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "discount {} exceeds line amount {}",
            input.discount, gross
        )));
    }

    let discount_percentage = if gross > Decimal::ZERO {
        round_percentage(input.discount / gross * Decimal::ONE_HUNDRED)
    } else {
        Decimal::ZERO
    };

    let tax_amount = round_money(subtotal * input.tax_rate);
    let total = round_money(subtotal + tax_amount);

    let total_cost = round_money(input.unit_cost * quantity);
    let unit_margin = round_money(input.unit_price - input.unit_cost);
    let total_margin = round_money(subtotal - total_cost);
    let margin_percentage = if input.unit_cost > Decimal::ZERO {
        round_percentage(unit_margin / input.unit_cost * Decimal::ONE_HUNDRED)
    } else {
        Decimal::ZERO
    };

    Ok(LineTotals {
        subtotal,
        discount_percentage,
        tax_amount,
        total,
        total_cost,
        unit_margin,
        total_margin,
        margin_percentage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn input(unit_price: Decimal, quantity: i32, discount: Decimal, unit_cost: Decimal) -> LineInput {
        LineInput {
            unit_price,
            quantity,
            discount,
            unit_cost,
            tax_rate: dec!(0.18),
        }
    }

    #[test]
    fn line_totals_identity() {
        let totals = compute_line(input(dec!(120.00), 3, dec!(10.00), dec!(80.00))).unwrap();

        assert_eq!(totals.subtotal, dec!(350.00));
        assert_eq!(totals.tax_amount, dec!(63.00));
        assert_eq!(totals.total, dec!(413.00));
        assert_eq!(totals.total, totals.subtotal + totals.tax_amount);
        assert_eq!(totals.total_cost, dec!(240.00));
        assert_eq!(totals.total_margin, totals.subtotal - totals.total_cost);
    }

    #[rstest]
    #[case(dec!(520.00), dec!(500.00), dec!(4.00))]
    #[case(dec!(550.00), dec!(500.00), dec!(10.00))]
    #[case(dec!(600.00), dec!(500.00), dec!(20.00))]
    #[case(dec!(500.00), dec!(500.00), dec!(0.00))]
    fn margin_percentage_uses_unit_cost_basis(
        #[case] unit_price: Decimal,
        #[case] unit_cost: Decimal,
        #[case] expected: Decimal,
    ) {
        let totals = compute_line(input(unit_price, 1, Decimal::ZERO, unit_cost)).unwrap();
        assert_eq!(totals.margin_percentage, expected);
    }

    #[test]
    fn zero_cost_line_has_zero_margin_percentage() {
        let totals = compute_line(input(dec!(99.90), 2, Decimal::ZERO, Decimal::ZERO)).unwrap();
        assert_eq!(totals.margin_percentage, Decimal::ZERO);
        assert_eq!(totals.total_margin, totals.subtotal);
    }

    #[test]
    fn discount_percentage_is_derived() {
        let totals = compute_line(input(dec!(50.00), 4, dec!(20.00), dec!(30.00))).unwrap();
        // 20 / 200 = 10%
        assert_eq!(totals.discount_percentage, dec!(10.00));
    }

    #[rstest]
    #[case(dec!(10.00), 2, dec!(25.00))] // discount larger than the line
    #[case(dec!(10.00), 0, dec!(0.00))] // quantity below one
    #[case(dec!(10.00), 1, dec!(-1.00))] // negative discount
    fn invalid_inputs_are_rejected(
        #[case] unit_price: Decimal,
        #[case] quantity: i32,
        #[case] discount: Decimal,
    ) {
        let err = compute_line(input(unit_price, quantity, discount, dec!(5.00))).unwrap_err();
        assert_matches::assert_matches!(err, ServiceError::ValidationError(_));
    }

    #[test]
    fn tax_rounds_half_up_to_cents() {
        // 33.33 * 0.18 = 5.9994 -> 6.00
        let totals = compute_line(LineInput {
            unit_price: dec!(33.33),
            quantity: 1,
            discount: Decimal::ZERO,
            unit_cost: dec!(20.00),
            tax_rate: dec!(0.18),
        })
        .unwrap();
        assert_eq!(totals.tax_amount, dec!(6.00));
        assert_eq!(totals.total, dec!(39.33));
    }
}

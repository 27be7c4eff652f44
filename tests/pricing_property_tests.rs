//! Property-based tests for the pricing arithmetic.
//!
//! These verify the monetary identities hold across a wide range of inputs,
//! catching rounding edge cases unit tests would miss.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use cotizador_api::pricing::line::{compute_line, LineInput};
use cotizador_api::pricing::totals::{
    aggregate, CommissionBasis, CommissionSettings, DocumentCharges, LineFigures,
};

/// Money amounts as cents so every generated value is exactly representable.
fn money_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn small_money_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..100_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn quantity_strategy() -> impl Strategy<Value = i32> {
    1i32..1_000
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn line_total_identity_holds(
        unit_price in money_strategy(),
        quantity in quantity_strategy(),
        unit_cost in money_strategy(),
    ) {
        let totals = compute_line(LineInput {
            unit_price,
            quantity,
            discount: Decimal::ZERO,
            unit_cost,
            tax_rate: Decimal::new(18, 2),
        })
        .unwrap();

        prop_assert_eq!(totals.subtotal, unit_price * Decimal::from(quantity));
        prop_assert_eq!(totals.total, totals.subtotal + totals.tax_amount);
        prop_assert_eq!(totals.total_margin, totals.subtotal - totals.total_cost);
    }

    #[test]
    fn discounted_line_never_goes_negative(
        unit_price in money_strategy(),
        quantity in quantity_strategy(),
        discount_fraction in 0u32..=100,
    ) {
        let gross = unit_price * Decimal::from(quantity);
        let discount = gross * Decimal::from(discount_fraction) / Decimal::ONE_HUNDRED;

        let totals = compute_line(LineInput {
            unit_price,
            quantity,
            discount,
            unit_cost: Decimal::ZERO,
            tax_rate: Decimal::new(18, 2),
        })
        .unwrap();

        prop_assert!(totals.subtotal >= Decimal::ZERO);
        prop_assert!(totals.discount_percentage >= Decimal::ZERO);
        prop_assert!(totals.discount_percentage <= Decimal::ONE_HUNDRED);
    }

    #[test]
    fn document_total_identity_holds(
        subtotals in prop::collection::vec((small_money_strategy(), small_money_strategy()), 1..8),
        discount in small_money_strategy(),
        shipping in small_money_strategy(),
        packaging in small_money_strategy(),
        assembly in small_money_strategy(),
        coupon in small_money_strategy(),
    ) {
        let lines: Vec<LineFigures> = subtotals
            .iter()
            .map(|(subtotal, cost)| {
                let totals = compute_line(LineInput {
                    unit_price: *subtotal,
                    quantity: 1,
                    discount: Decimal::ZERO,
                    unit_cost: *cost,
                    tax_rate: Decimal::new(18, 2),
                })
                .unwrap();
                LineFigures::from_totals(None, Uuid::new_v4(), Uuid::new_v4(), &totals)
            })
            .collect();

        let charges = DocumentCharges {
            discount,
            shipping_cost: shipping,
            packaging_cost: packaging,
            assembly_cost: assembly,
        };
        let commission = CommissionSettings {
            basis: CommissionBasis::Margin,
            percentage: Decimal::new(500, 2),
        };

        let totals = aggregate(&lines, &charges, coupon, &commission).unwrap();

        // total == subtotal - discount - coupon_discount + tax + charges, to a cent
        let expected = totals.subtotal - totals.discount - totals.coupon_discount
            + totals.tax
            + totals.shipping_cost
            + totals.packaging_cost
            + totals.assembly_cost;
        let delta = (totals.total - expected).abs();
        prop_assert!(delta <= Decimal::new(1, 2), "delta {} too large", delta);

        // the coupon can never discount more than the goods are worth
        prop_assert!(totals.coupon_discount <= totals.subtotal);
    }

    #[test]
    fn commission_is_proportional_to_its_basis(
        subtotal in small_money_strategy(),
        cost in small_money_strategy(),
        percentage in 0u32..=50,
    ) {
        let line = compute_line(LineInput {
            unit_price: subtotal,
            quantity: 1,
            discount: Decimal::ZERO,
            unit_cost: cost,
            tax_rate: Decimal::new(18, 2),
        })
        .unwrap();
        let figures = [LineFigures::from_totals(
            None,
            Uuid::new_v4(),
            Uuid::new_v4(),
            &line,
        )];

        let commission = CommissionSettings {
            basis: CommissionBasis::Subtotal,
            percentage: Decimal::from(percentage),
        };
        let totals = aggregate(
            &figures,
            &DocumentCharges::default(),
            Decimal::ZERO,
            &commission,
        )
        .unwrap();

        let expected = totals.subtotal * Decimal::from(percentage) / Decimal::ONE_HUNDRED;
        let delta = (totals.commission_amount - expected).abs();
        prop_assert!(delta <= Decimal::new(1, 2));
    }
}

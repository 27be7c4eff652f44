//! Document-level aggregation: line sums, document charges, coupon discount,
//! commission, and margin-floor enforcement.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::line::LineTotals;
use super::{round_money, round_percentage};
use crate::entities::quotation_detail;
use crate::errors::{MarginViolation, ServiceError};

/// Monetary figure a seller's commission percentage is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionBasis {
    #[default]
    Margin,
    Subtotal,
    Total,
}

impl FromStr for CommissionBasis {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "margin" => Ok(Self::Margin),
            "subtotal" => Ok(Self::Subtotal),
            "total" => Ok(Self::Total),
            other => Err(ServiceError::ConfigurationError(format!(
                "unknown commission basis '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CommissionSettings {
    pub basis: CommissionBasis,
    pub percentage: Decimal,
}

/// The per-line figures document aggregation needs.
#[derive(Debug, Clone, Copy)]
pub struct LineFigures {
    /// Absent for preview lines that were never persisted
    pub line_id: Option<Uuid>,
    pub product_id: Uuid,
    pub category_id: Uuid,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_cost: Decimal,
    pub total_margin: Decimal,
    pub margin_percentage: Decimal,
}

impl LineFigures {
    pub fn from_detail(detail: &quotation_detail::Model) -> Self {
        Self {
            line_id: Some(detail.id),
            product_id: detail.product_id,
            category_id: detail.category_id,
            subtotal: detail.subtotal,
            tax_amount: detail.tax_amount,
            total_cost: detail.total_cost,
            total_margin: detail.total_margin,
            margin_percentage: detail.margin_percentage,
        }
    }

    pub fn from_totals(
        line_id: Option<Uuid>,
        product_id: Uuid,
        category_id: Uuid,
        totals: &LineTotals,
    ) -> Self {
        Self {
            line_id,
            product_id,
            category_id,
            subtotal: totals.subtotal,
            tax_amount: totals.tax_amount,
            total_cost: totals.total_cost,
            total_margin: totals.total_margin,
            margin_percentage: totals.margin_percentage,
        }
    }
}

/// Document-level charges entered by the seller.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DocumentCharges {
    /// Manual document discount amount
    pub discount: Decimal,
    pub shipping_cost: Decimal,
    pub packaging_cost: Decimal,
    pub assembly_cost: Decimal,
}

impl DocumentCharges {
    fn validate(&self) -> Result<(), ServiceError> {
        for (name, value) in [
            ("discount", self.discount),
            ("shipping_cost", self.shipping_cost),
            ("packaging_cost", self.packaging_cost),
            ("assembly_cost", self.assembly_cost),
        ] {
            if value < Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "{name} cannot be negative"
                )));
            }
        }
        Ok(())
    }
}

/// Aggregated document figures ready to persist onto the quotation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub coupon_discount: Decimal,
    pub tax: Decimal,
    pub shipping_cost: Decimal,
    pub packaging_cost: Decimal,
    pub assembly_cost: Decimal,
    pub total: Decimal,
    pub total_cost: Decimal,
    pub total_margin: Decimal,
    pub margin_percentage: Decimal,
    pub commission_amount: Decimal,
}

/// Aggregates line figures plus document charges into document totals.
///
/// `coupon_discount` is whatever the coupon collaborator computed for the
/// document subtotal; it is clamped so it can never exceed the subtotal.
/// Discounts reduce margin, not cost.
pub fn aggregate(
    lines: &[LineFigures],
    charges: &DocumentCharges,
    coupon_discount: Decimal,
    commission: &CommissionSettings,
) -> Result<DocumentTotals, ServiceError> {
    charges.validate()?;
    if coupon_discount < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "coupon discount cannot be negative".to_string(),
        ));
    }

    let subtotal: Decimal = lines.iter().map(|l| l.subtotal).sum();
    let tax: Decimal = lines.iter().map(|l| l.tax_amount).sum();
    let total_cost: Decimal = lines.iter().map(|l| l.total_cost).sum();
    let margin_pre_discount: Decimal = lines.iter().map(|l| l.total_margin).sum();

    let coupon_discount = coupon_discount.min(subtotal);

    let total = round_money(
        subtotal - charges.discount - coupon_discount
            + tax
            + charges.shipping_cost
            + charges.packaging_cost
            + charges.assembly_cost,
    );
    let total_margin = round_money(margin_pre_discount - charges.discount - coupon_discount);
    let margin_percentage = if total_cost > Decimal::ZERO {
        round_percentage(total_margin / total_cost * Decimal::ONE_HUNDRED)
    } else {
        Decimal::ZERO
    };

    let basis_value = match commission.basis {
        CommissionBasis::Margin => total_margin,
        CommissionBasis::Subtotal => subtotal,
        CommissionBasis::Total => total,
    };
    let commission_amount =
        round_money(basis_value * commission.percentage / Decimal::ONE_HUNDRED);

    Ok(DocumentTotals {
        subtotal: round_money(subtotal),
        discount: round_money(charges.discount),
        coupon_discount: round_money(coupon_discount),
        tax: round_money(tax),
        shipping_cost: round_money(charges.shipping_cost),
        packaging_cost: round_money(charges.packaging_cost),
        assembly_cost: round_money(charges.assembly_cost),
        total,
        total_cost: round_money(total_cost),
        total_margin,
        margin_percentage,
        commission_amount,
    })
}

/// Floor applied to the document margin: the single category's floor when all
/// lines share one category, otherwise the configured global minimum.
pub fn document_floor(line_floors: &[(Uuid, Decimal)], global_min: Decimal) -> Decimal {
    let mut categories = line_floors.iter().map(|(category, _)| *category);
    match categories.next() {
        None => global_min,
        Some(first) => {
            if categories.all(|c| c == first) {
                line_floors[0].1
            } else {
                global_min
            }
        }
    }
}

/// Checks every line's margin against its category floor and the document
/// margin against the document floor. All violations are reported together so
/// the caller gets one precise error instead of fixing lines one at a time.
pub fn enforce_margin_floors(
    lines: &[(LineFigures, Decimal)],
    document_margin: Decimal,
    document_floor: Decimal,
) -> Result<(), ServiceError> {
    let mut violations: Vec<MarginViolation> = lines
        .iter()
        .filter(|(figures, floor)| figures.margin_percentage < *floor)
        .map(|(figures, floor)| MarginViolation {
            line_id: figures.line_id,
            product_id: Some(figures.product_id),
            computed: figures.margin_percentage,
            required: *floor,
        })
        .collect();

    if !lines.is_empty() && document_margin < document_floor {
        violations.push(MarginViolation {
            line_id: None,
            product_id: None,
            computed: document_margin,
            required: document_floor,
        });
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::MarginBelowMinimum { violations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn commission() -> CommissionSettings {
        CommissionSettings {
            basis: CommissionBasis::Margin,
            percentage: dec!(5.00),
        }
    }

    fn figures(subtotal: Decimal, tax: Decimal, cost: Decimal) -> LineFigures {
        let margin = subtotal - cost;
        LineFigures {
            line_id: Some(Uuid::new_v4()),
            product_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            subtotal,
            tax_amount: tax,
            total_cost: cost,
            total_margin: margin,
            margin_percentage: if cost > Decimal::ZERO {
                round_percentage(margin / cost * Decimal::ONE_HUNDRED)
            } else {
                Decimal::ZERO
            },
        }
    }

    #[test]
    fn document_total_identity() {
        let lines = vec![
            figures(dec!(350.00), dec!(63.00), dec!(240.00)),
            figures(dec!(100.00), dec!(18.00), dec!(70.00)),
        ];
        let charges = DocumentCharges {
            discount: dec!(20.00),
            shipping_cost: dec!(15.00),
            packaging_cost: dec!(5.00),
            assembly_cost: dec!(10.00),
        };

        let totals = aggregate(&lines, &charges, dec!(30.00), &commission()).unwrap();

        assert_eq!(totals.subtotal, dec!(450.00));
        assert_eq!(totals.tax, dec!(81.00));
        assert_eq!(
            totals.total,
            totals.subtotal - totals.discount - totals.coupon_discount
                + totals.tax
                + totals.shipping_cost
                + totals.packaging_cost
                + totals.assembly_cost
        );
        // discounts reduce margin, not cost
        assert_eq!(totals.total_margin, dec!(140.00) - dec!(20.00) - dec!(30.00));
    }

    #[test]
    fn coupon_discount_is_clamped_to_subtotal() {
        let lines = vec![figures(dec!(50.00), dec!(9.00), dec!(30.00))];
        let totals = aggregate(
            &lines,
            &DocumentCharges::default(),
            dec!(500.00),
            &commission(),
        )
        .unwrap();

        assert_eq!(totals.coupon_discount, dec!(50.00));
    }

    #[test]
    fn commission_follows_configured_basis() {
        let lines = vec![figures(dec!(200.00), dec!(36.00), dec!(100.00))];
        let charges = DocumentCharges::default();

        let on_margin = aggregate(
            &lines,
            &charges,
            Decimal::ZERO,
            &CommissionSettings {
                basis: CommissionBasis::Margin,
                percentage: dec!(10.00),
            },
        )
        .unwrap();
        assert_eq!(on_margin.commission_amount, dec!(10.00));

        let on_subtotal = aggregate(
            &lines,
            &charges,
            Decimal::ZERO,
            &CommissionSettings {
                basis: CommissionBasis::Subtotal,
                percentage: dec!(10.00),
            },
        )
        .unwrap();
        assert_eq!(on_subtotal.commission_amount, dec!(20.00));

        let on_total = aggregate(
            &lines,
            &charges,
            Decimal::ZERO,
            &CommissionSettings {
                basis: CommissionBasis::Total,
                percentage: dec!(10.00),
            },
        )
        .unwrap();
        assert_eq!(on_total.commission_amount, dec!(23.60));
    }

    #[test]
    fn zero_cost_document_has_zero_margin_percentage() {
        let lines = vec![figures(dec!(100.00), dec!(18.00), Decimal::ZERO)];
        let totals =
            aggregate(&lines, &DocumentCharges::default(), Decimal::ZERO, &commission()).unwrap();
        assert_eq!(totals.margin_percentage, Decimal::ZERO);
    }

    #[test]
    fn negative_charges_are_rejected() {
        let charges = DocumentCharges {
            discount: dec!(-1.00),
            ..Default::default()
        };
        let err = aggregate(&[], &charges, Decimal::ZERO, &commission()).unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn line_below_floor_is_reported_with_required_value() {
        let low = figures(dec!(520.00), dec!(93.60), dec!(500.00)); // 4% margin
        let err = enforce_margin_floors(&[(low, dec!(10.00))], dec!(4.00), dec!(10.00))
            .unwrap_err();

        match err {
            ServiceError::MarginBelowMinimum { violations } => {
                // line violation plus the document-level one
                assert_eq!(violations.len(), 2);
                assert_eq!(violations[0].computed, dec!(4.00));
                assert_eq!(violations[0].required, dec!(10.00));
                assert!(violations[0].product_id.is_some());
                assert!(violations[1].product_id.is_none());
            }
            other => panic!("expected MarginBelowMinimum, got {other:?}"),
        }
    }

    #[test]
    fn margin_exactly_at_floor_is_accepted() {
        let at_floor = figures(dec!(550.00), dec!(99.00), dec!(500.00)); // 10% margin
        assert!(enforce_margin_floors(&[(at_floor, dec!(10.00))], dec!(10.00), dec!(10.00)).is_ok());
    }

    #[test]
    fn single_category_documents_use_that_floor() {
        let category = Uuid::new_v4();
        let floors = vec![(category, dec!(15.00)), (category, dec!(15.00))];
        assert_eq!(document_floor(&floors, dec!(10.00)), dec!(15.00));
    }

    #[test]
    fn mixed_category_documents_use_the_global_minimum() {
        let floors = vec![(Uuid::new_v4(), dec!(15.00)), (Uuid::new_v4(), dec!(25.00))];
        assert_eq!(document_floor(&floors, dec!(10.00)), dec!(10.00));
    }

    #[test]
    fn empty_documents_have_no_floor_violations() {
        assert!(enforce_margin_floors(&[], Decimal::ZERO, dec!(10.00)).is_ok());
    }
}

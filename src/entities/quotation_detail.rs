use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One quotation line.
///
/// Product fields (name, sku, brand, category) are snapshots taken when the
/// line was added; pricing columns are the resolver output at that instant.
/// Exactly one of `warehouse_id` / `supplier_id`+`supplier_product_id` must be
/// set, matching `source_type`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quotation_details")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub quotation_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_sku: String,
    #[sea_orm(nullable)]
    pub product_brand: Option<String>,
    /// Category snapshot for margin-floor checks on later recomputes
    pub category_id: Uuid,
    pub quantity: i32,
    /// Unit cost basis at resolution time
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub purchase_price: Decimal,
    /// Optional intermediate (distribution) cost
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub distribution_price: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub unit_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub discount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub discount_percentage: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub tax_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub unit_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub unit_margin: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_margin: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub margin_percentage: Decimal,
    pub source_type: LineSourceType,
    #[sea_orm(nullable)]
    pub warehouse_id: Option<Uuid>,
    #[sea_orm(nullable)]
    pub supplier_id: Option<Uuid>,
    #[sea_orm(nullable)]
    pub supplier_product_id: Option<Uuid>,
    /// True once a purchase request was flagged for out-of-stock supplier lines
    pub is_requested_from_supplier: bool,
    pub in_stock: bool,
    /// Source stock level at resolution time
    pub available_stock: i32,
    pub created_at: DateTimeUtc,
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::quotation::Entity",
        from = "Column::QuotationId",
        to = "super::quotation::Column::Id"
    )]
    Quotation,
}

impl Related<super::quotation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quotation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Where a quotation line is fulfilled from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum LineSourceType {
    #[sea_orm(string_value = "warehouse")]
    Warehouse,
    #[sea_orm(string_value = "supplier")]
    Supplier,
}

impl Model {
    /// Checks the source-reference invariant: exactly one reference set,
    /// matching the tag.
    pub fn has_consistent_source(&self) -> bool {
        match self.source_type {
            LineSourceType::Warehouse => {
                self.warehouse_id.is_some()
                    && self.supplier_id.is_none()
                    && self.supplier_product_id.is_none()
            }
            LineSourceType::Supplier => {
                self.warehouse_id.is_none()
                    && self.supplier_id.is_some()
                    && self.supplier_product_id.is_some()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn warehouse_line() -> Model {
        Model {
            id: Uuid::new_v4(),
            quotation_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            product_name: "Cemento Sol 42.5kg".to_string(),
            product_sku: "CEM-SOL-425".to_string(),
            product_brand: None,
            category_id: Uuid::new_v4(),
            quantity: 10,
            purchase_price: dec!(24.50),
            distribution_price: None,
            unit_price: dec!(31.90),
            discount: Decimal::ZERO,
            discount_percentage: Decimal::ZERO,
            subtotal: dec!(319.00),
            tax_amount: dec!(57.42),
            total: dec!(376.42),
            unit_cost: dec!(24.50),
            total_cost: dec!(245.00),
            unit_margin: dec!(7.40),
            total_margin: dec!(74.00),
            margin_percentage: dec!(30.20),
            source_type: LineSourceType::Warehouse,
            warehouse_id: Some(Uuid::new_v4()),
            supplier_id: None,
            supplier_product_id: None,
            is_requested_from_supplier: false,
            in_stock: true,
            available_stock: 120,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn warehouse_line_with_only_warehouse_reference_is_consistent() {
        assert!(warehouse_line().has_consistent_source());
    }

    #[test]
    fn warehouse_line_with_supplier_reference_is_inconsistent() {
        let mut line = warehouse_line();
        line.supplier_id = Some(Uuid::new_v4());
        assert!(!line.has_consistent_source());
    }

    #[test]
    fn supplier_line_requires_both_supplier_references() {
        let mut line = warehouse_line();
        line.source_type = LineSourceType::Supplier;
        line.warehouse_id = None;
        line.supplier_id = Some(Uuid::new_v4());
        // missing supplier_product_id
        assert!(!line.has_consistent_source());

        line.supplier_product_id = Some(Uuid::new_v4());
        assert!(line.has_consistent_source());
    }
}

//! sea-orm adapters for the collaborator interfaces.
//!
//! The read models here (inventory rows, price-list entries, supplier offers,
//! coupons, sales) belong to neighboring subsystems; the quotation engine only
//! queries them, so the entities are private to this module and intentionally
//! minimal. Coupon usage accounting is the single write, performed as one
//! guarded UPDATE.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set,
};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    CategoryNode, CategoryStore, CouponService, InventoryStore, PriceEntry, SaleFactory, SaleRef,
    StockLevel, SupplierCatalog, SupplierOffer,
};
use crate::entities::{category, quotation, quotation_detail};
use crate::errors::ServiceError;

/// Warehouse inventory row (owned by the inventory subsystem).
pub mod warehouse_inventory {
    use rust_decimal::Decimal;
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "warehouse_inventory")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub product_id: Uuid,
        pub warehouse_id: Uuid,
        pub available_stock: i32,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
        pub average_cost: Decimal,
        pub is_active: bool,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Price-list entry (owned by the catalog subsystem).
pub mod price_list_entry {
    use rust_decimal::Decimal;
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "price_list_entries")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub price_list_id: Uuid,
        pub product_id: Uuid,
        /// Null means the entry applies to every warehouse
        #[sea_orm(nullable)]
        pub warehouse_id: Option<Uuid>,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
        pub price: Decimal,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
        pub min_price: Option<Decimal>,
        pub min_quantity: i32,
        pub is_active: bool,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Supplier offer for a product (owned by the purchasing subsystem).
pub mod supplier_product {
    use rust_decimal::Decimal;
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "supplier_products")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub supplier_id: Uuid,
        pub product_id: Uuid,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
        pub purchase_price: Decimal,
        pub available_stock: i32,
        pub priority: i32,
        pub is_active: bool,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Discount coupon (owned by the promotions subsystem).
pub mod coupon {
    use rust_decimal::Decimal;
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "coupons")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        #[sea_orm(unique)]
        pub code: String,
        pub discount_type: CouponDiscountType,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
        pub discount_value: Decimal,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
        pub min_order_amount: Option<Decimal>,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
        pub max_discount_amount: Option<Decimal>,
        #[sea_orm(nullable)]
        pub usage_limit: Option<i32>,
        pub usage_count: i32,
        pub valid_from: DateTimeUtc,
        pub valid_until: DateTimeUtc,
        pub is_active: bool,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    #[derive(
        Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, serde::Serialize,
        serde::Deserialize,
    )]
    #[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
    #[serde(rename_all = "snake_case")]
    pub enum CouponDiscountType {
        #[sea_orm(string_value = "percentage")]
        Percentage,
        #[sea_orm(string_value = "fixed_amount")]
        FixedAmount,
    }
}

/// Sale header written at conversion time (owned by the sales subsystem).
pub mod sale {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "sales")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        #[sea_orm(unique)]
        pub code: String,
        pub quotation_id: Uuid,
        pub seller_id: Uuid,
        pub customer_id: Uuid,
        pub customer_name: String,
        pub customer_document: String,
        pub warehouse_id: Uuid,
        pub currency: String,
        #[sea_orm(column_type = "Decimal(Some((10, 4)))")]
        pub exchange_rate: Decimal,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
        pub subtotal: Decimal,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
        pub discount: Decimal,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
        pub tax: Decimal,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
        pub total: Decimal,
        pub sale_date: NaiveDate,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Sale line mirrored from a quotation line.
pub mod sale_item {
    use rust_decimal::Decimal;
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "sale_items")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub sale_id: Uuid,
        pub product_id: Uuid,
        pub product_name: String,
        pub product_sku: String,
        pub quantity: i32,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
        pub unit_price: Decimal,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
        pub discount: Decimal,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
        pub subtotal: Decimal,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
        pub tax_amount: Decimal,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
        pub total: Decimal,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Clone)]
pub struct DbCategoryStore {
    db: Arc<DatabaseConnection>,
}

impl DbCategoryStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CategoryStore for DbCategoryStore {
    async fn get_category(&self, id: Uuid) -> Result<Option<CategoryNode>, ServiceError> {
        let found = category::Entity::find_by_id(id)
            .filter(category::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?;

        Ok(found.map(|model| CategoryNode {
            id: model.id,
            parent_id: model.parent_id,
            min_margin_percentage: model.min_margin_percentage,
            normal_margin_percentage: model.normal_margin_percentage,
        }))
    }
}

#[derive(Clone)]
pub struct DbInventoryStore {
    db: Arc<DatabaseConnection>,
}

impl DbInventoryStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl InventoryStore for DbInventoryStore {
    async fn get_stock(
        &self,
        product_id: Uuid,
        warehouse_id: Uuid,
    ) -> Result<Option<StockLevel>, ServiceError> {
        let row = warehouse_inventory::Entity::find()
            .filter(warehouse_inventory::Column::ProductId.eq(product_id))
            .filter(warehouse_inventory::Column::WarehouseId.eq(warehouse_id))
            .filter(warehouse_inventory::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?;

        Ok(row.map(|model| StockLevel {
            available_stock: model.available_stock,
            average_cost: model.average_cost,
        }))
    }

    async fn get_active_prices(
        &self,
        product_id: Uuid,
        price_list_id: Uuid,
        warehouse_id: Uuid,
    ) -> Result<Vec<PriceEntry>, ServiceError> {
        let rows = price_list_entry::Entity::find()
            .filter(price_list_entry::Column::ProductId.eq(product_id))
            .filter(price_list_entry::Column::PriceListId.eq(price_list_id))
            .filter(price_list_entry::Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(price_list_entry::Column::WarehouseId.is_null())
                    .add(price_list_entry::Column::WarehouseId.eq(warehouse_id)),
            )
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|model| PriceEntry {
                price: model.price,
                min_price: model.min_price,
                min_quantity: model.min_quantity,
                warehouse_id: model.warehouse_id,
            })
            .collect())
    }
}

#[derive(Clone)]
pub struct DbSupplierCatalog {
    db: Arc<DatabaseConnection>,
}

impl DbSupplierCatalog {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SupplierCatalog for DbSupplierCatalog {
    async fn list_offers(&self, product_id: Uuid) -> Result<Vec<SupplierOffer>, ServiceError> {
        let rows = supplier_product::Entity::find()
            .filter(supplier_product::Column::ProductId.eq(product_id))
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|model| SupplierOffer {
                supplier_id: model.supplier_id,
                supplier_product_id: model.id,
                purchase_price: model.purchase_price,
                available_stock: model.available_stock,
                priority: model.priority,
                is_active: model.is_active,
            })
            .collect())
    }
}

#[derive(Clone)]
pub struct DbCouponService {
    db: Arc<DatabaseConnection>,
}

impl DbCouponService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CouponService for DbCouponService {
    async fn calculate_discount(
        &self,
        coupon_id: Uuid,
        amount: Decimal,
    ) -> Result<Decimal, ServiceError> {
        let now = Utc::now();
        let Some(coupon) = coupon::Entity::find_by_id(coupon_id).one(&*self.db).await? else {
            return Err(ServiceError::NotFound(format!(
                "Coupon {} not found",
                coupon_id
            )));
        };

        if !coupon.is_active || coupon.valid_from > now || coupon.valid_until < now {
            debug!(%coupon_id, "coupon outside validity window");
            return Ok(Decimal::ZERO);
        }
        if let Some(limit) = coupon.usage_limit {
            if coupon.usage_count >= limit {
                warn!(%coupon_id, "coupon has reached its usage limit");
                return Ok(Decimal::ZERO);
            }
        }
        if let Some(min_amount) = coupon.min_order_amount {
            if amount < min_amount {
                debug!(%coupon_id, %amount, %min_amount, "amount below coupon minimum");
                return Ok(Decimal::ZERO);
            }
        }

        let discount = match coupon.discount_type {
            coupon::CouponDiscountType::Percentage => {
                amount * coupon.discount_value / Decimal::ONE_HUNDRED
            }
            coupon::CouponDiscountType::FixedAmount => coupon.discount_value,
        };

        let capped = match coupon.max_discount_amount {
            Some(max) => discount.min(max),
            None => discount,
        };

        Ok(capped.min(amount).max(Decimal::ZERO))
    }

    async fn increment_usage(&self, coupon_id: Uuid) -> Result<(), ServiceError> {
        // Single guarded UPDATE; concurrent claims serialize on the row and the
        // count can never exceed the limit.
        let result = coupon::Entity::update_many()
            .col_expr(
                coupon::Column::UsageCount,
                Expr::col(coupon::Column::UsageCount).add(1),
            )
            .filter(coupon::Column::Id.eq(coupon_id))
            .filter(
                Condition::any()
                    .add(coupon::Column::UsageLimit.is_null())
                    .add(
                        Expr::col(coupon::Column::UsageCount)
                            .lt(Expr::col(coupon::Column::UsageLimit)),
                    ),
            )
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            let exists = coupon::Entity::find_by_id(coupon_id)
                .one(&*self.db)
                .await?
                .is_some();
            if exists {
                return Err(ServiceError::ValidationError(
                    "coupon usage limit reached".to_string(),
                ));
            }
            return Err(ServiceError::NotFound(format!(
                "Coupon {} not found",
                coupon_id
            )));
        }

        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct DbSaleFactory;

impl DbSaleFactory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SaleFactory for DbSaleFactory {
    async fn create_from_quotation(
        &self,
        txn: &DatabaseTransaction,
        quotation: &quotation::Model,
        lines: &[quotation_detail::Model],
    ) -> Result<SaleRef, ServiceError> {
        let sale_id = Uuid::new_v4();
        // Quotation codes are unique and conversion is idempotent, so reusing
        // the sequence keeps sale codes collision-free.
        let code = quotation.code.replacen("COT-", "VEN-", 1);
        let now = Utc::now();

        let header = sale::ActiveModel {
            id: Set(sale_id),
            code: Set(code.clone()),
            quotation_id: Set(quotation.id),
            seller_id: Set(quotation.seller_id),
            customer_id: Set(quotation.customer_id),
            customer_name: Set(quotation.customer_name.clone()),
            customer_document: Set(quotation.customer_document.clone()),
            warehouse_id: Set(quotation.warehouse_id),
            currency: Set(quotation.currency.clone()),
            exchange_rate: Set(quotation.exchange_rate),
            subtotal: Set(quotation.subtotal),
            discount: Set(quotation.discount + quotation.coupon_discount),
            tax: Set(quotation.tax),
            total: Set(quotation.total),
            sale_date: Set(now.date_naive()),
            created_at: Set(now),
        };
        header.insert(txn).await?;

        for line in lines {
            let item = sale_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                sale_id: Set(sale_id),
                product_id: Set(line.product_id),
                product_name: Set(line.product_name.clone()),
                product_sku: Set(line.product_sku.clone()),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                discount: Set(line.discount),
                subtotal: Set(line.subtotal),
                tax_amount: Set(line.tax_amount),
                total: Set(line.total),
                created_at: Set(now),
            };
            item.insert(txn).await?;
        }

        Ok(SaleRef { id: sale_id, code })
    }
}

//! Interfaces to the subsystems the quotation engine consumes but does not own:
//! the category tree, warehouse inventory and price lists, the supplier
//! catalog, coupons, sale creation and the wall clock.
//!
//! The engine only ever reads through these seams (coupon usage accounting is
//! the one write, and it is a single atomic increment). Database-backed
//! adapters live in [`db`]; tests substitute in-memory fakes or mocks.

pub mod db;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseTransaction;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{quotation, quotation_detail};
use crate::errors::ServiceError;

/// Category node as seen by the margin resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryNode {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    /// 0 means "not set, inherit from parent"
    pub min_margin_percentage: Decimal,
    /// 0 means "not set, inherit from parent"
    pub normal_margin_percentage: Decimal,
}

/// Warehouse stock snapshot for one product.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StockLevel {
    pub available_stock: i32,
    pub average_cost: Decimal,
}

/// Active price-list entry candidate for a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceEntry {
    pub price: Decimal,
    pub min_price: Option<Decimal>,
    /// Smallest quantity the entry applies to
    pub min_quantity: i32,
    /// Set when the entry is scoped to a single warehouse
    pub warehouse_id: Option<Uuid>,
}

/// One supplier's standing offer for a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierOffer {
    pub supplier_id: Uuid,
    pub supplier_product_id: Uuid,
    pub purchase_price: Decimal,
    pub available_stock: i32,
    pub priority: i32,
    pub is_active: bool,
}

/// Reference to the sale a quotation was converted into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRef {
    pub id: Uuid,
    pub code: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn get_category(&self, id: Uuid) -> Result<Option<CategoryNode>, ServiceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Active inventory row for (product, warehouse), if any.
    async fn get_stock(
        &self,
        product_id: Uuid,
        warehouse_id: Uuid,
    ) -> Result<Option<StockLevel>, ServiceError>;

    /// Active price-list entries for the product, both warehouse-scoped and
    /// general. Selection among them is the resolver's job.
    async fn get_active_prices(
        &self,
        product_id: Uuid,
        price_list_id: Uuid,
        warehouse_id: Uuid,
    ) -> Result<Vec<PriceEntry>, ServiceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SupplierCatalog: Send + Sync {
    /// All offers for the product, in no particular order.
    async fn list_offers(&self, product_id: Uuid) -> Result<Vec<SupplierOffer>, ServiceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CouponService: Send + Sync {
    /// Discount the coupon yields for the given amount. Validity, minimum
    /// order and cap rules are the coupon subsystem's concern.
    async fn calculate_discount(
        &self,
        coupon_id: Uuid,
        amount: Decimal,
    ) -> Result<Decimal, ServiceError>;

    /// Claims one usage slot. Must be a single guarded atomic increment so
    /// concurrent claims can never push `usage_count` past `usage_limit`.
    /// Returns `ValidationError` when the limit is exhausted.
    async fn increment_usage(&self, coupon_id: Uuid) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait SaleFactory: Send + Sync {
    /// Materializes a sale mirroring the quotation lines, on the caller's
    /// transaction so conversion is all-or-nothing.
    async fn create_from_quotation(
        &self,
        txn: &DatabaseTransaction,
        quotation: &quotation::Model,
        lines: &[quotation_detail::Model],
    ) -> Result<SaleRef, ServiceError>;
}

/// Injected clock so validity windows are testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock implementation used in production wiring.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

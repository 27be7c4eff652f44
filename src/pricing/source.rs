//! Price source resolution.
//!
//! Stock-first policy: a warehouse that can cover the requested quantity wins
//! over any supplier offer, even a cheaper one. Supplier offers are ranked by
//! priority, then purchase price. Resolution is a point-in-time snapshot that
//! gets copied onto the quotation line; it is re-checked explicitly before
//! conversion, never implicitly.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::entities::quotation_detail::{self, LineSourceType};
use crate::errors::ServiceError;
use crate::stores::{InventoryStore, PriceEntry, SupplierCatalog, SupplierOffer};

/// Resolved fulfillment source for one line.
///
/// Modeled as a sum type so a line can never reference both a warehouse and a
/// supplier, or neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineSource {
    Warehouse {
        warehouse_id: Uuid,
        available_stock: i32,
        /// Average cost from the inventory row
        unit_cost: Decimal,
        /// Suggested sale price from the best-matching price-list entry
        unit_price: Option<Decimal>,
    },
    Supplier {
        supplier_id: Uuid,
        supplier_product_id: Uuid,
        purchase_price: Decimal,
        available_stock: i32,
        /// True when no supplier stock covers the quantity and a purchase
        /// request has been flagged
        is_requested_from_supplier: bool,
    },
}

impl LineSource {
    pub fn source_type(&self) -> LineSourceType {
        match self {
            Self::Warehouse { .. } => LineSourceType::Warehouse,
            Self::Supplier { .. } => LineSourceType::Supplier,
        }
    }

    /// Cost basis for margin computation.
    pub fn unit_cost(&self) -> Decimal {
        match self {
            Self::Warehouse { unit_cost, .. } => *unit_cost,
            Self::Supplier { purchase_price, .. } => *purchase_price,
        }
    }

    /// Sale price suggested by the source, when it has one.
    pub fn suggested_unit_price(&self) -> Option<Decimal> {
        match self {
            Self::Warehouse { unit_price, .. } => *unit_price,
            Self::Supplier { .. } => None,
        }
    }

    pub fn available_stock(&self) -> i32 {
        match self {
            Self::Warehouse {
                available_stock, ..
            }
            | Self::Supplier {
                available_stock, ..
            } => *available_stock,
        }
    }

    /// Whether the source can fulfill the quantity from stock on hand.
    pub fn covers(&self, quantity: i32) -> bool {
        self.available_stock() >= quantity
    }

    pub fn is_requested_from_supplier(&self) -> bool {
        matches!(
            self,
            Self::Supplier {
                is_requested_from_supplier: true,
                ..
            }
        )
    }

    /// Re-hydrates the snapshot stored on a persisted line.
    pub fn from_detail(detail: &quotation_detail::Model) -> Result<Self, ServiceError> {
        match detail.source_type {
            LineSourceType::Warehouse => {
                let warehouse_id = detail.warehouse_id.ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "warehouse line {} has no warehouse reference",
                        detail.id
                    ))
                })?;
                Ok(Self::Warehouse {
                    warehouse_id,
                    available_stock: detail.available_stock,
                    unit_cost: detail.unit_cost,
                    unit_price: Some(detail.unit_price),
                })
            }
            LineSourceType::Supplier => {
                let (supplier_id, supplier_product_id) = detail
                    .supplier_id
                    .zip(detail.supplier_product_id)
                    .ok_or_else(|| {
                        ServiceError::InternalError(format!(
                            "supplier line {} has no supplier reference",
                            detail.id
                        ))
                    })?;
                Ok(Self::Supplier {
                    supplier_id,
                    supplier_product_id,
                    purchase_price: detail.purchase_price,
                    available_stock: detail.available_stock,
                    is_requested_from_supplier: detail.is_requested_from_supplier,
                })
            }
        }
    }
}

pub struct PriceSourceResolver {
    inventory: Arc<dyn InventoryStore>,
    suppliers: Arc<dyn SupplierCatalog>,
    /// Price list consulted for warehouse-sourced lines; explicit configuration
    /// rather than an ambient cached default so resolution is deterministic.
    price_list_id: Uuid,
}

impl PriceSourceResolver {
    pub fn new(
        inventory: Arc<dyn InventoryStore>,
        suppliers: Arc<dyn SupplierCatalog>,
        price_list_id: Uuid,
    ) -> Self {
        Self {
            inventory,
            suppliers,
            price_list_id,
        }
    }

    /// Resolves the source for (product, warehouse, quantity).
    #[instrument(skip(self), fields(product_id = %product_id, warehouse_id = %warehouse_id, quantity))]
    pub async fn resolve(
        &self,
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity: i32,
    ) -> Result<LineSource, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::ValidationError(
                "quantity must be at least 1".to_string(),
            ));
        }

        if let Some(stock) = self.inventory.get_stock(product_id, warehouse_id).await? {
            if stock.available_stock >= quantity {
                let entries = self
                    .inventory
                    .get_active_prices(product_id, self.price_list_id, warehouse_id)
                    .await?;
                let unit_price = best_price(&entries, warehouse_id, quantity);
                return Ok(LineSource::Warehouse {
                    warehouse_id,
                    available_stock: stock.available_stock,
                    unit_cost: stock.average_cost,
                    unit_price,
                });
            }
        }

        let mut offers: Vec<SupplierOffer> = self
            .suppliers
            .list_offers(product_id)
            .await?
            .into_iter()
            .filter(|offer| offer.is_active)
            .collect();
        if offers.is_empty() {
            return Err(ServiceError::NoPriceSource { product_id });
        }

        offers.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.purchase_price.cmp(&b.purchase_price))
        });

        let chosen = offers
            .iter()
            .find(|offer| offer.available_stock >= quantity)
            .unwrap_or(&offers[0]);
        let in_stock = chosen.available_stock >= quantity;

        Ok(LineSource::Supplier {
            supplier_id: chosen.supplier_id,
            supplier_product_id: chosen.supplier_product_id,
            purchase_price: chosen.purchase_price,
            available_stock: chosen.available_stock,
            is_requested_from_supplier: !in_stock,
        })
    }

    /// Compares a stored line snapshot against the live source state.
    /// Returns the reason the snapshot is stale, or `None` when the line can
    /// still be fulfilled as quoted.
    pub async fn check_snapshot(
        &self,
        product_id: Uuid,
        snapshot: &LineSource,
        quantity: i32,
        price_drift_tolerance: Decimal,
    ) -> Result<Option<crate::errors::StaleReason>, ServiceError> {
        use crate::errors::StaleReason;

        match snapshot {
            LineSource::Warehouse { warehouse_id, .. } => {
                let available = self
                    .inventory
                    .get_stock(product_id, *warehouse_id)
                    .await?
                    .map(|stock| stock.available_stock)
                    .unwrap_or(0);
                if available < quantity {
                    return Ok(Some(StaleReason::InsufficientStock {
                        available,
                        requested: quantity,
                    }));
                }
                Ok(None)
            }
            LineSource::Supplier {
                supplier_product_id,
                purchase_price,
                is_requested_from_supplier,
                ..
            } => {
                let offers = self.suppliers.list_offers(product_id).await?;
                let Some(offer) = offers
                    .iter()
                    .find(|o| o.supplier_product_id == *supplier_product_id && o.is_active)
                else {
                    return Ok(Some(StaleReason::OfferMissing));
                };

                if *purchase_price > Decimal::ZERO {
                    let drift = (offer.purchase_price - purchase_price).abs() / purchase_price
                        * Decimal::ONE_HUNDRED;
                    if drift > price_drift_tolerance {
                        return Ok(Some(StaleReason::PriceDrift {
                            snapshot: *purchase_price,
                            current: offer.purchase_price,
                        }));
                    }
                }

                // Lines quoted from supplier stock must still be coverable;
                // flagged purchase requests never were.
                if !is_requested_from_supplier && offer.available_stock < quantity {
                    return Ok(Some(StaleReason::InsufficientStock {
                        available: offer.available_stock,
                        requested: quantity,
                    }));
                }

                Ok(None)
            }
        }
    }
}

/// Picks the applicable price among active entries: warehouse-specific entries
/// beat general ones, then the lowest `min_quantity` not exceeding the
/// requested quantity wins.
fn best_price(entries: &[PriceEntry], warehouse_id: Uuid, quantity: i32) -> Option<Decimal> {
    let mut eligible: Vec<&PriceEntry> = entries
        .iter()
        .filter(|e| e.min_quantity <= quantity)
        .filter(|e| e.warehouse_id.is_none() || e.warehouse_id == Some(warehouse_id))
        .collect();

    eligible.sort_by_key(|e| (e.warehouse_id.is_none(), e.min_quantity));
    eligible.first().map(|e| e.price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::{MockInventoryStore, MockSupplierCatalog, StockLevel};
    use rust_decimal_macros::dec;

    fn entry(price: Decimal, min_quantity: i32, warehouse_id: Option<Uuid>) -> PriceEntry {
        PriceEntry {
            price,
            min_price: None,
            min_quantity,
            warehouse_id,
        }
    }

    fn offer(priority: i32, price: Decimal, stock: i32, active: bool) -> SupplierOffer {
        SupplierOffer {
            supplier_id: Uuid::new_v4(),
            supplier_product_id: Uuid::new_v4(),
            purchase_price: price,
            available_stock: stock,
            priority,
            is_active: active,
        }
    }

    fn resolver(
        inventory: MockInventoryStore,
        suppliers: MockSupplierCatalog,
    ) -> PriceSourceResolver {
        PriceSourceResolver::new(Arc::new(inventory), Arc::new(suppliers), Uuid::new_v4())
    }

    #[tokio::test]
    async fn warehouse_stock_beats_cheaper_supplier() {
        let warehouse_id = Uuid::new_v4();
        let mut inventory = MockInventoryStore::new();
        inventory.expect_get_stock().returning(|_, _| {
            Ok(Some(StockLevel {
                available_stock: 10,
                average_cost: dec!(80.00),
            }))
        });
        inventory
            .expect_get_active_prices()
            .returning(|_, _, _| Ok(vec![entry(dec!(120.00), 1, None)]));

        let mut suppliers = MockSupplierCatalog::new();
        suppliers
            .expect_list_offers()
            .returning(|_| Ok(vec![offer(10, dec!(50.00), 100, true)]));

        let source = resolver(inventory, suppliers)
            .resolve(Uuid::new_v4(), warehouse_id, 5)
            .await
            .unwrap();

        assert!(matches!(source, LineSource::Warehouse { .. }));
        assert_eq!(source.unit_cost(), dec!(80.00));
        assert_eq!(source.suggested_unit_price(), Some(dec!(120.00)));
        assert!(source.covers(5));
    }

    #[tokio::test]
    async fn warehouse_specific_price_beats_general() {
        let warehouse_id = Uuid::new_v4();
        let entries = vec![
            entry(dec!(100.00), 1, None),
            entry(dec!(95.00), 1, Some(warehouse_id)),
            entry(dec!(90.00), 1, Some(Uuid::new_v4())),
        ];
        assert_eq!(best_price(&entries, warehouse_id, 5), Some(dec!(95.00)));
    }

    #[tokio::test]
    async fn lowest_applicable_quantity_break_wins() {
        let warehouse_id = Uuid::new_v4();
        let entries = vec![
            entry(dec!(92.00), 10, None),
            entry(dec!(100.00), 1, None),
            entry(dec!(96.00), 5, None),
        ];
        // quantity 7: entries with min_quantity 1 and 5 apply, 1 is preferred
        assert_eq!(best_price(&entries, warehouse_id, 7), Some(dec!(100.00)));
        // quantity 3: only min_quantity 1 applies
        assert_eq!(best_price(&entries, warehouse_id, 3), Some(dec!(100.00)));
    }

    #[tokio::test]
    async fn no_applicable_quantity_break_yields_no_price() {
        let warehouse_id = Uuid::new_v4();
        let entries = vec![entry(dec!(92.00), 10, None)];
        assert_eq!(best_price(&entries, warehouse_id, 3), None);
    }

    #[tokio::test]
    async fn insufficient_warehouse_stock_falls_through_to_supplier() {
        let mut inventory = MockInventoryStore::new();
        inventory.expect_get_stock().returning(|_, _| {
            Ok(Some(StockLevel {
                available_stock: 2,
                average_cost: dec!(80.00),
            }))
        });

        let mut suppliers = MockSupplierCatalog::new();
        suppliers
            .expect_list_offers()
            .returning(|_| Ok(vec![offer(5, dec!(70.00), 50, true)]));

        let source = resolver(inventory, suppliers)
            .resolve(Uuid::new_v4(), Uuid::new_v4(), 5)
            .await
            .unwrap();

        assert_eq!(source.source_type(), LineSourceType::Supplier);
        assert_eq!(source.unit_cost(), dec!(70.00));
        assert!(!source.is_requested_from_supplier());
    }

    #[tokio::test]
    async fn supplier_ranking_prefers_priority_then_price() {
        let mut inventory = MockInventoryStore::new();
        inventory.expect_get_stock().returning(|_, _| Ok(None));

        let cheap_low_priority = offer(1, dec!(60.00), 50, true);
        let pricey_high_priority = offer(9, dec!(75.00), 50, true);
        let expected = pricey_high_priority.supplier_product_id;

        let mut suppliers = MockSupplierCatalog::new();
        suppliers.expect_list_offers().returning(move |_| {
            Ok(vec![cheap_low_priority.clone(), pricey_high_priority.clone()])
        });

        let source = resolver(inventory, suppliers)
            .resolve(Uuid::new_v4(), Uuid::new_v4(), 5)
            .await
            .unwrap();

        match source {
            LineSource::Supplier {
                supplier_product_id,
                purchase_price,
                ..
            } => {
                assert_eq!(supplier_product_id, expected);
                assert_eq!(purchase_price, dec!(75.00));
            }
            other => panic!("expected supplier source, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn out_of_stock_supplier_is_flagged_as_requested() {
        let mut inventory = MockInventoryStore::new();
        inventory.expect_get_stock().returning(|_, _| Ok(None));

        let mut suppliers = MockSupplierCatalog::new();
        suppliers
            .expect_list_offers()
            .returning(|_| Ok(vec![offer(3, dec!(40.00), 1, true)]));

        let source = resolver(inventory, suppliers)
            .resolve(Uuid::new_v4(), Uuid::new_v4(), 10)
            .await
            .unwrap();

        assert!(source.is_requested_from_supplier());
        assert!(!source.covers(10));
    }

    #[tokio::test]
    async fn no_source_at_all_is_an_error() {
        let product_id = Uuid::new_v4();
        let mut inventory = MockInventoryStore::new();
        inventory.expect_get_stock().returning(|_, _| Ok(None));

        let mut suppliers = MockSupplierCatalog::new();
        suppliers
            .expect_list_offers()
            .returning(|_| Ok(vec![offer(3, dec!(40.00), 10, false)]));

        let err = resolver(inventory, suppliers)
            .resolve(product_id, Uuid::new_v4(), 1)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::NoPriceSource { product_id: p } if p == product_id
        ));
    }

    #[tokio::test]
    async fn snapshot_check_detects_warehouse_stock_drop() {
        use crate::errors::StaleReason;

        let mut inventory = MockInventoryStore::new();
        inventory.expect_get_stock().returning(|_, _| {
            Ok(Some(StockLevel {
                available_stock: 3,
                average_cost: dec!(80.00),
            }))
        });
        let suppliers = MockSupplierCatalog::new();

        let snapshot = LineSource::Warehouse {
            warehouse_id: Uuid::new_v4(),
            available_stock: 10,
            unit_cost: dec!(80.00),
            unit_price: Some(dec!(120.00)),
        };

        let reason = resolver(inventory, suppliers)
            .check_snapshot(Uuid::new_v4(), &snapshot, 5, dec!(1.0))
            .await
            .unwrap();

        assert!(matches!(
            reason,
            Some(StaleReason::InsufficientStock {
                available: 3,
                requested: 5
            })
        ));
    }

    #[tokio::test]
    async fn snapshot_check_detects_supplier_price_drift() {
        use crate::errors::StaleReason;

        let inventory = MockInventoryStore::new();
        let supplier_product_id = Uuid::new_v4();
        let mut offer = offer(5, dec!(110.00), 50, true);
        offer.supplier_product_id = supplier_product_id;

        let mut suppliers = MockSupplierCatalog::new();
        suppliers
            .expect_list_offers()
            .returning(move |_| Ok(vec![offer.clone()]));

        let snapshot = LineSource::Supplier {
            supplier_id: Uuid::new_v4(),
            supplier_product_id,
            purchase_price: dec!(100.00),
            available_stock: 50,
            is_requested_from_supplier: false,
        };

        // 10% drift against a 1% tolerance
        let reason = resolver(inventory, suppliers)
            .check_snapshot(Uuid::new_v4(), &snapshot, 5, dec!(1.0))
            .await
            .unwrap();

        assert!(matches!(reason, Some(StaleReason::PriceDrift { .. })));
    }

    #[tokio::test]
    async fn snapshot_check_passes_within_tolerance() {
        let inventory = MockInventoryStore::new();
        let supplier_product_id = Uuid::new_v4();
        let mut current = offer(5, dec!(100.50), 50, true);
        current.supplier_product_id = supplier_product_id;

        let mut suppliers = MockSupplierCatalog::new();
        suppliers
            .expect_list_offers()
            .returning(move |_| Ok(vec![current.clone()]));

        let snapshot = LineSource::Supplier {
            supplier_id: Uuid::new_v4(),
            supplier_product_id,
            purchase_price: dec!(100.00),
            available_stock: 50,
            is_requested_from_supplier: false,
        };

        let reason = resolver(inventory, suppliers)
            .check_snapshot(Uuid::new_v4(), &snapshot, 5, dec!(1.0))
            .await
            .unwrap();

        assert!(reason.is_none());
    }

    #[tokio::test]
    async fn requested_supplier_lines_skip_the_stock_check() {
        let inventory = MockInventoryStore::new();
        let supplier_product_id = Uuid::new_v4();
        let mut current = offer(5, dec!(100.00), 0, true);
        current.supplier_product_id = supplier_product_id;

        let mut suppliers = MockSupplierCatalog::new();
        suppliers
            .expect_list_offers()
            .returning(move |_| Ok(vec![current.clone()]));

        let snapshot = LineSource::Supplier {
            supplier_id: Uuid::new_v4(),
            supplier_product_id,
            purchase_price: dec!(100.00),
            available_stock: 0,
            is_requested_from_supplier: true,
        };

        let reason = resolver(inventory, suppliers)
            .check_snapshot(Uuid::new_v4(), &snapshot, 10, dec!(1.0))
            .await
            .unwrap();

        assert!(reason.is_none());
    }

    #[tokio::test]
    async fn missing_offer_marks_the_snapshot_stale() {
        use crate::errors::StaleReason;

        let inventory = MockInventoryStore::new();
        let mut suppliers = MockSupplierCatalog::new();
        suppliers.expect_list_offers().returning(|_| Ok(vec![]));

        let snapshot = LineSource::Supplier {
            supplier_id: Uuid::new_v4(),
            supplier_product_id: Uuid::new_v4(),
            purchase_price: dec!(100.00),
            available_stock: 10,
            is_requested_from_supplier: false,
        };

        let reason = resolver(inventory, suppliers)
            .check_snapshot(Uuid::new_v4(), &snapshot, 5, dec!(1.0))
            .await
            .unwrap();

        assert!(matches!(reason, Some(StaleReason::OfferMissing)));
    }
}

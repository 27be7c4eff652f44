//! Conversion of an accepted quotation into a sale.
//!
//! Conversion is the one-way, idempotent edge of the lifecycle: it re-checks
//! every line snapshot against the live sources, claims the coupon slot, asks
//! the sale factory to mirror the lines, and stamps the conversion linkage.
//! The sale rows, the quotation update and the history row commit together or
//! not at all.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::entities::quotation::{self, QuotationStatus};
use crate::entities::quotation_detail;
use crate::entities::quotation_status_history;
use crate::errors::{ServiceError, StaleLine};
use crate::events::{Event, EventSender};
use crate::pricing::source::{LineSource, PriceSourceResolver};
use crate::stores::{Clock, CouponService, SaleFactory};

#[derive(Debug, Serialize)]
pub struct ConversionResponse {
    pub quotation_id: Uuid,
    pub sale_id: Uuid,
    pub sale_code: String,
    pub converted_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ConversionService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    sources: Arc<PriceSourceResolver>,
    sales: Arc<dyn SaleFactory>,
    coupons: Arc<dyn CouponService>,
    clock: Arc<dyn Clock>,
    price_drift_tolerance: rust_decimal::Decimal,
}

impl ConversionService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        sources: Arc<PriceSourceResolver>,
        sales: Arc<dyn SaleFactory>,
        coupons: Arc<dyn CouponService>,
        clock: Arc<dyn Clock>,
        price_drift_tolerance: rust_decimal::Decimal,
    ) -> Self {
        Self {
            db,
            event_sender,
            sources,
            sales,
            coupons,
            clock,
            price_drift_tolerance,
        }
    }

    /// Converts an accepted quotation into a sale.
    ///
    /// Preconditions: status is `accepted` and the quotation was never
    /// converted before. Re-validation failures surface as
    /// `StaleAvailability`; callers are expected to re-resolve and retry.
    #[instrument(skip(self), fields(quotation_id = %quotation_id))]
    pub async fn convert(
        &self,
        quotation_id: Uuid,
        changed_by: Uuid,
    ) -> Result<ConversionResponse, ServiceError> {
        let txn = self.db.begin().await?;

        let quotation = quotation::Entity::find_by_id(quotation_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Quotation {} not found", quotation_id))
            })?;

        if quotation.converted_sale_id.is_some() {
            return Err(ServiceError::InvalidStatus(format!(
                "quotation {} was already converted",
                quotation.code
            )));
        }
        if quotation.status != QuotationStatus::Accepted {
            return Err(ServiceError::InvalidStatus(format!(
                "quotation {} is '{}'; only accepted quotations convert",
                quotation.code, quotation.status
            )));
        }

        let lines = quotation_detail::Entity::find()
            .filter(quotation_detail::Column::QuotationId.eq(quotation.id))
            .all(&txn)
            .await?;
        if lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "quotation has no line items to convert".to_string(),
            ));
        }

        // Snapshot re-validation against live stock and supplier prices.
        let mut stale = Vec::new();
        for line in &lines {
            let snapshot = LineSource::from_detail(line)?;
            if let Some(reason) = self
                .sources
                .check_snapshot(
                    line.product_id,
                    &snapshot,
                    line.quantity,
                    self.price_drift_tolerance,
                )
                .await?
            {
                stale.push(StaleLine {
                    line_id: line.id,
                    product_id: line.product_id,
                    reason,
                });
            }
        }
        if !stale.is_empty() {
            warn!(
                quotation_id = %quotation_id,
                stale_lines = stale.len(),
                "Conversion blocked by stale availability"
            );
            return Err(ServiceError::StaleAvailability { details: stale });
        }

        // Claim the coupon slot before any rows are written. The guarded
        // increment keeps the usage count within the limit under concurrency;
        // a conversion that fails after this point leaks one slot rather than
        // ever overselling the coupon.
        if let Some(coupon_id) = quotation.coupon_id {
            self.coupons.increment_usage(coupon_id).await?;
        }

        let sale = self
            .sales
            .create_from_quotation(&txn, &quotation, &lines)
            .await?;

        let now = self.clock.now();
        let expected_version = quotation.version;
        let mut active: quotation::ActiveModel = quotation.clone().into();
        active.status = Set(QuotationStatus::Converted);
        active.converted_sale_id = Set(Some(sale.id));
        active.converted_at = Set(Some(now));
        active.version = Set(expected_version + 1);
        active.updated_at = Set(Some(now));

        let result = quotation::Entity::update_many()
            .set(active)
            .filter(quotation::Column::Id.eq(quotation.id))
            .filter(quotation::Column::Version.eq(expected_version))
            .filter(quotation::Column::ConvertedSaleId.is_null())
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::ConcurrencyConflict(quotation.id));
        }

        let history = quotation_status_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            quotation_id: Set(quotation.id),
            status: Set(QuotationStatus::Converted),
            previous_status: Set(Some(QuotationStatus::Accepted)),
            changed_by: Set(changed_by),
            notes: Set(None),
            metadata: Set(Some(serde_json::json!({
                "sale_id": sale.id,
                "sale_code": sale.code,
            }))),
            created_at: Set(now),
        };
        history.insert(&txn).await?;

        txn.commit().await?;

        info!(
            quotation_id = %quotation_id,
            sale_id = %sale.id,
            sale_code = %sale.code,
            "Quotation converted to sale"
        );
        self.event_sender
            .send_or_log(Event::QuotationConverted {
                quotation_id,
                sale_id: sale.id,
            })
            .await;

        Ok(ConversionResponse {
            quotation_id,
            sale_id: sale.id,
            sale_code: sale.code,
            converted_at: now,
        })
    }
}

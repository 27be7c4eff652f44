//! Quotation lifecycle and mutation service.
//!
//! Every multi-row mutation (line change + totals recompute, status change +
//! history append) runs inside one transaction, and the quotation row carries
//! an optimistic `version` stamp so concurrent edits of the same quotation
//! surface as `ConcurrencyConflict` instead of lost updates.

use chrono::{Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::config::QuotationConfig;
use crate::entities::quotation::{self, QuotationStatus};
use crate::entities::quotation_detail::{self, LineSourceType};
use crate::entities::quotation_status_history;
use crate::errors::{ServiceError, StaleReason};
use crate::events::{Event, EventSender};
use crate::margins::MarginResolver;
use crate::pricing::line::{compute_line, LineInput, LineTotals};
use crate::pricing::source::{LineSource, PriceSourceResolver};
use crate::pricing::totals::{
    aggregate, document_floor, enforce_margin_floors, CommissionBasis, CommissionSettings,
    DocumentCharges, DocumentTotals, LineFigures,
};
use crate::pricing::round_money;
use crate::stores::{Clock, CouponService};

const CODE_PREFIX: &str = "COT";

/// Engine settings materialized from configuration once at startup.
#[derive(Debug, Clone)]
pub struct QuotationSettings {
    pub tax_rate: Decimal,
    pub commission_basis: CommissionBasis,
    pub default_commission_percentage: Decimal,
    pub default_validity_days: i64,
    pub global_min_margin: Decimal,
    pub price_drift_tolerance: Decimal,
}

impl QuotationSettings {
    pub fn from_config(cfg: &QuotationConfig) -> Result<Self, ServiceError> {
        fn dec(value: f64, name: &str) -> Result<Decimal, ServiceError> {
            Decimal::from_f64_retain(value).ok_or_else(|| {
                ServiceError::ConfigurationError(format!("{name} is not a valid decimal"))
            })
        }

        Ok(Self {
            tax_rate: dec(cfg.default_tax_rate, "default_tax_rate")?,
            commission_basis: cfg.commission_basis.parse()?,
            default_commission_percentage: dec(
                cfg.default_commission_percentage,
                "default_commission_percentage",
            )?,
            default_validity_days: cfg.default_validity_days,
            global_min_margin: dec(cfg.global_min_margin, "global_min_margin")?,
            price_drift_tolerance: dec(cfg.price_drift_tolerance, "price_drift_tolerance")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewLineItem {
    pub product_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub product_name: String,
    #[validate(length(min = 1, max = 64))]
    pub product_sku: String,
    pub product_brand: Option<String>,
    pub category_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    /// Sale price; when omitted the price-list suggestion or the category's
    /// normal margin over cost is applied
    pub unit_price: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub distribution_price: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuotationRequest {
    pub seller_id: Uuid,
    pub customer_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,
    #[validate(length(min = 8, max = 15))]
    pub customer_document: String,
    #[validate(email)]
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub warehouse_id: Uuid,
    pub coupon_id: Option<Uuid>,
    #[validate(length(min = 3, max = 3, message = "Currency must be 3 characters"))]
    pub currency: String,
    pub exchange_rate: Option<Decimal>,
    pub commission_percentage: Option<Decimal>,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
    #[serde(default)]
    pub discount: Option<Decimal>,
    #[serde(default)]
    pub shipping_cost: Option<Decimal>,
    #[serde(default)]
    pub packaging_cost: Option<Decimal>,
    #[serde(default)]
    pub assembly_cost: Option<Decimal>,
    #[serde(default)]
    #[validate]
    pub items: Vec<NewLineItem>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangeStatusRequest {
    pub status: QuotationStatus,
    pub notes: Option<String>,
    pub changed_by: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendQuotationRequest {
    #[validate(email)]
    pub email: Option<String>,
    pub changed_by: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuotationFilter {
    pub status: Option<QuotationStatus>,
    pub seller_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub include_archived: bool,
}

#[derive(Debug, Serialize)]
pub struct QuotationResponse {
    pub id: Uuid,
    pub code: String,
    pub seller_id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_document: String,
    pub customer_email: Option<String>,
    pub warehouse_id: Uuid,
    pub coupon_id: Option<Uuid>,
    pub status: QuotationStatus,
    pub currency: String,
    pub exchange_rate: Decimal,
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
    pub commission_percentage: Decimal,
    pub commission_amount: Decimal,
    pub commission_paid: bool,
    pub quotation_date: NaiveDate,
    pub valid_until: NaiveDate,
    pub is_expired: bool,
    pub sent_at: Option<chrono::DateTime<Utc>>,
    pub converted_sale_id: Option<Uuid>,
    pub converted_at: Option<chrono::DateTime<Utc>>,
    pub is_archived: bool,
    pub version: i32,
}

#[derive(Debug, Serialize)]
pub struct LineItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_sku: String,
    pub product_brand: Option<String>,
    pub category_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub discount_percentage: Decimal,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub unit_margin: Decimal,
    pub total_margin: Decimal,
    pub margin_percentage: Decimal,
    pub source_type: LineSourceType,
    pub warehouse_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub supplier_product_id: Option<Uuid>,
    pub is_requested_from_supplier: bool,
    pub in_stock: bool,
    pub available_stock: i32,
}

#[derive(Debug, Serialize)]
pub struct QuotationWithItems {
    pub quotation: QuotationResponse,
    pub items: Vec<LineItemResponse>,
}

#[derive(Debug, Serialize)]
pub struct QuotationListResponse {
    pub quotations: Vec<QuotationResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Serialize)]
pub struct LineAvailability {
    pub line_id: Uuid,
    pub product_id: Uuid,
    pub ok: bool,
    #[serde(flatten)]
    pub reason: Option<StaleReason>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityReport {
    pub quotation_id: Uuid,
    pub is_valid: bool,
    pub lines: Vec<LineAvailability>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckStockItem {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckStockRequest {
    pub warehouse_id: Uuid,
    #[validate]
    pub items: Vec<CheckStockItem>,
}

#[derive(Debug, Serialize)]
pub struct StockCheckResult {
    pub product_id: Uuid,
    pub quantity: i32,
    pub has_source: bool,
    pub in_stock: bool,
    pub source_type: Option<LineSourceType>,
    pub available_stock: i32,
    pub is_requested_from_supplier: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PreviewLine {
    pub product_id: Uuid,
    pub category_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount: Option<Decimal>,
    pub unit_cost: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PreviewTotalsRequest {
    #[validate]
    pub lines: Vec<PreviewLine>,
    #[serde(default)]
    pub discount: Option<Decimal>,
    #[serde(default)]
    pub shipping_cost: Option<Decimal>,
    #[serde(default)]
    pub packaging_cost: Option<Decimal>,
    #[serde(default)]
    pub assembly_cost: Option<Decimal>,
    pub coupon_id: Option<Uuid>,
    pub commission_percentage: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct PreviewTotalsResponse {
    pub totals: DocumentTotals,
    pub lines: Vec<LineTotals>,
    /// Floor violations are reported, not fatal, so sellers can iterate
    pub margin_violations: Vec<crate::errors::MarginViolation>,
}

// ---------------------------------------------------------------------------
// Code sequence helpers
// ---------------------------------------------------------------------------

fn format_code(year: i32, seq: i64) -> String {
    format!("{CODE_PREFIX}-{year}-{seq:06}")
}

fn parse_code_seq(code: &str, year: i32) -> Option<i64> {
    code.strip_prefix(&format!("{CODE_PREFIX}-{year}-"))?
        .parse()
        .ok()
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct QuotationService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    margins: Arc<MarginResolver>,
    sources: Arc<PriceSourceResolver>,
    coupons: Arc<dyn CouponService>,
    clock: Arc<dyn Clock>,
    settings: QuotationSettings,
}

impl QuotationService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        margins: Arc<MarginResolver>,
        sources: Arc<PriceSourceResolver>,
        coupons: Arc<dyn CouponService>,
        clock: Arc<dyn Clock>,
        settings: QuotationSettings,
    ) -> Self {
        Self {
            db,
            event_sender,
            margins,
            sources,
            coupons,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &QuotationSettings {
        &self.settings
    }

    /// Creates a draft quotation, optionally with initial line items applied
    /// in request order.
    #[instrument(skip(self, request), fields(seller_id = %request.seller_id, customer_id = %request.customer_id))]
    pub async fn create_quotation(
        &self,
        request: CreateQuotationRequest,
    ) -> Result<QuotationWithItems, ServiceError> {
        request.validate()?;

        let now = self.clock.now();
        let today = self.clock.today();
        let quotation_id = Uuid::new_v4();
        let valid_until = request
            .valid_until
            .unwrap_or(today + Duration::days(self.settings.default_validity_days));
        if valid_until < today {
            return Err(ServiceError::ValidationError(
                "valid_until cannot be in the past".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let code = self.next_code(&txn, today.year()).await?;
        let quotation = quotation::ActiveModel {
            id: Set(quotation_id),
            code: Set(code.clone()),
            seller_id: Set(request.seller_id),
            customer_id: Set(request.customer_id),
            customer_name: Set(request.customer_name.clone()),
            customer_document: Set(request.customer_document.clone()),
            customer_email: Set(request.customer_email.clone()),
            customer_phone: Set(request.customer_phone.clone()),
            warehouse_id: Set(request.warehouse_id),
            coupon_id: Set(request.coupon_id),
            status: Set(QuotationStatus::Draft),
            currency: Set(request.currency.clone()),
            exchange_rate: Set(request.exchange_rate.unwrap_or(Decimal::ONE)),
            subtotal: Set(Decimal::ZERO),
            discount: Set(request.discount.unwrap_or(Decimal::ZERO)),
            coupon_discount: Set(Decimal::ZERO),
            tax: Set(Decimal::ZERO),
            shipping_cost: Set(request.shipping_cost.unwrap_or(Decimal::ZERO)),
            packaging_cost: Set(request.packaging_cost.unwrap_or(Decimal::ZERO)),
            assembly_cost: Set(request.assembly_cost.unwrap_or(Decimal::ZERO)),
            total: Set(Decimal::ZERO),
            total_cost: Set(Decimal::ZERO),
            total_margin: Set(Decimal::ZERO),
            margin_percentage: Set(Decimal::ZERO),
            commission_percentage: Set(request
                .commission_percentage
                .unwrap_or(self.settings.default_commission_percentage)),
            commission_amount: Set(Decimal::ZERO),
            commission_paid: Set(false),
            quotation_date: Set(today),
            valid_until: Set(valid_until),
            sent_at: Set(None),
            sent_to_email: Set(None),
            converted_sale_id: Set(None),
            converted_at: Set(None),
            notes: Set(request.notes.clone()),
            is_archived: Set(false),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            version: Set(1),
        };
        let mut quotation = quotation.insert(&txn).await?;

        self.append_history(
            &txn,
            quotation_id,
            QuotationStatus::Draft,
            None,
            request.seller_id,
            None,
        )
        .await?;

        let mut line_ids = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let line = self.build_line(&txn, &quotation, item).await?;
            line_ids.push(line.id);
            detail_to_active(line).insert(&txn).await?;
        }
        if !request.items.is_empty() {
            quotation = self.recompute_totals(&txn, quotation).await?;
        }

        let items = self.load_items(&txn, quotation_id).await?;
        txn.commit().await?;

        info!(quotation_id = %quotation_id, code = %code, "Quotation created");
        self.event_sender
            .send_or_log(Event::QuotationCreated(quotation_id))
            .await;
        for line_id in line_ids {
            self.event_sender
                .send_or_log(Event::QuotationLineAdded {
                    quotation_id,
                    line_id,
                })
                .await;
        }

        Ok(QuotationWithItems {
            quotation: self.model_to_response(quotation),
            items: items.iter().map(line_to_response).collect(),
        })
    }

    /// Adds one line to a draft quotation and recomputes document totals.
    #[instrument(skip(self, item), fields(quotation_id = %quotation_id, product_id = %item.product_id))]
    pub async fn add_line_item(
        &self,
        quotation_id: Uuid,
        item: NewLineItem,
    ) -> Result<QuotationWithItems, ServiceError> {
        item.validate()?;

        let txn = self.db.begin().await?;
        let quotation = self.load_quotation(&txn, quotation_id).await?;
        ensure_editable(&quotation)?;

        let line = self.build_line(&txn, &quotation, &item).await?;
        let line_id = line.id;
        detail_to_active(line).insert(&txn).await?;

        let quotation = self.recompute_totals(&txn, quotation).await?;
        let items = self.load_items(&txn, quotation_id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::QuotationLineAdded {
                quotation_id,
                line_id,
            })
            .await;

        Ok(QuotationWithItems {
            quotation: self.model_to_response(quotation),
            items: items.iter().map(line_to_response).collect(),
        })
    }

    /// Changes a line's quantity. The price source is re-resolved for the new
    /// quantity so stock coverage and the quantity-break price stay truthful.
    #[instrument(skip(self), fields(quotation_id = %quotation_id, line_id = %line_id, quantity))]
    pub async fn update_line_quantity(
        &self,
        quotation_id: Uuid,
        line_id: Uuid,
        quantity: i32,
    ) -> Result<QuotationWithItems, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::ValidationError(
                "quantity must be at least 1".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let quotation = self.load_quotation(&txn, quotation_id).await?;
        ensure_editable(&quotation)?;

        let line = quotation_detail::Entity::find_by_id(line_id)
            .one(&txn)
            .await?
            .filter(|line| line.quotation_id == quotation_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Line item {} not found", line_id))
            })?;

        let source = self
            .sources
            .resolve(line.product_id, quotation.warehouse_id, quantity)
            .await?;
        let totals = compute_line(LineInput {
            unit_price: line.unit_price,
            quantity,
            discount: line.discount,
            unit_cost: source.unit_cost(),
            tax_rate: self.settings.tax_rate,
        })?;

        let covered = source.covers(quantity);
        let mut active: quotation_detail::ActiveModel = line.into();
        active.quantity = Set(quantity);
        active.unit_cost = Set(source.unit_cost());
        active.purchase_price = Set(source.unit_cost());
        active.source_type = Set(source.source_type());
        active.warehouse_id = Set(match &source {
            LineSource::Warehouse { warehouse_id, .. } => Some(*warehouse_id),
            LineSource::Supplier { .. } => None,
        });
        active.supplier_id = Set(match &source {
            LineSource::Supplier { supplier_id, .. } => Some(*supplier_id),
            LineSource::Warehouse { .. } => None,
        });
        active.supplier_product_id = Set(match &source {
            LineSource::Supplier {
                supplier_product_id,
                ..
            } => Some(*supplier_product_id),
            LineSource::Warehouse { .. } => None,
        });
        active.is_requested_from_supplier = Set(source.is_requested_from_supplier());
        active.in_stock = Set(covered);
        active.available_stock = Set(source.available_stock());
        apply_line_totals(&mut active, &totals);
        active.updated_at = Set(Some(self.clock.now()));
        active.update(&txn).await?;

        let quotation = self.recompute_totals(&txn, quotation).await?;
        let items = self.load_items(&txn, quotation_id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::QuotationLineUpdated {
                quotation_id,
                line_id,
            })
            .await;

        Ok(QuotationWithItems {
            quotation: self.model_to_response(quotation),
            items: items.iter().map(line_to_response).collect(),
        })
    }

    /// Removes a line from a draft quotation and recomputes totals.
    #[instrument(skip(self), fields(quotation_id = %quotation_id, line_id = %line_id))]
    pub async fn remove_line_item(
        &self,
        quotation_id: Uuid,
        line_id: Uuid,
    ) -> Result<QuotationWithItems, ServiceError> {
        let txn = self.db.begin().await?;
        let quotation = self.load_quotation(&txn, quotation_id).await?;
        ensure_editable(&quotation)?;

        let line = quotation_detail::Entity::find_by_id(line_id)
            .one(&txn)
            .await?
            .filter(|line| line.quotation_id == quotation_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Line item {} not found", line_id))
            })?;
        quotation_detail::Entity::delete_by_id(line.id)
            .exec(&txn)
            .await?;

        let quotation = self.recompute_totals(&txn, quotation).await?;
        let items = self.load_items(&txn, quotation_id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::QuotationLineRemoved {
                quotation_id,
                line_id,
            })
            .await;

        Ok(QuotationWithItems {
            quotation: self.model_to_response(quotation),
            items: items.iter().map(line_to_response).collect(),
        })
    }

    /// Applies a guarded lifecycle transition. Conversion is excluded: it has
    /// side effects owned by the conversion service.
    #[instrument(skip(self, request), fields(quotation_id = %quotation_id, new_status = %request.status))]
    pub async fn change_status(
        &self,
        quotation_id: Uuid,
        request: ChangeStatusRequest,
    ) -> Result<QuotationResponse, ServiceError> {
        if request.status == QuotationStatus::Converted {
            return Err(ServiceError::InvalidStatus(
                "conversion must go through the convert operation".to_string(),
            ));
        }
        self.transition(quotation_id, request.status, request.changed_by, request.notes, None)
            .await
    }

    /// Marks a draft quotation as sent, stamping the destination email.
    #[instrument(skip(self, request), fields(quotation_id = %quotation_id))]
    pub async fn send_quotation(
        &self,
        quotation_id: Uuid,
        request: SendQuotationRequest,
    ) -> Result<QuotationResponse, ServiceError> {
        request.validate()?;
        let response = self
            .transition(
                quotation_id,
                QuotationStatus::Sent,
                request.changed_by,
                None,
                request.email.clone(),
            )
            .await?;

        self.event_sender
            .send_or_log(Event::QuotationSent {
                quotation_id,
                email: request.email,
            })
            .await;

        Ok(response)
    }

    async fn transition(
        &self,
        quotation_id: Uuid,
        new_status: QuotationStatus,
        changed_by: Uuid,
        notes: Option<String>,
        sent_to_email: Option<String>,
    ) -> Result<QuotationResponse, ServiceError> {
        let txn = self.db.begin().await?;
        let quotation = self.load_quotation(&txn, quotation_id).await?;
        let old_status = quotation.status;

        if quotation.is_archived {
            return Err(ServiceError::InvalidStatus(
                "archived quotations cannot change status".to_string(),
            ));
        }
        if !old_status.can_transition_to(new_status) {
            return Err(ServiceError::InvalidStatus(format!(
                "cannot transition from '{}' to '{}'",
                old_status, new_status
            )));
        }

        match new_status {
            QuotationStatus::Sent => {
                let line_count = quotation_detail::Entity::find()
                    .filter(quotation_detail::Column::QuotationId.eq(quotation_id))
                    .count(&txn)
                    .await?;
                if line_count == 0 {
                    return Err(ServiceError::ValidationError(
                        "cannot send a quotation without line items".to_string(),
                    ));
                }
            }
            QuotationStatus::Expired => {
                if !quotation.is_expired(self.clock.today()) {
                    return Err(ServiceError::ValidationError(format!(
                        "quotation is valid until {}",
                        quotation.valid_until
                    )));
                }
            }
            _ => {}
        }

        let now = self.clock.now();
        let mut active: quotation::ActiveModel = quotation.clone().into();
        active.status = Set(new_status);
        if new_status == QuotationStatus::Sent {
            active.sent_at = Set(Some(now));
            active.sent_to_email =
                Set(sent_to_email.or_else(|| quotation.customer_email.clone()));
        }
        let updated = self.persist_with_version(&txn, &quotation, active).await?;

        self.append_history(
            &txn,
            quotation_id,
            new_status,
            Some(old_status),
            changed_by,
            notes,
        )
        .await?;

        txn.commit().await?;

        info!(
            quotation_id = %quotation_id,
            old_status = %old_status,
            new_status = %new_status,
            "Quotation status changed"
        );
        self.event_sender
            .send_or_log(Event::QuotationStatusChanged {
                quotation_id,
                old_status,
                new_status,
            })
            .await;
        if new_status == QuotationStatus::Expired {
            self.event_sender
                .send_or_log(Event::QuotationExpired(quotation_id))
                .await;
        }

        Ok(self.model_to_response(updated))
    }

    /// Soft-deletes a quotation. Only drafts can be archived.
    #[instrument(skip(self), fields(quotation_id = %quotation_id))]
    pub async fn archive(
        &self,
        quotation_id: Uuid,
        changed_by: Uuid,
    ) -> Result<QuotationResponse, ServiceError> {
        let txn = self.db.begin().await?;
        let quotation = self.load_quotation(&txn, quotation_id).await?;
        if quotation.status != QuotationStatus::Draft {
            return Err(ServiceError::InvalidStatus(
                "only draft quotations can be archived".to_string(),
            ));
        }
        if quotation.is_archived {
            return Err(ServiceError::InvalidStatus(
                "quotation is already archived".to_string(),
            ));
        }

        let mut active: quotation::ActiveModel = quotation.clone().into();
        active.is_archived = Set(true);
        let updated = self.persist_with_version(&txn, &quotation, active).await?;

        self.append_history_with_metadata(
            &txn,
            quotation_id,
            quotation.status,
            Some(quotation.status),
            changed_by,
            None,
            Some(serde_json::json!({ "action": "archived" })),
        )
        .await?;

        txn.commit().await?;
        self.event_sender
            .send_or_log(Event::QuotationArchived(quotation_id))
            .await;
        Ok(self.model_to_response(updated))
    }

    /// Returns an archived draft to the active set.
    #[instrument(skip(self), fields(quotation_id = %quotation_id))]
    pub async fn restore(
        &self,
        quotation_id: Uuid,
        changed_by: Uuid,
    ) -> Result<QuotationResponse, ServiceError> {
        let txn = self.db.begin().await?;
        let quotation = self.load_quotation(&txn, quotation_id).await?;
        if !quotation.is_archived {
            return Err(ServiceError::InvalidStatus(
                "quotation is not archived".to_string(),
            ));
        }

        let mut active: quotation::ActiveModel = quotation.clone().into();
        active.is_archived = Set(false);
        let updated = self.persist_with_version(&txn, &quotation, active).await?;

        self.append_history_with_metadata(
            &txn,
            quotation_id,
            quotation.status,
            Some(quotation.status),
            changed_by,
            None,
            Some(serde_json::json!({ "action": "restored" })),
        )
        .await?;

        txn.commit().await?;
        self.event_sender
            .send_or_log(Event::QuotationRestored(quotation_id))
            .await;
        Ok(self.model_to_response(updated))
    }

    /// Re-checks every line's snapshot against the live sources.
    #[instrument(skip(self), fields(quotation_id = %quotation_id))]
    pub async fn validate_availability(
        &self,
        quotation_id: Uuid,
    ) -> Result<AvailabilityReport, ServiceError> {
        let quotation = quotation::Entity::find_by_id(quotation_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Quotation {} not found", quotation_id))
            })?;
        let lines = quotation_detail::Entity::find()
            .filter(quotation_detail::Column::QuotationId.eq(quotation.id))
            .all(&*self.db)
            .await?;

        let mut report_lines = Vec::with_capacity(lines.len());
        for line in &lines {
            let snapshot = LineSource::from_detail(line)?;
            let reason = self
                .sources
                .check_snapshot(
                    line.product_id,
                    &snapshot,
                    line.quantity,
                    self.settings.price_drift_tolerance,
                )
                .await?;
            report_lines.push(LineAvailability {
                line_id: line.id,
                product_id: line.product_id,
                ok: reason.is_none(),
                reason,
            });
        }

        Ok(AvailabilityReport {
            quotation_id,
            is_valid: report_lines.iter().all(|l| l.ok),
            lines: report_lines,
        })
    }

    /// Resolves sources for a basket of items without touching any quotation.
    pub async fn check_stock(
        &self,
        request: CheckStockRequest,
    ) -> Result<Vec<StockCheckResult>, ServiceError> {
        request.validate()?;

        let mut results = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let result = match self
                .sources
                .resolve(item.product_id, request.warehouse_id, item.quantity)
                .await
            {
                Ok(source) => StockCheckResult {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    has_source: true,
                    in_stock: source.covers(item.quantity),
                    source_type: Some(source.source_type()),
                    available_stock: source.available_stock(),
                    is_requested_from_supplier: source.is_requested_from_supplier(),
                },
                Err(ServiceError::NoPriceSource { .. }) => StockCheckResult {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    has_source: false,
                    in_stock: false,
                    source_type: None,
                    available_stock: 0,
                    is_requested_from_supplier: false,
                },
                Err(other) => return Err(other),
            };
            results.push(result);
        }
        Ok(results)
    }

    /// Pure totals computation over posted lines; nothing is persisted.
    /// Margin-floor violations are reported in the response so the seller can
    /// adjust prices before saving.
    pub async fn calculate_totals_preview(
        &self,
        request: PreviewTotalsRequest,
    ) -> Result<PreviewTotalsResponse, ServiceError> {
        request.validate()?;

        let mut line_totals = Vec::with_capacity(request.lines.len());
        let mut figures = Vec::with_capacity(request.lines.len());
        let mut floors = Vec::with_capacity(request.lines.len());
        let mut floor_cache: HashMap<Uuid, Decimal> = HashMap::new();

        for line in &request.lines {
            let totals = compute_line(LineInput {
                unit_price: line.unit_price,
                quantity: line.quantity,
                discount: line.discount.unwrap_or(Decimal::ZERO),
                unit_cost: line.unit_cost,
                tax_rate: self.settings.tax_rate,
            })?;
            let floor = match floor_cache.get(&line.category_id) {
                Some(floor) => *floor,
                None => {
                    let margin = self.margins.effective_margin(line.category_id).await?;
                    floor_cache.insert(line.category_id, margin.min);
                    margin.min
                }
            };
            figures.push(LineFigures::from_totals(
                None,
                line.product_id,
                line.category_id,
                &totals,
            ));
            floors.push((line.category_id, floor));
            line_totals.push(totals);
        }

        let subtotal: Decimal = figures.iter().map(|f| f.subtotal).sum();
        let coupon_discount = match request.coupon_id {
            Some(coupon_id) => self.coupons.calculate_discount(coupon_id, subtotal).await?,
            None => Decimal::ZERO,
        };

        let charges = DocumentCharges {
            discount: request.discount.unwrap_or(Decimal::ZERO),
            shipping_cost: request.shipping_cost.unwrap_or(Decimal::ZERO),
            packaging_cost: request.packaging_cost.unwrap_or(Decimal::ZERO),
            assembly_cost: request.assembly_cost.unwrap_or(Decimal::ZERO),
        };
        let commission = CommissionSettings {
            basis: self.settings.commission_basis,
            percentage: request
                .commission_percentage
                .unwrap_or(self.settings.default_commission_percentage),
        };
        let totals = aggregate(&figures, &charges, coupon_discount, &commission)?;

        let lines_with_floors: Vec<(LineFigures, Decimal)> = figures
            .iter()
            .copied()
            .zip(floors.iter().map(|(_, floor)| *floor))
            .collect();
        let doc_floor = document_floor(&floors, self.settings.global_min_margin);
        let margin_violations = match enforce_margin_floors(
            &lines_with_floors,
            totals.margin_percentage,
            doc_floor,
        ) {
            Ok(()) => Vec::new(),
            Err(ServiceError::MarginBelowMinimum { violations }) => violations,
            Err(other) => return Err(other),
        };

        Ok(PreviewTotalsResponse {
            totals,
            lines: line_totals,
            margin_violations,
        })
    }

    /// Applies the explicit `expired` transition to every overdue quotation.
    /// Invoked by an external scheduler; each quotation expires in its own
    /// transaction so one failure does not hold up the sweep.
    #[instrument(skip(self))]
    pub async fn expire_overdue(&self, changed_by: Uuid) -> Result<u64, ServiceError> {
        let today = self.clock.today();
        let overdue = quotation::Entity::find()
            .filter(quotation::Column::ValidUntil.lt(today))
            .filter(quotation::Column::Status.is_in([
                QuotationStatus::Draft,
                QuotationStatus::Sent,
                QuotationStatus::Accepted,
            ]))
            .filter(quotation::Column::IsArchived.eq(false))
            .all(&*self.db)
            .await?;

        let mut expired = 0u64;
        for quotation in overdue {
            match self
                .transition(
                    quotation.id,
                    QuotationStatus::Expired,
                    changed_by,
                    Some("expired by scheduled sweep".to_string()),
                    None,
                )
                .await
            {
                Ok(_) => expired += 1,
                Err(e) => {
                    warn!(quotation_id = %quotation.id, error = %e, "Failed to expire quotation");
                }
            }
        }

        info!(expired, "Expiry sweep finished");
        Ok(expired)
    }

    /// Flags the seller commission as paid out. Only converted quotations
    /// carry a payable commission.
    #[instrument(skip(self), fields(quotation_id = %quotation_id))]
    pub async fn mark_commission_paid(
        &self,
        quotation_id: Uuid,
    ) -> Result<QuotationResponse, ServiceError> {
        let txn = self.db.begin().await?;
        let quotation = self.load_quotation(&txn, quotation_id).await?;
        if quotation.status != QuotationStatus::Converted {
            return Err(ServiceError::InvalidStatus(
                "commission is only payable on converted quotations".to_string(),
            ));
        }

        let mut active: quotation::ActiveModel = quotation.clone().into();
        active.commission_paid = Set(true);
        let updated = self.persist_with_version(&txn, &quotation, active).await?;
        txn.commit().await?;

        Ok(self.model_to_response(updated))
    }

    /// Fetches a quotation with its line items.
    pub async fn get_quotation(
        &self,
        quotation_id: Uuid,
    ) -> Result<QuotationWithItems, ServiceError> {
        let quotation = quotation::Entity::find_by_id(quotation_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Quotation {} not found", quotation_id))
            })?;
        let items = quotation_detail::Entity::find()
            .filter(quotation_detail::Column::QuotationId.eq(quotation.id))
            .order_by_asc(quotation_detail::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        Ok(QuotationWithItems {
            quotation: self.model_to_response(quotation),
            items: items.iter().map(line_to_response).collect(),
        })
    }

    /// Lists quotations with filters and pagination.
    pub async fn list_quotations(
        &self,
        filter: QuotationFilter,
        page: u64,
        per_page: u64,
    ) -> Result<QuotationListResponse, ServiceError> {
        let mut query = quotation::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(quotation::Column::Status.eq(status));
        }
        if let Some(seller_id) = filter.seller_id {
            query = query.filter(quotation::Column::SellerId.eq(seller_id));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(quotation::Column::CustomerId.eq(customer_id));
        }
        if !filter.include_archived {
            query = query.filter(quotation::Column::IsArchived.eq(false));
        }

        let paginator = query
            .order_by_desc(quotation::Column::CreatedAt)
            .paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let quotations = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(QuotationListResponse {
            quotations: quotations
                .into_iter()
                .map(|model| self.model_to_response(model))
                .collect(),
            total,
            page,
            per_page,
        })
    }

    // -- internals ----------------------------------------------------------

    async fn load_quotation(
        &self,
        txn: &DatabaseTransaction,
        quotation_id: Uuid,
    ) -> Result<quotation::Model, ServiceError> {
        quotation::Entity::find_by_id(quotation_id)
            .one(txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Quotation {} not found", quotation_id)))
    }

    async fn load_items(
        &self,
        txn: &DatabaseTransaction,
        quotation_id: Uuid,
    ) -> Result<Vec<quotation_detail::Model>, ServiceError> {
        Ok(quotation_detail::Entity::find()
            .filter(quotation_detail::Column::QuotationId.eq(quotation_id))
            .order_by_asc(quotation_detail::Column::CreatedAt)
            .all(txn)
            .await?)
    }

    /// Allocates the next COT-{year}-{seq} code within the create transaction.
    async fn next_code(
        &self,
        txn: &DatabaseTransaction,
        year: i32,
    ) -> Result<String, ServiceError> {
        let prefix = format!("{CODE_PREFIX}-{year}-");
        let last = quotation::Entity::find()
            .filter(quotation::Column::Code.starts_with(&prefix))
            .order_by_desc(quotation::Column::Code)
            .one(txn)
            .await?;

        let next_seq = last
            .and_then(|model| parse_code_seq(&model.code, year))
            .unwrap_or(0)
            + 1;
        Ok(format_code(year, next_seq))
    }

    /// Resolves source and margins for a new line and produces the persisted
    /// snapshot. The caller recomputes document totals afterwards, which also
    /// enforces the margin floors.
    async fn build_line(
        &self,
        _txn: &DatabaseTransaction,
        quotation: &quotation::Model,
        item: &NewLineItem,
    ) -> Result<quotation_detail::Model, ServiceError> {
        let source = self
            .sources
            .resolve(item.product_id, quotation.warehouse_id, item.quantity)
            .await?;
        let margin = self.margins.effective_margin(item.category_id).await?;

        let unit_cost = source.unit_cost();
        let unit_price = match item.unit_price.or_else(|| source.suggested_unit_price()) {
            Some(price) => price,
            // No explicit or listed price: apply the category's normal margin
            // over cost.
            None if unit_cost > Decimal::ZERO => round_money(
                unit_cost * (Decimal::ONE + margin.normal / Decimal::ONE_HUNDRED),
            ),
            None => {
                return Err(ServiceError::ValidationError(format!(
                    "unit price required for product {} (no price list entry and zero cost)",
                    item.product_id
                )))
            }
        };

        let totals = compute_line(LineInput {
            unit_price,
            quantity: item.quantity,
            discount: item.discount.unwrap_or(Decimal::ZERO),
            unit_cost,
            tax_rate: self.settings.tax_rate,
        })?;

        let now = self.clock.now();
        let covered = source.covers(item.quantity);
        Ok(quotation_detail::Model {
            id: Uuid::new_v4(),
            quotation_id: quotation.id,
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            product_sku: item.product_sku.clone(),
            product_brand: item.product_brand.clone(),
            category_id: item.category_id,
            quantity: item.quantity,
            purchase_price: unit_cost,
            distribution_price: item.distribution_price,
            unit_price,
            discount: item.discount.unwrap_or(Decimal::ZERO),
            discount_percentage: totals.discount_percentage,
            subtotal: totals.subtotal,
            tax_amount: totals.tax_amount,
            total: totals.total,
            unit_cost,
            total_cost: totals.total_cost,
            unit_margin: totals.unit_margin,
            total_margin: totals.total_margin,
            margin_percentage: totals.margin_percentage,
            source_type: source.source_type(),
            warehouse_id: match &source {
                LineSource::Warehouse { warehouse_id, .. } => Some(*warehouse_id),
                LineSource::Supplier { .. } => None,
            },
            supplier_id: match &source {
                LineSource::Supplier { supplier_id, .. } => Some(*supplier_id),
                LineSource::Warehouse { .. } => None,
            },
            supplier_product_id: match &source {
                LineSource::Supplier {
                    supplier_product_id,
                    ..
                } => Some(*supplier_product_id),
                LineSource::Warehouse { .. } => None,
            },
            is_requested_from_supplier: source.is_requested_from_supplier(),
            in_stock: covered,
            available_stock: source.available_stock(),
            created_at: now,
            updated_at: Some(now),
        })
    }

    /// Recomputes document totals from the line set and enforces the category
    /// margin floors; the new figures are persisted with a version bump.
    async fn recompute_totals(
        &self,
        txn: &DatabaseTransaction,
        quotation: quotation::Model,
    ) -> Result<quotation::Model, ServiceError> {
        let lines = self.load_items(txn, quotation.id).await?;

        let mut figures = Vec::with_capacity(lines.len());
        let mut floors = Vec::with_capacity(lines.len());
        let mut floor_cache: HashMap<Uuid, Decimal> = HashMap::new();
        for line in &lines {
            let floor = match floor_cache.get(&line.category_id) {
                Some(floor) => *floor,
                None => {
                    let margin = self.margins.effective_margin(line.category_id).await?;
                    floor_cache.insert(line.category_id, margin.min);
                    margin.min
                }
            };
            figures.push(LineFigures::from_detail(line));
            floors.push((line.category_id, floor));
        }

        let subtotal: Decimal = figures.iter().map(|f| f.subtotal).sum();
        let coupon_discount = match quotation.coupon_id {
            Some(coupon_id) if subtotal > Decimal::ZERO => {
                self.coupons.calculate_discount(coupon_id, subtotal).await?
            }
            _ => Decimal::ZERO,
        };

        let charges = DocumentCharges {
            discount: quotation.discount,
            shipping_cost: quotation.shipping_cost,
            packaging_cost: quotation.packaging_cost,
            assembly_cost: quotation.assembly_cost,
        };
        let commission = CommissionSettings {
            basis: self.settings.commission_basis,
            percentage: quotation.commission_percentage,
        };
        let totals = aggregate(&figures, &charges, coupon_discount, &commission)?;

        let lines_with_floors: Vec<(LineFigures, Decimal)> = figures
            .iter()
            .copied()
            .zip(floors.iter().map(|(_, floor)| *floor))
            .collect();
        let doc_floor = document_floor(&floors, self.settings.global_min_margin);
        enforce_margin_floors(&lines_with_floors, totals.margin_percentage, doc_floor)?;

        let mut active: quotation::ActiveModel = quotation.clone().into();
        active.subtotal = Set(totals.subtotal);
        active.coupon_discount = Set(totals.coupon_discount);
        active.tax = Set(totals.tax);
        active.total = Set(totals.total);
        active.total_cost = Set(totals.total_cost);
        active.total_margin = Set(totals.total_margin);
        active.margin_percentage = Set(totals.margin_percentage);
        active.commission_amount = Set(totals.commission_amount);
        self.persist_with_version(txn, &quotation, active).await
    }

    /// Updates the quotation row only when the version still matches what was
    /// read, then bumps it. A zero-row update means someone else won the race.
    async fn persist_with_version(
        &self,
        txn: &DatabaseTransaction,
        before: &quotation::Model,
        mut active: quotation::ActiveModel,
    ) -> Result<quotation::Model, ServiceError> {
        let expected = before.version;
        active.version = Set(expected + 1);
        active.updated_at = Set(Some(self.clock.now()));

        let result = quotation::Entity::update_many()
            .set(active)
            .filter(quotation::Column::Id.eq(before.id))
            .filter(quotation::Column::Version.eq(expected))
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::ConcurrencyConflict(before.id));
        }

        quotation::Entity::find_by_id(before.id)
            .one(txn)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "quotation {} vanished mid-transaction",
                    before.id
                ))
            })
    }

    async fn append_history(
        &self,
        txn: &DatabaseTransaction,
        quotation_id: Uuid,
        status: QuotationStatus,
        previous_status: Option<QuotationStatus>,
        changed_by: Uuid,
        notes: Option<String>,
    ) -> Result<(), ServiceError> {
        self.append_history_with_metadata(
            txn,
            quotation_id,
            status,
            previous_status,
            changed_by,
            notes,
            None,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn append_history_with_metadata(
        &self,
        txn: &DatabaseTransaction,
        quotation_id: Uuid,
        status: QuotationStatus,
        previous_status: Option<QuotationStatus>,
        changed_by: Uuid,
        notes: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> Result<(), ServiceError> {
        let row = quotation_status_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            quotation_id: Set(quotation_id),
            status: Set(status),
            previous_status: Set(previous_status),
            changed_by: Set(changed_by),
            notes: Set(notes),
            metadata: Set(metadata),
            created_at: Set(self.clock.now()),
        };
        row.insert(txn).await?;
        Ok(())
    }

    fn model_to_response(&self, model: quotation::Model) -> QuotationResponse {
        let is_expired = model.is_expired(self.clock.today());
        QuotationResponse {
            id: model.id,
            code: model.code,
            seller_id: model.seller_id,
            customer_id: model.customer_id,
            customer_name: model.customer_name,
            customer_document: model.customer_document,
            customer_email: model.customer_email,
            warehouse_id: model.warehouse_id,
            coupon_id: model.coupon_id,
            status: model.status,
            currency: model.currency,
            exchange_rate: model.exchange_rate,
            subtotal: model.subtotal,
            discount: model.discount,
            coupon_discount: model.coupon_discount,
            tax: model.tax,
            shipping_cost: model.shipping_cost,
            packaging_cost: model.packaging_cost,
            assembly_cost: model.assembly_cost,
            total: model.total,
            total_cost: model.total_cost,
            total_margin: model.total_margin,
            margin_percentage: model.margin_percentage,
            commission_percentage: model.commission_percentage,
            commission_amount: model.commission_amount,
            commission_paid: model.commission_paid,
            quotation_date: model.quotation_date,
            valid_until: model.valid_until,
            is_expired,
            sent_at: model.sent_at,
            converted_sale_id: model.converted_sale_id,
            converted_at: model.converted_at,
            is_archived: model.is_archived,
            version: model.version,
        }
    }
}

fn ensure_editable(quotation: &quotation::Model) -> Result<(), ServiceError> {
    if !quotation.is_editable() {
        return Err(ServiceError::InvalidStatus(format!(
            "quotation {} is '{}' and cannot be modified",
            quotation.code, quotation.status
        )));
    }
    Ok(())
}

/// Builds an insertable active model with every column explicitly set.
fn detail_to_active(model: quotation_detail::Model) -> quotation_detail::ActiveModel {
    quotation_detail::ActiveModel {
        id: Set(model.id),
        quotation_id: Set(model.quotation_id),
        product_id: Set(model.product_id),
        product_name: Set(model.product_name),
        product_sku: Set(model.product_sku),
        product_brand: Set(model.product_brand),
        category_id: Set(model.category_id),
        quantity: Set(model.quantity),
        purchase_price: Set(model.purchase_price),
        distribution_price: Set(model.distribution_price),
        unit_price: Set(model.unit_price),
        discount: Set(model.discount),
        discount_percentage: Set(model.discount_percentage),
        subtotal: Set(model.subtotal),
        tax_amount: Set(model.tax_amount),
        total: Set(model.total),
        unit_cost: Set(model.unit_cost),
        total_cost: Set(model.total_cost),
        unit_margin: Set(model.unit_margin),
        total_margin: Set(model.total_margin),
        margin_percentage: Set(model.margin_percentage),
        source_type: Set(model.source_type),
        warehouse_id: Set(model.warehouse_id),
        supplier_id: Set(model.supplier_id),
        supplier_product_id: Set(model.supplier_product_id),
        is_requested_from_supplier: Set(model.is_requested_from_supplier),
        in_stock: Set(model.in_stock),
        available_stock: Set(model.available_stock),
        created_at: Set(model.created_at),
        updated_at: Set(model.updated_at),
    }
}

fn apply_line_totals(active: &mut quotation_detail::ActiveModel, totals: &LineTotals) {
    active.discount_percentage = Set(totals.discount_percentage);
    active.subtotal = Set(totals.subtotal);
    active.tax_amount = Set(totals.tax_amount);
    active.total = Set(totals.total);
    active.total_cost = Set(totals.total_cost);
    active.unit_margin = Set(totals.unit_margin);
    active.total_margin = Set(totals.total_margin);
    active.margin_percentage = Set(totals.margin_percentage);
}

fn line_to_response(model: &quotation_detail::Model) -> LineItemResponse {
    LineItemResponse {
        id: model.id,
        product_id: model.product_id,
        product_name: model.product_name.clone(),
        product_sku: model.product_sku.clone(),
        product_brand: model.product_brand.clone(),
        category_id: model.category_id,
        quantity: model.quantity,
        unit_price: model.unit_price,
        discount: model.discount,
        discount_percentage: model.discount_percentage,
        subtotal: model.subtotal,
        tax_amount: model.tax_amount,
        total: model.total,
        unit_cost: model.unit_cost,
        total_cost: model.total_cost,
        unit_margin: model.unit_margin,
        total_margin: model.total_margin,
        margin_percentage: model.margin_percentage,
        source_type: model.source_type,
        warehouse_id: model.warehouse_id,
        supplier_id: model.supplier_id,
        supplier_product_id: model.supplier_product_id,
        is_requested_from_supplier: model.is_requested_from_supplier,
        in_stock: model.in_stock,
        available_stock: model.available_stock,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn code_format_is_cot_year_six_digits() {
        assert_eq!(format_code(2025, 1), "COT-2025-000001");
        assert_eq!(format_code(2025, 123), "COT-2025-000123");
        assert_eq!(format_code(2026, 999999), "COT-2026-999999");
    }

    #[test]
    fn code_sequence_round_trips() {
        assert_eq!(parse_code_seq("COT-2025-000123", 2025), Some(123));
        assert_eq!(parse_code_seq("COT-2025-000123", 2024), None);
        assert_eq!(parse_code_seq("VEN-2025-000123", 2025), None);
        assert_eq!(parse_code_seq("COT-2025-abc", 2025), None);
    }

    #[test]
    fn settings_materialize_from_config() {
        let cfg = crate::config::QuotationConfig::default();
        let settings = QuotationSettings::from_config(&cfg).unwrap();
        assert_eq!(settings.tax_rate, dec!(0.18));
        assert_eq!(settings.commission_basis, CommissionBasis::Margin);
        assert_eq!(settings.global_min_margin, dec!(10.0));
    }

    #[test]
    fn settings_reject_unknown_commission_basis() {
        let cfg = crate::config::QuotationConfig {
            commission_basis: "revenue".to_string(),
            ..Default::default()
        };
        let err = QuotationSettings::from_config(&cfg).unwrap_err();
        assert!(matches!(err, ServiceError::ConfigurationError(_)));
    }

    #[test]
    fn editable_guard_rejects_sent_quotations() {
        let model = quotation::Model {
            id: Uuid::new_v4(),
            code: "COT-2025-000001".to_string(),
            seller_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            customer_name: "ACME SAC".to_string(),
            customer_document: "20123456789".to_string(),
            customer_email: None,
            customer_phone: None,
            warehouse_id: Uuid::new_v4(),
            coupon_id: None,
            status: QuotationStatus::Sent,
            currency: "PEN".to_string(),
            exchange_rate: Decimal::ONE,
            subtotal: Decimal::ZERO,
            discount: Decimal::ZERO,
            coupon_discount: Decimal::ZERO,
            tax: Decimal::ZERO,
            shipping_cost: Decimal::ZERO,
            packaging_cost: Decimal::ZERO,
            assembly_cost: Decimal::ZERO,
            total: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            total_margin: Decimal::ZERO,
            margin_percentage: Decimal::ZERO,
            commission_percentage: dec!(5.00),
            commission_amount: Decimal::ZERO,
            commission_paid: false,
            quotation_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            valid_until: NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
            sent_at: None,
            sent_to_email: None,
            converted_sale_id: None,
            converted_at: None,
            notes: None,
            is_archived: false,
            created_at: Utc::now(),
            updated_at: None,
            version: 1,
        };

        let err = ensure_editable(&model).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidStatus(_)));

        let draft = quotation::Model {
            status: QuotationStatus::Draft,
            ..model
        };
        assert!(ensure_editable(&draft).is_ok());
    }
}
